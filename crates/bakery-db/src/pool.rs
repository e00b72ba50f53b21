//! # Database Pool Management
//!
//! Connection pool creation and configuration for SQLite.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Database Connection Pool                           │
//! │                                                                         │
//! │  DbConfig::from_env() / DbConfig::new(path)                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ← Create pool + run migrations            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────┐                           │
//! │  │            SqlitePool                    │                           │
//! │  │  ┌─────┐ ┌─────┐ ┌─────┐ ┌─────┐       │                           │
//! │  │  │Conn1│ │Conn2│ │Conn3│ │Conn4│ ...   │  (max_connections)        │
//! │  │  └─────┘ └─────┘ └─────┘ └─────┘       │                           │
//! │  └─────────────────────────────────────────┘                           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  db.catalog() / db.purchases() / db.production() ...                   │
//! │  (each repository clones the pool handle)                              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! SQLite WAL (Write-Ahead Logging) mode is enabled so readers never block
//! the single writer. Write transactions open with `BEGIN IMMEDIATE` and
//! queue on `busy_timeout` (the connect timeout); stock rows additionally
//! carry a version for compare-and-swap updates.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::order::OrderRepository;
use crate::repository::production::ProductionRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::report::ReportRepository;
use crate::repository::settings::SettingsRepository;
use crate::repository::stock::StockRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Default database file when `BAKERY_DB_PATH` is unset.
pub const DEFAULT_DB_PATH: &str = "./bakery.db";

/// Database configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = DbConfig::new("/path/to/bakery.db")
///     .max_connections(5)
///     .min_connections(1);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// Path to the SQLite database file.
    pub database_path: PathBuf,

    /// Maximum number of connections in the pool.
    /// Default: 5
    pub max_connections: u32,

    /// Minimum number of connections to keep alive.
    /// Default: 1
    pub min_connections: u32,

    /// Connection timeout duration.
    /// Default: 30 seconds
    pub connect_timeout: Duration,

    /// Idle timeout before closing a connection.
    /// Default: 10 minutes
    pub idle_timeout: Duration,

    /// Whether to run migrations on connect.
    /// Default: true
    pub run_migrations: bool,
}

impl DbConfig {
    /// Creates a new database configuration with the given path.
    ///
    /// The file is created if it doesn't exist.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            min_connections: 1,
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// ## Variables
    /// ```text
    /// BAKERY_DB_PATH                  default ./bakery.db
    /// BAKERY_DB_MAX_CONNECTIONS       default 5
    /// BAKERY_DB_MIN_CONNECTIONS       default 1
    /// BAKERY_DB_CONNECT_TIMEOUT_SECS  default 30
    /// ```
    pub fn from_env() -> DbResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`DbConfig::from_env`] with an injectable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DbResult<Self> {
        let defaults = DbConfig::new(DEFAULT_DB_PATH);

        let path = lookup("BAKERY_DB_PATH")
            .map(|p| p.trim().to_string())
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| DEFAULT_DB_PATH.to_string());

        let config = DbConfig {
            database_path: PathBuf::from(path),
            max_connections: parse_var(&lookup, "BAKERY_DB_MAX_CONNECTIONS", defaults.max_connections)?,
            min_connections: parse_var(&lookup, "BAKERY_DB_MIN_CONNECTIONS", defaults.min_connections)?,
            connect_timeout: Duration::from_secs(parse_var(
                &lookup,
                "BAKERY_DB_CONNECT_TIMEOUT_SECS",
                defaults.connect_timeout.as_secs(),
            )?),
            ..defaults
        };

        if config.max_connections == 0 {
            return Err(DbError::InvalidConfig {
                variable: "BAKERY_DB_MAX_CONNECTIONS".to_string(),
                reason: "must be at least 1".to_string(),
            });
        }
        if config.min_connections > config.max_connections {
            return Err(DbError::InvalidConfig {
                variable: "BAKERY_DB_MIN_CONNECTIONS".to_string(),
                reason: format!("must not exceed max connections ({})", config.max_connections),
            });
        }

        Ok(config)
    }

    /// Sets the maximum number of connections.
    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the minimum number of connections.
    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    /// Sets the connection timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Sets whether to run migrations on connect.
    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// Creates an in-memory database configuration (for testing).
    ///
    /// ## Usage
    /// ```rust,ignore
    /// let db = Database::new(DbConfig::in_memory()).await?;
    /// // Database is isolated, perfect for tests
    /// ```
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1, // In-memory requires single connection
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    variable: &str,
    default: T,
) -> DbResult<T> {
    match lookup(variable) {
        Some(raw) => raw.trim().parse().map_err(|_| DbError::InvalidConfig {
            variable: variable.to_string(),
            reason: format!("'{raw}' is not a valid number"),
        }),
        None => Ok(default),
    }
}

// =============================================================================
// Database
// =============================================================================

/// Main database handle providing repository access.
///
/// ## Usage
/// ```rust,ignore
/// let db = Database::new(DbConfig::from_env()?).await?;
///
/// let purchase = db.purchases().record_purchase(&request).await?;
/// let order = db.orders().create_order(&order_request).await?;
/// let result = db.production().start_production(&order.id).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    /// The SQLite connection pool.
    pool: SqlitePool,
}

impl Database {
    /// Creates a new database connection pool.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. Configures SQLite:
    ///    - WAL mode for concurrent reads
    ///    - NORMAL synchronous (balance of safety/speed)
    ///    - Foreign keys enabled
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Initializing database connection"
        );

        // sqlite://path?mode=rwc creates the file if it does not exist
        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());

        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // SQLite has them disabled by default
            .foreign_keys(true)
            .busy_timeout(config.connect_timeout)
            .create_if_missing(true);

        debug!("Connection options configured");

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        info!(
            max_connections = config.max_connections,
            "Database pool created"
        );

        let db = Database { pool };

        if config.run_migrations {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    /// Runs database migrations.
    ///
    /// Called by `new()` when `run_migrations` is set.
    pub async fn run_migrations(&self) -> DbResult<()> {
        info!("Running database migrations");
        migrations::run_migrations(&self.pool).await?;
        info!("Migrations complete");
        Ok(())
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Suppliers, clients, components, recipes and products.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// Markup settings.
    pub fn settings(&self) -> SettingsRepository {
        SettingsRepository::new(self.pool.clone())
    }

    /// Stock ledger reads.
    pub fn stock(&self) -> StockRepository {
        StockRepository::new(self.pool.clone())
    }

    /// Purchase intake and price history.
    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone())
    }

    /// Order creation, status changes and price lists.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone())
    }

    /// Production fulfillment.
    pub fn production(&self) -> ProductionRepository {
        ProductionRepository::new(self.pool.clone())
    }

    /// Stock valuation, order summary and dashboard numbers.
    pub fn reports(&self) -> ReportRepository {
        ReportRepository::new(self.pool.clone())
    }

    /// Closes the database connection pool.
    ///
    /// After calling close, all repository operations will fail.
    pub async fn close(&self) {
        info!("Closing database connection pool");
        self.pool.close().await;
    }

    /// Checks that the database answers queries and every embedded
    /// migration has been applied.
    pub async fn health_check(&self) -> bool {
        match migrations::migration_status(&self.pool).await {
            Ok((total, applied)) if applied >= total => true,
            Ok((total, applied)) => {
                warn!(total, applied, "Database schema is behind");
                false
            }
            Err(err) => {
                warn!(error = %err, "Database health check failed");
                false
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_in_memory_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        assert!(db.health_check().await);
        let (total, applied) = migrations::migration_status(db.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_health_check_needs_migrations() {
        let db = Database::new(DbConfig::in_memory().run_migrations(false))
            .await
            .unwrap();
        assert!(!db.health_check().await);

        db.run_migrations().await.unwrap();
        assert!(db.health_check().await);
    }

    #[test]
    fn test_config_builder() {
        let config = DbConfig::new("/tmp/test.db")
            .max_connections(10)
            .min_connections(2);

        assert_eq!(config.max_connections, 10);
        assert_eq!(config.min_connections, 2);
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_from_env_defaults() {
        let config = DbConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_path, PathBuf::from(DEFAULT_DB_PATH));
        assert_eq!(config.max_connections, 5);
        assert_eq!(config.connect_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_config_from_env_overrides() {
        let config = DbConfig::from_lookup(lookup(&[
            ("BAKERY_DB_PATH", "/var/lib/bakery/erp.db"),
            ("BAKERY_DB_MAX_CONNECTIONS", "8"),
            ("BAKERY_DB_CONNECT_TIMEOUT_SECS", " 5 "),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/bakery/erp.db"));
        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 1);
        assert_eq!(config.connect_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_config_from_env_rejects_garbage() {
        let err = DbConfig::from_lookup(lookup(&[("BAKERY_DB_MAX_CONNECTIONS", "many")])).unwrap_err();
        assert!(matches!(
            err,
            DbError::InvalidConfig { ref variable, .. } if variable == "BAKERY_DB_MAX_CONNECTIONS"
        ));

        let err = DbConfig::from_lookup(lookup(&[
            ("BAKERY_DB_MAX_CONNECTIONS", "2"),
            ("BAKERY_DB_MIN_CONNECTIONS", "3"),
        ]))
        .unwrap_err();
        assert!(matches!(err, DbError::InvalidConfig { .. }));
    }
}
