//! # Settings Repository
//!
//! The markup singleton (`settings` row with `id = 1`).
//!
//! The row is created with the default markups on first read, so callers
//! never see "no settings". Updating markups does not touch existing
//! products; their retail prices were fixed when they were saved.

use bakery_core::catalog::SettingsRequest;
use bakery_core::{Settings, DEFAULT_RETAIL1_MARKUP, DEFAULT_RETAIL2_MARKUP, DEFAULT_WHOLESALE_MARKUP};
use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::{begin_write, decimal, text};
use crate::error::DbResult;

#[derive(sqlx::FromRow)]
struct SettingsRow {
    wholesale_markup: String,
    retail1_markup: String,
    retail2_markup: String,
}

impl SettingsRow {
    fn into_settings(self) -> DbResult<Settings> {
        Ok(Settings {
            wholesale_markup: decimal("settings.wholesale_markup", &self.wholesale_markup)?,
            retail1_markup: decimal("settings.retail1_markup", &self.retail1_markup)?,
            retail2_markup: decimal("settings.retail2_markup", &self.retail2_markup)?,
        })
    }
}

/// Loads the settings, creating the default row if it is missing.
pub(crate) async fn load_settings(conn: &mut SqliteConnection) -> DbResult<Settings> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO settings (id, wholesale_markup, retail1_markup, retail2_markup, updated_at)
        VALUES (1, ?1, ?2, ?3, ?4)
        "#,
    )
    .bind(text(Decimal::from(DEFAULT_WHOLESALE_MARKUP)))
    .bind(text(Decimal::from(DEFAULT_RETAIL1_MARKUP)))
    .bind(text(Decimal::from(DEFAULT_RETAIL2_MARKUP)))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    let row: SettingsRow = sqlx::query_as(
        "SELECT wholesale_markup, retail1_markup, retail2_markup FROM settings WHERE id = 1",
    )
    .fetch_one(&mut *conn)
    .await?;

    row.into_settings()
}

/// Repository for the settings singleton.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Returns the current markups (defaults 10 / 40 / 70 on first call).
    pub async fn get_settings(&self) -> DbResult<Settings> {
        let mut conn = self.pool.acquire().await?;
        load_settings(&mut conn).await
    }

    /// Replaces the markups.
    pub async fn update_settings(&self, request: &SettingsRequest) -> DbResult<Settings> {
        let settings = request.validate()?;
        debug!(?settings, "Updating settings");

        let mut tx = begin_write(&self.pool).await?;
        load_settings(&mut tx).await?;

        sqlx::query(
            r#"
            UPDATE settings SET
                wholesale_markup = ?1,
                retail1_markup = ?2,
                retail2_markup = ?3,
                updated_at = ?4
            WHERE id = 1
            "#,
        )
        .bind(text(settings.wholesale_markup))
        .bind(text(settings.retail1_markup))
        .bind(text(settings.retail2_markup))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(
            wholesale = %settings.wholesale_markup,
            retail1 = %settings.retail1_markup,
            retail2 = %settings.retail2_markup,
            "Settings updated"
        );
        Ok(settings)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
