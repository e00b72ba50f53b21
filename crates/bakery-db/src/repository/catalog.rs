//! # Catalog Repository
//!
//! Suppliers, clients, components, recipes and products.
//!
//! ## Derived Fields
//! ```text
//! Component.current_avg_price ◄── stock.avg_cost   (joined on read, never stored)
//! Product.retail1/2_price     ◄── base × settings  (derived once, on save)
//! ```
//!
//! Creating a component also registers its zero stock row in the same
//! transaction, so every component has exactly one ledger row.

use bakery_core::catalog::{
    ClientRequest, ComponentRequest, ContactRequest, ProductRequest, RecipeRequest, ValidProduct,
};
use bakery_core::pricing::{suggested_prices, TierPrices};
use bakery_core::{Client, ClientTier, Component, Money, Product, Recipe, RecipeItem, Supplier};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info};

use super::settings::load_settings;
use super::stock::{load_component_stock, ComponentStockRow, COMPONENT_STOCK_SELECT};
use super::{begin_write, decimal, money, money_text, new_id, text};
use crate::error::{DbError, DbResult};

// =============================================================================
// Rows
// =============================================================================

#[derive(sqlx::FromRow)]
struct SupplierRow {
    id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    telegram: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<SupplierRow> for Supplier {
    fn from(row: SupplierRow) -> Self {
        Supplier {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            telegram: row.telegram,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: String,
    phone: Option<String>,
    email: Option<String>,
    telegram: Option<String>,
    tier: ClientTier,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name,
            phone: row.phone,
            email: row.email,
            telegram: row.telegram,
            tier: row.tier,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct RecipeRow {
    id: String,
    name: String,
    output_weight: String,
    output_unit: String,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct RecipeItemRow {
    id: String,
    recipe_id: String,
    component_id: String,
    weight: String,
    unit: String,
}

impl RecipeItemRow {
    fn into_item(self) -> DbResult<RecipeItem> {
        Ok(RecipeItem {
            weight: decimal("recipe_items.weight", &self.weight)?,
            id: self.id,
            recipe_id: self.recipe_id,
            component_id: self.component_id,
            unit: self.unit,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    code: String,
    recipe_id: String,
    box_gross_weight: String,
    box_net_weight: String,
    base_price: String,
    retail1_price: String,
    retail2_price: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn into_product(self) -> DbResult<Product> {
        Ok(Product {
            box_gross_weight: decimal("products.box_gross_weight", &self.box_gross_weight)?,
            box_net_weight: decimal("products.box_net_weight", &self.box_net_weight)?,
            base_price: money("products.base_price", &self.base_price)?,
            retail1_price: money("products.retail1_price", &self.retail1_price)?,
            retail2_price: money("products.retail2_price", &self.retail2_price)?,
            id: self.id,
            name: self.name,
            code: self.code,
            recipe_id: self.recipe_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const PRODUCT_SELECT: &str = r#"
    SELECT
        id, name, code, recipe_id,
        box_gross_weight, box_net_weight,
        base_price, retail1_price, retail2_price,
        created_at, updated_at
    FROM products
"#;

// =============================================================================
// Shared Loaders
// =============================================================================

pub(crate) async fn load_supplier(conn: &mut SqliteConnection, id: &str) -> DbResult<Supplier> {
    let row: Option<SupplierRow> = sqlx::query_as(
        "SELECT id, name, phone, email, telegram, created_at FROM suppliers WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Supplier::from)
        .ok_or_else(|| DbError::not_found("Supplier", id))
}

pub(crate) async fn load_client(conn: &mut SqliteConnection, id: &str) -> DbResult<Client> {
    let row: Option<ClientRow> = sqlx::query_as(
        "SELECT id, name, phone, email, telegram, tier, created_at FROM clients WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    row.map(Client::from)
        .ok_or_else(|| DbError::not_found("Client", id))
}

pub(crate) async fn load_product(conn: &mut SqliteConnection, id: &str) -> DbResult<Product> {
    let sql = format!("{PRODUCT_SELECT} WHERE id = ?1");
    let row: Option<ProductRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    row.ok_or_else(|| DbError::not_found("Product", id))?
        .into_product()
}

/// All products ordered by name.
pub(crate) async fn load_products(conn: &mut SqliteConnection) -> DbResult<Vec<Product>> {
    let sql = format!("{PRODUCT_SELECT} ORDER BY name, id");
    let rows: Vec<ProductRow> = sqlx::query_as(&sql).fetch_all(&mut *conn).await?;

    rows.into_iter().map(ProductRow::into_product).collect()
}

/// Loads a recipe with its items in entry order.
pub(crate) async fn load_recipe(conn: &mut SqliteConnection, id: &str) -> DbResult<Recipe> {
    let row: Option<RecipeRow> = sqlx::query_as(
        "SELECT id, name, output_weight, output_unit, created_at FROM recipes WHERE id = ?1",
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;
    let row = row.ok_or_else(|| DbError::not_found("Recipe", id))?;

    let items: Vec<RecipeItemRow> = sqlx::query_as(
        r#"
        SELECT id, recipe_id, component_id, weight, unit
        FROM recipe_items
        WHERE recipe_id = ?1
        ORDER BY position
        "#,
    )
    .bind(id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Recipe {
        output_weight: decimal("recipes.output_weight", &row.output_weight)?,
        id: row.id,
        name: row.name,
        output_unit: row.output_unit,
        items: items
            .into_iter()
            .map(RecipeItemRow::into_item)
            .collect::<DbResult<Vec<_>>>()?,
        created_at: row.created_at,
    })
}

/// Fails with `NotFound` unless the recipe exists.
async fn ensure_recipe(conn: &mut SqliteConnection, id: &str) -> DbResult<()> {
    let exists: Option<String> = sqlx::query_scalar("SELECT id FROM recipes WHERE id = ?1")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match exists {
        Some(_) => Ok(()),
        None => Err(DbError::not_found("Recipe", id)),
    }
}

/// Maps a code collision to a readable duplicate error.
fn code_conflict(err: sqlx::Error, code: &str) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } if field.contains("code") => {
            DbError::duplicate("code", code)
        }
        other => other,
    }
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for catalog records.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // ===== Suppliers =====

    pub async fn create_supplier(&self, request: &ContactRequest) -> DbResult<Supplier> {
        let contact = request.validate()?;
        let supplier = Supplier {
            id: new_id(),
            name: contact.name,
            phone: contact.phone,
            email: contact.email,
            telegram: contact.telegram,
            created_at: Utc::now(),
        };

        debug!(id = %supplier.id, name = %supplier.name, "Creating supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, phone, email, telegram, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&supplier.id)
        .bind(&supplier.name)
        .bind(&supplier.phone)
        .bind(&supplier.email)
        .bind(&supplier.telegram)
        .bind(supplier.created_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier)
    }

    pub async fn get_supplier(&self, id: &str) -> DbResult<Supplier> {
        let mut conn = self.pool.acquire().await?;
        load_supplier(&mut conn, id).await
    }

    pub async fn list_suppliers(&self) -> DbResult<Vec<Supplier>> {
        let rows: Vec<SupplierRow> = sqlx::query_as(
            "SELECT id, name, phone, email, telegram, created_at FROM suppliers ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Supplier::from).collect())
    }

    // ===== Clients =====

    pub async fn create_client(&self, request: &ClientRequest) -> DbResult<Client> {
        let (contact, tier) = request.validate()?;
        let client = Client {
            id: new_id(),
            name: contact.name,
            phone: contact.phone,
            email: contact.email,
            telegram: contact.telegram,
            tier,
            created_at: Utc::now(),
        };

        debug!(id = %client.id, name = %client.name, tier = %client.tier, "Creating client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, name, phone, email, telegram, tier, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&client.id)
        .bind(&client.name)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(&client.telegram)
        .bind(client.tier)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(client)
    }

    pub async fn get_client(&self, id: &str) -> DbResult<Client> {
        let mut conn = self.pool.acquire().await?;
        load_client(&mut conn, id).await
    }

    pub async fn list_clients(&self) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT id, name, phone, email, telegram, tier, created_at FROM clients ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }

    // ===== Components =====

    /// Creates a component and its empty stock row.
    pub async fn create_component(&self, request: &ComponentRequest) -> DbResult<Component> {
        let valid = request.validate()?;
        let now = Utc::now();
        let component = Component {
            id: new_id(),
            name: valid.name,
            kind: valid.kind,
            unit: valid.unit,
            current_avg_price: Money::zero(),
            created_at: now,
        };

        let mut tx = begin_write(&self.pool).await?;

        sqlx::query(
            r#"
            INSERT INTO components (id, name, kind, unit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&component.id)
        .bind(&component.name)
        .bind(component.kind)
        .bind(&component.unit)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO stock (component_id, qty_on_hand, avg_cost, version, updated_at)
            VALUES (?1, '0', '0', 0, ?2)
            "#,
        )
        .bind(&component.id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        info!(id = %component.id, name = %component.name, kind = %component.kind, "Component created");
        Ok(component)
    }

    pub async fn get_component(&self, id: &str) -> DbResult<Component> {
        let mut conn = self.pool.acquire().await?;
        Ok(load_component_stock(&mut conn, id).await?.component)
    }

    pub async fn list_components(&self) -> DbResult<Vec<Component>> {
        let sql = format!("{COMPONENT_STOCK_SELECT} ORDER BY c.name, c.id");
        let rows: Vec<ComponentStockRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|row| row.into_component_stock().map(|entry| entry.component))
            .collect()
    }

    // ===== Recipes =====

    /// Creates a recipe with its items.
    ///
    /// ## Errors
    /// `NotFound` when an item references an unknown component.
    pub async fn create_recipe(&self, request: &RecipeRequest) -> DbResult<Recipe> {
        let valid = request.validate()?;
        let now = Utc::now();
        let recipe_id = new_id();

        let mut tx = begin_write(&self.pool).await?;

        for item in &valid.items {
            load_component_stock(&mut tx, &item.component_id).await?;
        }

        sqlx::query(
            r#"
            INSERT INTO recipes (id, name, output_weight, output_unit, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&recipe_id)
        .bind(&valid.name)
        .bind(text(valid.output_weight))
        .bind(&valid.output_unit)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(valid.items.len());
        for (position, item) in valid.items.into_iter().enumerate() {
            let item = RecipeItem {
                id: new_id(),
                recipe_id: recipe_id.clone(),
                component_id: item.component_id,
                weight: item.weight,
                unit: item.unit,
            };

            sqlx::query(
                r#"
                INSERT INTO recipe_items (id, recipe_id, component_id, weight, unit, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(&item.id)
            .bind(&item.recipe_id)
            .bind(&item.component_id)
            .bind(text(item.weight))
            .bind(&item.unit)
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        info!(id = %recipe_id, name = %valid.name, items = items.len(), "Recipe created");

        Ok(Recipe {
            id: recipe_id,
            name: valid.name,
            output_weight: valid.output_weight,
            output_unit: valid.output_unit,
            items,
            created_at: now,
        })
    }

    pub async fn get_recipe(&self, id: &str) -> DbResult<Recipe> {
        let mut conn = self.pool.acquire().await?;
        load_recipe(&mut conn, id).await
    }

    pub async fn list_recipes(&self) -> DbResult<Vec<Recipe>> {
        let mut conn = self.pool.acquire().await?;
        let ids: Vec<String> = sqlx::query_scalar("SELECT id FROM recipes ORDER BY name, id")
            .fetch_all(&mut *conn)
            .await?;

        let mut recipes = Vec::with_capacity(ids.len());
        for id in ids {
            recipes.push(load_recipe(&mut conn, &id).await?);
        }
        Ok(recipes)
    }

    // ===== Products =====

    /// Creates a product; blank retail prices are derived from the current
    /// settings.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown recipe
    /// - `UniqueViolation` when the code is taken
    pub async fn create_product(&self, request: &ProductRequest) -> DbResult<Product> {
        let mut tx = begin_write(&self.pool).await?;

        let settings = load_settings(&mut tx).await?;
        let valid = request.validate(&settings)?;
        ensure_recipe(&mut tx, &valid.recipe_id).await?;

        let now = Utc::now();
        let product = product_from(new_id(), valid, now, now);

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, code, recipe_id,
                box_gross_weight, box_net_weight,
                base_price, retail1_price, retail2_price,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.recipe_id)
        .bind(text(product.box_gross_weight))
        .bind(text(product.box_net_weight))
        .bind(money_text(product.base_price))
        .bind(money_text(product.retail1_price))
        .bind(money_text(product.retail2_price))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| code_conflict(e, &product.code))?;

        tx.commit().await?;

        info!(
            id = %product.id,
            code = %product.code,
            base_price = %product.base_price,
            "Product created"
        );
        Ok(product)
    }

    /// Replaces a product's fields. Existing orders keep their frozen prices.
    pub async fn update_product(&self, id: &str, request: &ProductRequest) -> DbResult<Product> {
        let mut tx = begin_write(&self.pool).await?;

        let existing = load_product(&mut tx, id).await?;
        let settings = load_settings(&mut tx).await?;
        let valid = request.validate(&settings)?;
        ensure_recipe(&mut tx, &valid.recipe_id).await?;

        let product = product_from(existing.id, valid, existing.created_at, Utc::now());

        sqlx::query(
            r#"
            UPDATE products SET
                name = ?2,
                code = ?3,
                recipe_id = ?4,
                box_gross_weight = ?5,
                box_net_weight = ?6,
                base_price = ?7,
                retail1_price = ?8,
                retail2_price = ?9,
                updated_at = ?10
            WHERE id = ?1
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.code)
        .bind(&product.recipe_id)
        .bind(text(product.box_gross_weight))
        .bind(text(product.box_net_weight))
        .bind(money_text(product.base_price))
        .bind(money_text(product.retail1_price))
        .bind(money_text(product.retail2_price))
        .bind(product.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| code_conflict(e, &product.code))?;

        tx.commit().await?;

        info!(id = %product.id, code = %product.code, "Product updated");
        Ok(product)
    }

    pub async fn get_product(&self, id: &str) -> DbResult<Product> {
        let mut conn = self.pool.acquire().await?;
        load_product(&mut conn, id).await
    }

    /// All products ordered by name.
    pub async fn list_products(&self) -> DbResult<Vec<Product>> {
        let mut conn = self.pool.acquire().await?;
        load_products(&mut conn).await
    }

    /// Live markup view of a product's base price under the current settings.
    pub async fn product_prices(&self, id: &str) -> DbResult<TierPrices> {
        let mut conn = self.pool.acquire().await?;
        let product = load_product(&mut conn, id).await?;
        let settings = load_settings(&mut conn).await?;
        Ok(suggested_prices(product.base_price, &settings))
    }
}

fn product_from(
    id: String,
    valid: ValidProduct,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
) -> Product {
    Product {
        id,
        name: valid.name,
        code: valid.code,
        recipe_id: valid.recipe_id,
        box_gross_weight: valid.box_gross_weight,
        box_net_weight: valid.box_net_weight,
        base_price: valid.base_price,
        retail1_price: valid.retail1_price,
        retail2_price: valid.retail2_price,
        created_at,
        updated_at,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
