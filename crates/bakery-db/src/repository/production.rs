//! # Production Repository
//!
//! Starting production: the only operation that consumes stock.
//!
//! ## start_production
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. load order + items            (NotFound / InvalidState)            │
//! │  2. load product + recipe per item                                     │
//! │  3. aggregate requirements         (shared components summed)          │
//! │  4. snapshot stock of every required component                         │
//! │  5. plan_production                (ALL checked before ANY write)      │
//! │  6. per component: UPDATE stock ... WHERE version = ?                  │
//! │                    INSERT INTO production_usage                        │
//! │  7. UPDATE orders SET status = 'in_production', cost, profit           │
//! │       WHERE id = ? AND status IN ('draft', 'confirmed')                │
//! │                                                                         │
//! │  COMMIT  (any error: nothing is written)                               │
//! │                                                                         │
//! │  BEGIN IMMEDIATE: a second start waits for the first to commit, then   │
//! │  plans against the stock it left behind                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use bakery_core::fulfillment::{aggregate_requirements, ensure_can_start, plan_production, OrderLine};
use bakery_core::{FulfillmentResult, Product, ProductionUsage, Recipe};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashMap;
use tracing::{debug, info, warn};

use super::catalog::{load_product, load_recipe};
use super::order::load_order;
use super::stock::{load_snapshot, write_level};
use super::{begin_write, decimal, money, money_text, new_id, text};
use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct UsageRow {
    id: String,
    order_id: String,
    component_id: String,
    qty_used: String,
    unit: String,
    cost_per_unit: String,
    total_cost: String,
    created_at: DateTime<Utc>,
}

impl UsageRow {
    fn into_usage(self) -> DbResult<ProductionUsage> {
        Ok(ProductionUsage {
            qty_used: decimal("production_usage.qty_used", &self.qty_used)?,
            cost_per_unit: money("production_usage.cost_per_unit", &self.cost_per_unit)?,
            total_cost: money("production_usage.total_cost", &self.total_cost)?,
            id: self.id,
            order_id: self.order_id,
            component_id: self.component_id,
            unit: self.unit,
            created_at: self.created_at,
        })
    }
}

async fn insert_usage(conn: &mut SqliteConnection, usage: &ProductionUsage) -> DbResult<()> {
    sqlx::query(
        r#"
        INSERT INTO production_usage (
            id, order_id, component_id, qty_used, unit,
            cost_per_unit, total_cost, created_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        "#,
    )
    .bind(&usage.id)
    .bind(&usage.order_id)
    .bind(&usage.component_id)
    .bind(text(usage.qty_used))
    .bind(&usage.unit)
    .bind(money_text(usage.cost_per_unit))
    .bind(money_text(usage.total_cost))
    .bind(usage.created_at)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

/// Repository for production fulfillment.
#[derive(Debug, Clone)]
pub struct ProductionRepository {
    pool: SqlitePool,
}

impl ProductionRepository {
    /// Creates a new ProductionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductionRepository { pool }
    }

    /// Consumes the components of every order line and moves the order to
    /// `in_production`.
    ///
    /// Either every component is deducted, every usage row written and the
    /// order updated, or nothing changes.
    ///
    /// ## Errors
    /// - `NotFound` for an unknown order, or a product, recipe or component
    ///   it references
    /// - `InvalidState` unless the order is `draft` or `confirmed`
    /// - `InvalidRecipe` for a recipe that cannot be expanded
    /// - `InsufficientStock` for the first short component (aggregated over
    ///   the whole order)
    /// - `ConcurrentModification` if stock or the order changed mid-way
    pub async fn start_production(&self, order_id: &str) -> DbResult<FulfillmentResult> {
        let result = self.fulfill(order_id).await;

        if let Err(err) = &result {
            warn!(order_id = %order_id, error = %err, "Production not started");
        }
        result
    }

    async fn fulfill(&self, order_id: &str) -> DbResult<FulfillmentResult> {
        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        let order = load_order(&mut tx, order_id).await?;
        ensure_can_start(&order)?;

        let mut products: HashMap<String, Product> = HashMap::new();
        let mut recipes: HashMap<String, Recipe> = HashMap::new();
        for item in &order.items {
            if !products.contains_key(&item.product_id) {
                let product = load_product(&mut tx, &item.product_id).await?;
                if !recipes.contains_key(&product.recipe_id) {
                    let recipe = load_recipe(&mut tx, &product.recipe_id).await?;
                    recipes.insert(recipe.id.clone(), recipe);
                }
                products.insert(product.id.clone(), product);
            }
        }

        let mut lines = Vec::with_capacity(order.items.len());
        for item in &order.items {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
            let recipe = recipes
                .get(&product.recipe_id)
                .ok_or_else(|| DbError::not_found("Recipe", &product.recipe_id))?;
            lines.push(OrderLine {
                item,
                product,
                recipe,
            });
        }

        let requirements = aggregate_requirements(&lines)?;
        let snapshot = load_snapshot(&mut tx, requirements.component_ids()).await?;
        let plan = plan_production(&order, &requirements, &snapshot)?;

        debug!(
            order_id = %order.id,
            components = plan.consumptions.len(),
            cost_of_goods = %plan.cost_of_goods,
            "Production planned"
        );

        let mut usages = Vec::with_capacity(plan.consumptions.len());
        for consumption in &plan.consumptions {
            write_level(
                &mut tx,
                &consumption.component.id,
                consumption.stock_before.version,
                consumption.deduction.after,
                now,
            )
            .await?;

            let usage = consumption.to_usage(new_id(), &order.id, now);
            insert_usage(&mut tx, &usage).await?;
            usages.push(usage);
        }

        let updated = sqlx::query(
            r#"
            UPDATE orders SET
                status = 'in_production',
                cost_of_goods = ?1,
                profit = ?2,
                updated_at = ?3,
                production_started_at = ?3
            WHERE id = ?4 AND status IN ('draft', 'confirmed')
            "#,
        )
        .bind(money_text(plan.cost_of_goods))
        .bind(money_text(plan.profit))
        .bind(now)
        .bind(&order.id)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(DbError::ConcurrentModification {
                entity: "Order".to_string(),
                id: order.id.clone(),
            });
        }

        tx.commit().await?;

        info!(
            order_id = %order.id,
            order_number = %order.order_number,
            revenue = %plan.revenue,
            cost_of_goods = %plan.cost_of_goods,
            profit = %plan.profit,
            "Production started"
        );

        Ok(FulfillmentResult {
            order: plan.apply_to(&order, now),
            cost_of_goods: plan.cost_of_goods,
            profit: plan.profit,
            usages,
        })
    }

    /// Usage rows written when the order went into production.
    pub async fn list_usage(&self, order_id: &str) -> DbResult<Vec<ProductionUsage>> {
        let rows: Vec<UsageRow> = sqlx::query_as(
            r#"
            SELECT
                id, order_id, component_id, qty_used, unit,
                cost_per_unit, total_cost, created_at
            FROM production_usage
            WHERE order_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(UsageRow::into_usage).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
