//! # Order Repository
//!
//! Order creation, status management and tier price lists.
//!
//! ## Order Lifecycle
//! ```text
//! create_order ──► draft ──(update_order_status)──► confirmed
//!                    │                                  │
//!                    └────── ProductionRepository ──────┴──► in_production
//!                                                              │
//!                                    (update_order_status) ────┴──► done
//!
//!   draft | confirmed | in_production ──(update_order_status)──► cancelled
//! ```
//!
//! Unit prices are copied from the product's tier column when the order is
//! created; later catalog price changes do not reach existing orders.

use bakery_core::pricing::{self, OrderRequest, PriceListEntry};
use bakery_core::{
    format_order_number, ClientTier, Money, Order, OrderItem, OrderStatus, ORDER_NUMBER_PREFIX,
};
use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use super::catalog::{load_client, load_product, load_products};
use super::{begin_write, money, money_text, new_id};
use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: String,
    order_number: String,
    client_id: String,
    status: OrderStatus,
    total_boxes: i64,
    total_price: String,
    cost_of_goods: String,
    profit: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    production_started_at: Option<DateTime<Utc>>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> DbResult<Order> {
        Ok(Order {
            total_price: money("orders.total_price", &self.total_price)?,
            cost_of_goods: money("orders.cost_of_goods", &self.cost_of_goods)?,
            profit: money("orders.profit", &self.profit)?,
            id: self.id,
            order_number: self.order_number,
            client_id: self.client_id,
            status: self.status,
            total_boxes: self.total_boxes,
            notes: self.notes,
            items,
            created_at: self.created_at,
            updated_at: self.updated_at,
            production_started_at: self.production_started_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    id: String,
    order_id: String,
    product_id: String,
    boxes: i64,
    unit_price: String,
    total_price: String,
}

impl OrderItemRow {
    fn into_item(self) -> DbResult<OrderItem> {
        Ok(OrderItem {
            unit_price: money("order_items.unit_price", &self.unit_price)?,
            total_price: money("order_items.total_price", &self.total_price)?,
            id: self.id,
            order_id: self.order_id,
            product_id: self.product_id,
            boxes: self.boxes,
        })
    }
}

const ORDER_SELECT: &str = r#"
    SELECT
        id, order_number, client_id, status, total_boxes,
        total_price, cost_of_goods, profit, notes,
        created_at, updated_at, production_started_at
    FROM orders
"#;

async fn load_items(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderItem>> {
    let rows: Vec<OrderItemRow> = sqlx::query_as(
        r#"
        SELECT id, order_id, product_id, boxes, unit_price, total_price
        FROM order_items
        WHERE order_id = ?1
        ORDER BY position
        "#,
    )
    .bind(order_id)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter().map(OrderItemRow::into_item).collect()
}

/// Loads an order with its lines in entry order.
pub(crate) async fn load_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Order> {
    let sql = format!("{ORDER_SELECT} WHERE id = ?1");
    let row: Option<OrderRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;
    let row = row.ok_or_else(|| DbError::not_found("Order", id))?;

    let items = load_items(conn, id).await?;
    row.into_order(items)
}

/// Every order (optionally of one status), newest first.
pub(crate) async fn load_orders(
    conn: &mut SqliteConnection,
    status: Option<OrderStatus>,
) -> DbResult<Vec<Order>> {
    let rows: Vec<OrderRow> = match status {
        Some(status) => {
            let sql =
                format!("{ORDER_SELECT} WHERE status = ?1 ORDER BY created_at DESC, order_number DESC");
            sqlx::query_as(&sql).bind(status).fetch_all(&mut *conn).await?
        }
        None => {
            let sql = format!("{ORDER_SELECT} ORDER BY created_at DESC, order_number DESC");
            sqlx::query_as(&sql).fetch_all(&mut *conn).await?
        }
    };

    let mut orders = Vec::with_capacity(rows.len());
    for row in rows {
        let items = load_items(conn, &row.id).await?;
        orders.push(row.into_order(items)?);
    }
    Ok(orders)
}

/// Next `ORD-YYYYMMDD-NNNN` number for the day of `now`.
async fn next_order_number(conn: &mut SqliteConnection, now: DateTime<Utc>) -> DbResult<String> {
    let day = now.date_naive();
    let pattern = format!("{}-{}-%", ORDER_NUMBER_PREFIX, day.format("%Y%m%d"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE order_number LIKE ?1")
        .bind(&pattern)
        .fetch_one(&mut *conn)
        .await?;

    let sequence = u32::try_from(count + 1)
        .map_err(|_| DbError::invalid_data("orders.order_number", pattern))?;
    Ok(format_order_number(day, sequence))
}

/// Repository for orders.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    /// Creates a draft order priced at the client's tier.
    ///
    /// ## Errors
    /// - `Validation` for empty orders, too many lines or bad box counts
    /// - `NotFound` for an unknown client or product
    pub async fn create_order(&self, request: &OrderRequest) -> DbResult<Order> {
        let request = request.validate()?;
        let now = Utc::now();

        let mut tx = begin_write(&self.pool).await?;

        let client = load_client(&mut tx, &request.client_id).await?;

        let mut products = Vec::with_capacity(request.items.len());
        for line in &request.items {
            products.push(load_product(&mut tx, &line.product_id).await?);
        }
        let lines: Vec<_> = products
            .iter()
            .zip(&request.items)
            .map(|(product, line)| (product, line.boxes))
            .collect();
        let priced = pricing::price_order(client.tier, &lines)?;

        let order_id = new_id();
        let order_number = next_order_number(&mut tx, now).await?;

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, order_number, client_id, status, total_boxes,
                total_price, cost_of_goods, profit, notes,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, '0', '0', ?7, ?8, ?8)
            "#,
        )
        .bind(&order_id)
        .bind(&order_number)
        .bind(&client.id)
        .bind(OrderStatus::Draft)
        .bind(priced.total_boxes)
        .bind(money_text(priced.total_price))
        .bind(&request.notes)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let mut items = Vec::with_capacity(priced.lines.len());
        for (position, line) in priced.lines.into_iter().enumerate() {
            let item = OrderItem {
                id: new_id(),
                order_id: order_id.clone(),
                product_id: line.product_id,
                boxes: line.boxes,
                unit_price: line.unit_price,
                total_price: line.total_price,
            };

            sqlx::query(
                r#"
                INSERT INTO order_items (id, order_id, product_id, boxes, unit_price, total_price, position)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.order_id)
            .bind(&item.product_id)
            .bind(item.boxes)
            .bind(money_text(item.unit_price))
            .bind(money_text(item.total_price))
            .bind(position as i64)
            .execute(&mut *tx)
            .await?;

            items.push(item);
        }

        tx.commit().await?;

        info!(
            order_id = %order_id,
            order_number = %order_number,
            client_id = %client.id,
            tier = %client.tier,
            total_boxes = priced.total_boxes,
            total_price = %priced.total_price,
            "Order created"
        );

        Ok(Order {
            id: order_id,
            order_number,
            client_id: client.id,
            status: OrderStatus::Draft,
            total_boxes: priced.total_boxes,
            total_price: priced.total_price,
            cost_of_goods: Money::zero(),
            profit: Money::zero(),
            notes: request.notes,
            items,
            created_at: now,
            updated_at: now,
            production_started_at: None,
        })
    }

    pub async fn get_order(&self, id: &str) -> DbResult<Order> {
        let mut conn = self.pool.acquire().await?;
        load_order(&mut conn, id).await
    }

    /// Orders newest first, optionally filtered by status.
    pub async fn list_orders(&self, status: Option<OrderStatus>) -> DbResult<Vec<Order>> {
        let mut conn = self.pool.acquire().await?;
        let orders = load_orders(&mut conn, status).await?;
        debug!(count = orders.len(), ?status, "Listed orders");
        Ok(orders)
    }

    /// Moves an order along the state machine by hand.
    ///
    /// `in_production` is rejected here; it is only reached through
    /// [`ProductionRepository::start_production`](super::production::ProductionRepository::start_production).
    /// Cancelling an order that is already in production does not return the
    /// consumed components to stock.
    pub async fn update_order_status(&self, id: &str, next: OrderStatus) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = begin_write(&self.pool).await?;

        let order = load_order(&mut tx, id).await?;
        if let Err(err) = order.status.validate_manual_transition(next) {
            warn!(order_id = %id, from = %order.status, to = %next, "Status change rejected");
            return Err(err.into());
        }

        let result = sqlx::query(
            "UPDATE orders SET status = ?1, updated_at = ?2 WHERE id = ?3 AND status = ?4",
        )
        .bind(next)
        .bind(now)
        .bind(id)
        .bind(order.status)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::ConcurrentModification {
                entity: "Order".to_string(),
                id: id.to_string(),
            });
        }

        tx.commit().await?;

        if order.status == OrderStatus::InProduction && next == OrderStatus::Cancelled {
            warn!(
                order_id = %id,
                cost_of_goods = %order.cost_of_goods,
                "Order cancelled after production started; consumed stock is not restored"
            );
        }
        info!(order_id = %id, from = %order.status, to = %next, "Order status changed");

        Ok(Order {
            status: next,
            updated_at: now,
            ..order
        })
    }

    /// Every product with its price for `tier`, ordered by name.
    pub async fn price_list(&self, tier: ClientTier) -> DbResult<Vec<PriceListEntry>> {
        let mut conn = self.pool.acquire().await?;
        let products = load_products(&mut conn).await?;
        Ok(pricing::price_list(&products, tier))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
