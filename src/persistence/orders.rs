//! Order persistence: insert, fill, status updates and listings.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

use super::{decimal_from_text, enum_decode_error, qty_from_i64};
use crate::types::order::{Order, OrderSide, OrderStatus, PriceType};

#[derive(Debug, FromRow)]
pub struct OrderRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub symbol: String,
    pub order_type: String,
    pub price_type: String,
    pub quantity: i64,
    pub price: Option<String>,
    pub filled_quantity: i64,
    pub executed_price: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = sqlx::Error;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        let order_type = OrderSide::parse(&row.order_type)
            .ok_or_else(|| enum_decode_error("order_type", &row.order_type))?;
        let price_type = PriceType::parse(&row.price_type)
            .ok_or_else(|| enum_decode_error("price_type", &row.price_type))?;
        let status = OrderStatus::parse(&row.status)
            .ok_or_else(|| enum_decode_error("status", &row.status))?;
        Ok(Order {
            id: row.id,
            user_id: row.user_id,
            symbol: row.symbol,
            order_type,
            price_type,
            quantity: qty_from_i64("quantity", row.quantity)?,
            price: row
                .price
                .as_deref()
                .map(|p| decimal_from_text("price", p))
                .transpose()?,
            filled_quantity: qty_from_i64("filled_quantity", row.filled_quantity)?,
            executed_price: row
                .executed_price
                .as_deref()
                .map(|p| decimal_from_text("executed_price", p))
                .transpose()?,
            status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_ORDER: &str = "SELECT id, user_id, symbol, order_type, price_type, quantity, price, \
     filled_quantity, executed_price, status, created_at, updated_at FROM orders";

/// Insert a freshly created order.
pub async fn insert_order<'e, E>(exec: E, order: &Order) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO orders (id, user_id, symbol, order_type, price_type, quantity, price, \
         filled_quantity, executed_price, status, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(order.id)
    .bind(order.user_id)
    .bind(&order.symbol)
    .bind(order.order_type.as_str())
    .bind(order.price_type.as_str())
    .bind(order.quantity as i64)
    .bind(order.price.map(|p| p.to_string()))
    .bind(order.filled_quantity as i64)
    .bind(order.executed_price.map(|p| p.to_string()))
    .bind(order.status.as_str())
    .bind(order.created_at)
    .bind(order.updated_at)
    .execute(exec)
    .await?;
    Ok(())
}

/// Update order status (cancel).
pub async fn update_order_status<'e, E>(
    exec: E,
    id: Uuid,
    status: OrderStatus,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE orders SET status = ?, updated_at = ? WHERE id = ?")
        .bind(status.as_str())
        .bind(now)
        .bind(id)
        .execute(exec)
        .await?;
    Ok(())
}

/// Mark an order FILLED for its whole quantity at `executed_price`.
pub async fn mark_order_filled<'e, E>(
    exec: E,
    id: Uuid,
    filled_quantity: u64,
    executed_price: Decimal,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "UPDATE orders SET status = 'FILLED', filled_quantity = ?, executed_price = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(filled_quantity as i64)
    .bind(executed_price.to_string())
    .bind(now)
    .bind(id)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn get_order_by_id<'e, E>(exec: E, order_id: Uuid) -> Result<Option<Order>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, OrderRow>(&format!("{} WHERE id = ?", SELECT_ORDER))
        .bind(order_id)
        .fetch_optional(exec)
        .await?;
    row.map(Order::try_from).transpose()
}

/// Orders of a user in creation order, optionally filtered by status.
pub async fn list_orders_for_user<'e, E>(
    exec: E,
    user_id: Uuid,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = match status {
        Some(status) => {
            sqlx::query_as::<_, OrderRow>(&format!(
                "{} WHERE user_id = ? AND status = ? ORDER BY created_at, rowid",
                SELECT_ORDER
            ))
            .bind(user_id)
            .bind(status.as_str())
            .fetch_all(exec)
            .await?
        }
        None => {
            sqlx::query_as::<_, OrderRow>(&format!(
                "{} WHERE user_id = ? ORDER BY created_at, rowid",
                SELECT_ORDER
            ))
            .bind(user_id)
            .fetch_all(exec)
            .await?
        }
    };
    rows.into_iter().map(Order::try_from).collect()
}

/// Pending LIMIT orders across all users, oldest first, for the matching pass.
pub async fn list_pending_limit_orders<'e, E>(exec: E) -> Result<Vec<Order>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "{} WHERE status = 'PENDING' AND price_type = 'LIMIT' ORDER BY created_at, rowid",
        SELECT_ORDER
    ))
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(Order::try_from).collect()
}
