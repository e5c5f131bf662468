//! Holding persistence: upsert, delete and list in insertion order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

use super::{decimal_from_text, qty_from_i64};
use crate::types::holding::Holding;

#[derive(Debug, FromRow)]
pub struct HoldingRow {
    pub user_id: Uuid,
    pub symbol: String,
    pub quantity: i64,
    pub average_price: String,
    pub current_value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<HoldingRow> for Holding {
    type Error = sqlx::Error;

    fn try_from(row: HoldingRow) -> Result<Self, Self::Error> {
        Ok(Holding {
            user_id: row.user_id,
            symbol: row.symbol,
            quantity: qty_from_i64("quantity", row.quantity)?,
            average_price: decimal_from_text("average_price", &row.average_price)?,
            current_value: decimal_from_text("current_value", &row.current_value)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_HOLDING: &str = "SELECT user_id, symbol, quantity, average_price, current_value, \
     created_at, updated_at FROM holdings";

pub async fn get_holding<'e, E>(
    exec: E,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, HoldingRow>(&format!(
        "{} WHERE user_id = ? AND symbol = ?",
        SELECT_HOLDING
    ))
    .bind(user_id)
    .bind(symbol)
    .fetch_optional(exec)
    .await?;
    row.map(Holding::try_from).transpose()
}

/// All holdings of a user, oldest row first.
pub async fn list_holdings_for_user<'e, E>(
    exec: E,
    user_id: Uuid,
) -> Result<Vec<Holding>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let rows = sqlx::query_as::<_, HoldingRow>(&format!(
        "{} WHERE user_id = ? ORDER BY rowid",
        SELECT_HOLDING
    ))
    .bind(user_id)
    .fetch_all(exec)
    .await?;
    rows.into_iter().map(Holding::try_from).collect()
}

/// Upsert a holding (insert or update on conflict). The row keeps its
/// position in insertion order when updated.
pub async fn upsert_holding<'e, E>(
    exec: E,
    user_id: Uuid,
    symbol: &str,
    quantity: u64,
    average_price: Decimal,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO holdings (user_id, symbol, quantity, average_price, current_value, created_at, updated_at) \
         VALUES (?1, ?2, ?3, ?4, '0', ?5, ?5) \
         ON CONFLICT (user_id, symbol) DO UPDATE SET quantity = ?3, average_price = ?4, updated_at = ?5",
    )
    .bind(user_id)
    .bind(symbol)
    .bind(quantity as i64)
    .bind(average_price.to_string())
    .bind(now)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn delete_holding<'e, E>(exec: E, user_id: Uuid, symbol: &str) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("DELETE FROM holdings WHERE user_id = ? AND symbol = ?")
        .bind(user_id)
        .bind(symbol)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn set_current_value<'e, E>(
    exec: E,
    user_id: Uuid,
    symbol: &str,
    current_value: Decimal,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE holdings SET current_value = ? WHERE user_id = ? AND symbol = ?")
        .bind(current_value.to_string())
        .bind(user_id)
        .bind(symbol)
        .execute(exec)
        .await?;
    Ok(())
}
