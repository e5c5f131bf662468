//! Portfolio (account ledger) persistence.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Executor, FromRow, Sqlite};
use uuid::Uuid;

use super::decimal_from_text;
use crate::types::portfolio::Portfolio;

#[derive(Debug, FromRow)]
pub struct PortfolioRow {
    pub user_id: Uuid,
    pub cash_balance: String,
    pub total_value: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<PortfolioRow> for Portfolio {
    type Error = sqlx::Error;

    fn try_from(row: PortfolioRow) -> Result<Self, Self::Error> {
        Ok(Portfolio {
            user_id: row.user_id,
            cash_balance: decimal_from_text("cash_balance", &row.cash_balance)?,
            total_value: decimal_from_text("total_value", &row.total_value)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

pub async fn get_portfolio<'e, E>(exec: E, user_id: Uuid) -> Result<Option<Portfolio>, sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    let row = sqlx::query_as::<_, PortfolioRow>(
        "SELECT user_id, cash_balance, total_value, created_at, updated_at \
         FROM portfolios WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_optional(exec)
    .await?;
    row.map(Portfolio::try_from).transpose()
}

/// Insert a ledger with `starting_cash`; a no-op when one already exists.
pub async fn insert_portfolio_if_absent<'e, E>(
    exec: E,
    user_id: Uuid,
    starting_cash: Decimal,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO portfolios (user_id, cash_balance, total_value, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?) ON CONFLICT (user_id) DO NOTHING",
    )
    .bind(user_id)
    .bind(starting_cash.to_string())
    .bind(starting_cash.to_string())
    .bind(now)
    .bind(now)
    .execute(exec)
    .await?;
    Ok(())
}

pub async fn update_cash<'e, E>(
    exec: E,
    user_id: Uuid,
    cash_balance: Decimal,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE portfolios SET cash_balance = ?, updated_at = ? WHERE user_id = ?")
        .bind(cash_balance.to_string())
        .bind(now)
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(())
}

pub async fn update_total_value<'e, E>(
    exec: E,
    user_id: Uuid,
    total_value: Decimal,
    now: DateTime<Utc>,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query("UPDATE portfolios SET total_value = ?, updated_at = ? WHERE user_id = ?")
        .bind(total_value.to_string())
        .bind(now)
        .bind(user_id)
        .execute(exec)
        .await?;
    Ok(())
}
