//! Account ledger: one cash balance and total value per user.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::persistence;
use crate::types::portfolio::Portfolio;

#[derive(Debug, Clone, Copy)]
pub struct Ledger {
    starting_cash: Decimal,
}

impl Ledger {
    pub fn new(starting_cash: Decimal) -> Self {
        Self { starting_cash }
    }

    /// Existing ledger, or a new one holding the starting cash. Concurrent first
    /// calls both end up reading the same row.
    pub async fn get_or_create(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
    ) -> Result<Portfolio, sqlx::Error> {
        if let Some(portfolio) = persistence::get_portfolio(&mut *conn, user_id).await? {
            return Ok(portfolio);
        }
        persistence::insert_portfolio_if_absent(&mut *conn, user_id, self.starting_cash, Utc::now())
            .await?;
        persistence::get_portfolio(&mut *conn, user_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Subtract `amount` from cash. Callers check affordability first.
    pub async fn debit(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<Portfolio, sqlx::Error> {
        debug_assert!(!amount.is_sign_negative());
        self.adjust(conn, user_id, -amount).await
    }

    pub async fn credit(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        amount: Decimal,
    ) -> Result<Portfolio, sqlx::Error> {
        debug_assert!(!amount.is_sign_negative());
        self.adjust(conn, user_id, amount).await
    }

    pub async fn set_total_value(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        total_value: Decimal,
    ) -> Result<(), sqlx::Error> {
        persistence::update_total_value(&mut *conn, user_id, total_value, Utc::now()).await
    }

    async fn adjust(
        &self,
        conn: &mut SqliteConnection,
        user_id: Uuid,
        delta: Decimal,
    ) -> Result<Portfolio, sqlx::Error> {
        let mut portfolio = self.get_or_create(conn, user_id).await?;
        let now = Utc::now();
        portfolio.cash_balance += delta;
        portfolio.updated_at = now;
        persistence::update_cash(&mut *conn, user_id, portfolio.cash_balance, now).await?;
        Ok(portfolio)
    }
}
