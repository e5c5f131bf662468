//! Holdings book: one position per (user, symbol) while quantity > 0.
//! Buys move the weighted average cost; sells only reduce quantity.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::SqliteConnection;
use uuid::Uuid;

use crate::error::TradingError;
use crate::persistence;
use crate::types::holding::Holding;
use crate::types::order::{Price, Qty};

pub async fn get(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
) -> Result<Option<Holding>, sqlx::Error> {
    persistence::get_holding(&mut *conn, user_id, symbol).await
}

/// All holdings of a user in insertion order.
pub async fn list_for_user(
    conn: &mut SqliteConnection,
    user_id: Uuid,
) -> Result<Vec<Holding>, sqlx::Error> {
    persistence::list_holdings_for_user(&mut *conn, user_id).await
}

/// Add a bought lot. Creates the holding at `price`, or folds the lot into the
/// existing average.
pub async fn upsert_buy(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
    quantity: Qty,
    price: Price,
) -> Result<Holding, TradingError> {
    let (new_qty, new_avg) = match get(conn, user_id, symbol).await? {
        Some(h) => {
            let total = h.quantity.checked_add(quantity);
            let avg = weighted_average(h.quantity, h.average_price, quantity, price);
            total.zip(avg).ok_or_else(|| {
                TradingError::Validation("holding value is too large".to_string())
            })?
        }
        None => (quantity, price),
    };
    persistence::upsert_holding(&mut *conn, user_id, symbol, new_qty, new_avg, Utc::now()).await?;
    Ok(get(conn, user_id, symbol).await?.ok_or(sqlx::Error::RowNotFound)?)
}

/// Remove `quantity` shares. The row is deleted when nothing is left.
/// Returns the holding afterwards, or `None` once closed.
pub async fn apply_sell(
    conn: &mut SqliteConnection,
    user_id: Uuid,
    symbol: &str,
    quantity: Qty,
) -> Result<Option<Holding>, TradingError> {
    let held = get(conn, user_id, symbol).await?;
    let available = held.as_ref().map_or(0, |h| h.quantity);
    let Some(holding) = held.filter(|h| h.quantity >= quantity) else {
        return Err(TradingError::InsufficientShares {
            needed: quantity,
            available,
        });
    };

    let remaining = holding.quantity - quantity;
    if remaining == 0 {
        persistence::delete_holding(&mut *conn, user_id, symbol).await?;
        return Ok(None);
    }
    persistence::upsert_holding(
        &mut *conn,
        user_id,
        symbol,
        remaining,
        holding.average_price,
        Utc::now(),
    )
    .await?;
    Ok(get(conn, user_id, symbol).await?)
}

/// `(q1*p1 + q2*p2) / (q1 + q2)`. Zero when both quantities are zero,
/// `None` when the sum leaves the decimal range.
pub fn weighted_average(old_qty: Qty, old_avg: Price, qty: Qty, price: Price) -> Option<Price> {
    let total = old_qty.checked_add(qty)?;
    if total == 0 {
        return Some(Decimal::ZERO);
    }
    let old_value = Decimal::from(old_qty).checked_mul(old_avg)?;
    let new_value = Decimal::from(qty).checked_mul(price)?;
    old_value.checked_add(new_value)?.checked_div(Decimal::from(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn weighted_average_of_two_lots() {
        let avg = weighted_average(10, Decimal::from(100), 30, Decimal::from(120));
        assert_eq!(avg, Some(Decimal::from(115)));
    }

    #[test]
    fn weighted_average_from_empty_is_price() {
        assert_eq!(
            weighted_average(0, Decimal::ZERO, 5, Decimal::new(17450, 2)),
            Some(Decimal::new(17450, 2))
        );
    }

    #[test]
    fn weighted_average_out_of_range_is_none() {
        assert_eq!(weighted_average(2, Decimal::MAX, 1, Decimal::ONE), None);
    }
}
