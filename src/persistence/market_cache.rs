//! Market data cache keyed by (symbol, timestamp).

use sqlx::{Executor, Sqlite};

use crate::types::market::MarketDataPoint;

pub async fn upsert_market_data<'e, E>(
    exec: E,
    symbol: &str,
    point: &MarketDataPoint,
) -> Result<(), sqlx::Error>
where
    E: Executor<'e, Database = Sqlite>,
{
    sqlx::query(
        "INSERT INTO market_data_cache (symbol, timestamp, price, open_price, high_price, low_price, volume) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) \
         ON CONFLICT (symbol, timestamp) DO UPDATE SET price = ?3, open_price = ?4, high_price = ?5, \
         low_price = ?6, volume = ?7",
    )
    .bind(symbol)
    .bind(&point.timestamp)
    .bind(point.close.to_string())
    .bind(point.open.to_string())
    .bind(point.high.to_string())
    .bind(point.low.to_string())
    .bind(point.volume as i64)
    .execute(exec)
    .await?;
    Ok(())
}
