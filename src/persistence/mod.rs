//! Database layer: pool, migrations, and access for users, portfolios, holdings,
//! orders and the market data cache.
//!
//! Every function takes a generic SQLite executor so it can run against the
//! pool or inside a settlement transaction. Decimal amounts are stored as TEXT.

mod holdings;
mod market_cache;
mod orders;
mod pool;
mod portfolios;
mod users;

use rust_decimal::Decimal;

pub use holdings::{
    delete_holding, get_holding, list_holdings_for_user, set_current_value, upsert_holding,
    HoldingRow,
};
pub use market_cache::upsert_market_data;
pub use orders::{
    get_order_by_id, insert_order, list_orders_for_user, list_pending_limit_orders,
    mark_order_filled, update_order_status, OrderRow,
};
pub use pool::{begin_write, connect, connect_in_memory, run_migrations};
pub use portfolios::{get_portfolio, insert_portfolio_if_absent, update_cash, update_total_value, PortfolioRow};
pub use sqlx::SqlitePool;
pub use users::{get_user_by_email, get_user_by_id, get_user_by_username, insert_user, UserRow};

pub(crate) fn decimal_from_text(column: &str, raw: &str) -> Result<Decimal, sqlx::Error> {
    raw.parse::<Decimal>().map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn qty_from_i64(column: &str, raw: i64) -> Result<u64, sqlx::Error> {
    u64::try_from(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: Box::new(e),
    })
}

pub(crate) fn enum_decode_error(column: &str, raw: &str) -> sqlx::Error {
    sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("unexpected value {:?}", raw).into(),
    }
}
