//! Price feed: the shared current-price map, the loaded series and news, the
//! file loader and the tick simulator.

pub mod loader;
pub mod simulator;
pub mod store;

use crate::types::order::Price;

pub use store::{MarketDataStore, PriceTick};

/// Read side of the price feed as seen by the trading core.
pub trait PriceFeed: Send + Sync {
    /// Current price of `symbol`, or `None` when the symbol is unknown.
    /// A zero price is treated as unknown by callers.
    fn current_price(&self, symbol: &str) -> Option<Price>;
}
