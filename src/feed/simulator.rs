//! Random-walk price ticks on a fixed interval, followed by a LIMIT order
//! matching pass.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::MarketDataStore;
use crate::matching;
use crate::trading::TradingService;
use crate::types::order::Price;

const PRICE_SCALE: u32 = 4;

/// Next price for a walk step. `unit` is a uniform sample in `[0, 1)`; the
/// move is `(unit - 0.5) * volatility`. Never drops below 0.01.
pub fn next_price(current: Price, unit: f64, volatility: f64) -> Price {
    let floor = Decimal::new(1, 2);
    let factor = Decimal::try_from(1.0 + (unit - 0.5) * volatility).unwrap_or(Decimal::ONE);
    (current * factor).round_dp(PRICE_SCALE).max(floor)
}

/// Move every known price one step and publish the new values.
pub fn tick<R: Rng>(store: &MarketDataStore, rng: &mut R, volatility: f64) {
    for (symbol, price) in store.snapshot() {
        let next = next_price(price, rng.r#gen::<f64>(), volatility);
        store.publish_price(&symbol, next);
    }
}

/// Spawn the tick loop. Each tick is followed by a matching pass over
/// pending LIMIT orders.
pub fn spawn_price_simulation(
    store: Arc<MarketDataStore>,
    trading: TradingService,
    interval: Duration,
    volatility: f64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rng = StdRng::from_entropy();
        let mut ticker = tokio::time::interval(interval);
        // The first tick of a tokio interval completes immediately.
        ticker.tick().await;
        info!("Price simulation running every {:?}", interval);
        loop {
            ticker.tick().await;
            tick(&store, &mut rng, volatility);
            debug!("Price tick applied to {} symbols", store.snapshot().len());
            match matching::run_matching_pass(&trading).await {
                Ok(report) => {
                    if !report.filled.is_empty() {
                        info!("Matched {} limit orders", report.filled.len());
                    }
                    if report.failed > 0 {
                        warn!("{} limit orders failed to settle this tick", report.failed);
                    }
                }
                Err(e) => error!("Limit matching pass failed: {}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn midpoint_sample_keeps_price() {
        let price = Decimal::new(17450, 2);
        assert_eq!(next_price(price, 0.5, 0.02), price);
    }

    #[test]
    fn move_is_bounded_by_half_the_volatility() {
        let price = Decimal::from(100);
        let up = next_price(price, 0.999_999, 0.02);
        let down = next_price(price, 0.0, 0.02);
        assert!(up <= Decimal::from(101));
        assert_eq!(down, Decimal::from(99));
    }

    #[test]
    fn price_never_drops_below_one_cent() {
        let price = Decimal::new(1, 2);
        assert_eq!(next_price(price, 0.0, 1.9), Decimal::new(1, 2));
    }

    #[test]
    fn tick_moves_every_symbol() {
        let store = MarketDataStore::new();
        store.set_price("AAPL", Decimal::from(100));
        store.set_price("IBM", Decimal::from(50));
        let mut rng = StdRng::seed_from_u64(7);
        tick(&store, &mut rng, 0.02);
        assert_eq!(store.snapshot().len(), 2);
    }
}
