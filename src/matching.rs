//! LIMIT order matching, run after every price tick.
//!
//! A BUY LIMIT crosses once the feed price is at or below its limit, a SELL
//! LIMIT once it is at or above. Crossing orders fill in full at the feed
//! price. An order that no longer passes the funds or shares check stays
//! PENDING and is tried again on the next tick.

use tracing::{debug, error, warn};

use crate::error::TradingError;
use crate::persistence;
use crate::trading::TradingService;
use crate::types::order::{Order, OrderSide, Price, PriceType};

#[derive(Debug, Default)]
pub struct MatchReport {
    pub filled: Vec<Order>,
    /// Crossed but could not be settled this pass.
    pub deferred: usize,
    /// Settlement failed for a reason other than funds, shares or lock wait.
    pub failed: usize,
}

/// Whether a pending LIMIT order should fill at `market`.
pub fn crosses(order: &Order, market: Price) -> bool {
    let Some(limit) = order.price else {
        return false;
    };
    if order.price_type != PriceType::Limit {
        return false;
    }
    match order.order_type {
        OrderSide::Buy => market <= limit,
        OrderSide::Sell => market >= limit,
    }
}

pub async fn run_matching_pass(trading: &TradingService) -> Result<MatchReport, TradingError> {
    let pending = persistence::list_pending_limit_orders(trading.pool()).await?;
    let mut report = MatchReport::default();

    for order in pending {
        let Ok(market) = trading.current_price(&order.symbol) else {
            continue;
        };
        if !crosses(&order, market) {
            continue;
        }
        match trading.settle(order.id, market).await {
            Ok(filled) => {
                debug!("Limit order {} filled at {}", filled.id, market);
                report.filled.push(filled);
            }
            Err(e @ (TradingError::InsufficientFunds { .. }
            | TradingError::InsufficientShares { .. }
            | TradingError::SettlementTimeout)) => {
                warn!("Limit order {} deferred: {}", order.id, e);
                report.deferred += 1;
            }
            // Cancelled or filled since the listing was taken.
            Err(TradingError::OrderNotPending(_)) => {}
            // One broken order must not hold back the rest of the pass.
            Err(e) => {
                error!("Limit order {} failed to settle: {}", order.id, e);
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    use super::*;
    use crate::types::order::OrderStatus;

    fn limit(side: OrderSide, price: i64) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            symbol: "AAPL".to_string(),
            order_type: side,
            price_type: PriceType::Limit,
            quantity: 1,
            price: Some(Decimal::from(price)),
            filled_quantity: 0,
            executed_price: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn buy_crosses_at_or_below_limit() {
        let order = limit(OrderSide::Buy, 100);
        assert!(crosses(&order, Decimal::from(100)));
        assert!(crosses(&order, Decimal::from(99)));
        assert!(!crosses(&order, Decimal::from(101)));
    }

    #[test]
    fn sell_crosses_at_or_above_limit() {
        let order = limit(OrderSide::Sell, 100);
        assert!(crosses(&order, Decimal::from(100)));
        assert!(crosses(&order, Decimal::from(101)));
        assert!(!crosses(&order, Decimal::from(99)));
    }

    #[test]
    fn market_orders_never_cross() {
        let mut order = limit(OrderSide::Buy, 100);
        order.price_type = PriceType::Market;
        assert!(!crosses(&order, Decimal::from(1)));
    }
}
