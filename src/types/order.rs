use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TradingError;

pub type Price = Decimal;
pub type Qty = u64;
pub type OrderId = Uuid;

const MAX_SYMBOL_LEN: usize = 10;

/// Trade direction. Serialized as `order_type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderSide {
    Buy,
    Sell,
}

/// How the order is priced. Serialized as `price_type` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum PriceType {
    #[default]
    Market,
    Limit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderStatus {
    Pending,
    Filled,
    Cancelled,
    /// Reserved for partial fills; nothing produces it yet.
    Partial,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Filled => "FILLED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Partial => "PARTIAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "PENDING" => Some(OrderStatus::Pending),
            "FILLED" => Some(OrderStatus::Filled),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "PARTIAL" => Some(OrderStatus::Partial),
            _ => None,
        }
    }
}

impl OrderSide {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderSide::Buy => "BUY",
            OrderSide::Sell => "SELL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "BUY" => Some(OrderSide::Buy),
            "SELL" => Some(OrderSide::Sell),
            _ => None,
        }
    }
}

impl PriceType {
    pub fn as_str(self) -> &'static str {
        match self {
            PriceType::Market => "MARKET",
            PriceType::Limit => "LIMIT",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MARKET" => Some(PriceType::Market),
            "LIMIT" => Some(PriceType::Limit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Uuid,
    pub symbol: String,
    pub order_type: OrderSide,
    pub price_type: PriceType,
    pub quantity: Qty,
    /// Limit price; `None` for market orders.
    pub price: Option<Price>,
    pub filled_quantity: Qty,
    pub executed_price: Option<Price>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /orders` as received from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceOrderRequest {
    pub symbol: String,
    pub order_type: OrderSide,
    #[serde(default)]
    pub price_type: PriceType,
    pub quantity: i64,
    #[serde(default)]
    pub price: Option<Price>,
}

/// A request that passed schema checks. Only constructed through
/// [`PlaceOrderRequest::validate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub symbol: String,
    pub order_type: OrderSide,
    pub price_type: PriceType,
    pub quantity: Qty,
    pub price: Option<Price>,
}

impl PlaceOrderRequest {
    pub fn validate(self) -> Result<NewOrder, TradingError> {
        let symbol = self.symbol.trim().to_uppercase();
        if symbol.is_empty() || symbol.len() > MAX_SYMBOL_LEN {
            return Err(TradingError::Validation(format!(
                "symbol must be 1-{} characters",
                MAX_SYMBOL_LEN
            )));
        }
        if self.quantity < 1 {
            return Err(TradingError::Validation(
                "quantity must be at least 1".to_string(),
            ));
        }
        let min_price = Decimal::new(1, 2);
        if let Some(price) = self.price {
            if price < min_price {
                return Err(TradingError::Validation(
                    "price must be at least 0.01".to_string(),
                ));
            }
        }
        let price = match self.price_type {
            PriceType::Limit => match self.price {
                Some(p) => Some(p),
                None => {
                    return Err(TradingError::Validation(
                        "Price is required for limit orders".to_string(),
                    ));
                }
            },
            // A price sent with a market order is ignored.
            PriceType::Market => None,
        };
        Ok(NewOrder {
            symbol,
            order_type: self.order_type,
            price_type: self.price_type,
            quantity: self.quantity as Qty,
            price,
        })
    }
}

impl NewOrder {
    pub fn market(symbol: &str, order_type: OrderSide, quantity: Qty) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            order_type,
            price_type: PriceType::Market,
            quantity,
            price: None,
        }
    }

    pub fn limit(symbol: &str, order_type: OrderSide, quantity: Qty, price: Price) -> Self {
        Self {
            symbol: symbol.to_uppercase(),
            order_type,
            price_type: PriceType::Limit,
            quantity,
            price: Some(price),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(price_type: PriceType, quantity: i64, price: Option<Price>) -> PlaceOrderRequest {
        PlaceOrderRequest {
            symbol: " aapl ".to_string(),
            order_type: OrderSide::Buy,
            price_type,
            quantity,
            price,
        }
    }

    #[test]
    fn limit_without_price_is_rejected() {
        let err = request(PriceType::Limit, 50, None).validate().unwrap_err();
        assert!(matches!(err, TradingError::Validation(ref m) if m.contains("limit")));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = request(PriceType::Market, 0, None).validate().unwrap_err();
        assert!(matches!(err, TradingError::Validation(_)));
    }

    #[test]
    fn price_below_one_cent_is_rejected() {
        let err = request(PriceType::Limit, 1, Some(Decimal::new(5, 3)))
            .validate()
            .unwrap_err();
        assert!(matches!(err, TradingError::Validation(_)));
    }

    #[test]
    fn symbol_is_normalized_and_market_price_dropped() {
        let order = request(PriceType::Market, 3, Some(Decimal::new(10, 0)))
            .validate()
            .unwrap();
        assert_eq!(order.symbol, "AAPL");
        assert_eq!(order.price, None);
        assert_eq!(order.quantity, 3);
    }

    #[test]
    fn status_parse_is_case_insensitive() {
        assert_eq!(OrderStatus::parse("pending"), Some(OrderStatus::Pending));
        assert_eq!(OrderStatus::parse("FILLED"), Some(OrderStatus::Filled));
        assert_eq!(OrderStatus::parse("open"), None);
    }
}
