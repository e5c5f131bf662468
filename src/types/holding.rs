use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::order::{Price, Qty};

/// Position per (user, symbol). Only exists while `quantity > 0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Holding {
    pub user_id: Uuid,
    pub symbol: String,
    pub quantity: Qty,
    /// Volume-weighted cost basis; sells leave it untouched.
    pub average_price: Price,
    /// `quantity * price` as of the last revaluation.
    pub current_value: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Holding {
    pub fn cost_basis(&self) -> Decimal {
        self.average_price * Decimal::from(self.quantity)
    }
}
