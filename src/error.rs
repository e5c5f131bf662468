//! Error types for the trading core and the account layer.

use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TradingError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Symbol {0} not found")]
    SymbolNotFound(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Decimal, available: Decimal },

    #[error("Insufficient shares: need {needed}, have {available}")]
    InsufficientShares { needed: u64, available: u64 },

    #[error("Order {0} not found")]
    OrderNotFound(Uuid),

    #[error("Order {0} is not pending")]
    OrderNotPending(Uuid),

    #[error("Order {0} cannot be cancelled")]
    OrderNotCancellable(Uuid),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Timed out waiting for settlement lock")]
    SettlementTimeout,

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl TradingError {
    pub fn code(&self) -> &'static str {
        match self {
            TradingError::Validation(_) => "VALIDATION_ERROR",
            TradingError::SymbolNotFound(_) => "SYMBOL_NOT_FOUND",
            TradingError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            TradingError::InsufficientShares { .. } => "INSUFFICIENT_SHARES",
            TradingError::OrderNotFound(_) => "ORDER_NOT_FOUND",
            TradingError::OrderNotPending(_) => "ORDER_NOT_PENDING",
            TradingError::OrderNotCancellable(_) => "ORDER_NOT_CANCELLABLE",
            TradingError::Unauthorized => "UNAUTHORIZED",
            TradingError::SettlementTimeout => "SETTLEMENT_TIMEOUT",
            TradingError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Username already exists")]
    UsernameTaken,

    #[error("Email already exists")]
    EmailTaken,

    #[error("Authentication required")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Password hashing failed")]
    Hash,

    #[error("Storage failure: {0}")]
    Storage(#[from] sqlx::Error),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "INVALID_CREDENTIALS",
            AuthError::UsernameTaken => "USERNAME_TAKEN",
            AuthError::EmailTaken => "EMAIL_TAKEN",
            AuthError::MissingToken => "MISSING_TOKEN",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::Validation(_) => "VALIDATION_ERROR",
            AuthError::Hash => "HASH_FAILURE",
            AuthError::Storage(_) => "STORAGE_FAILURE",
        }
    }
}
