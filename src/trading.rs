//! Order lifecycle: validation, recording, settlement and cancellation.
//!
//! Every operation that reads and then writes a user's ledger or holdings runs
//! under that user's lock and inside one database transaction. A failure at
//! any step drops the transaction, which rolls back everything before it.
//!
//! MARKET orders are checked against the feed price seen at submission and
//! filled at the price read again just before settlement. The two can differ
//! if a tick lands in between; settlement re-checks funds and shares at the
//! fill price.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::TradingError;
use crate::feed::PriceFeed;
use crate::holdings;
use crate::ledger::Ledger;
use crate::locks::UserLocks;
use crate::persistence;
use crate::types::holding::Holding;
use crate::types::order::{NewOrder, Order, OrderId, OrderSide, OrderStatus, Price, PriceType, Qty};
use crate::types::portfolio::Portfolio;

#[derive(Clone)]
pub struct TradingService {
    pool: SqlitePool,
    feed: Arc<dyn PriceFeed>,
    ledger: Ledger,
    locks: Arc<UserLocks>,
}

impl TradingService {
    pub fn new(pool: SqlitePool, feed: Arc<dyn PriceFeed>, ledger: Ledger, locks: Arc<UserLocks>) -> Self {
        Self {
            pool,
            feed,
            ledger,
            locks,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Nonzero feed price, or `SymbolNotFound`.
    pub fn current_price(&self, symbol: &str) -> Result<Price, TradingError> {
        self.feed
            .current_price(symbol)
            .filter(|p| !p.is_zero())
            .ok_or_else(|| TradingError::SymbolNotFound(symbol.to_string()))
    }

    /// Validate and record an order. MARKET orders are settled before this
    /// returns; LIMIT orders are left PENDING for the matching pass.
    pub async fn place_order(&self, user_id: Uuid, new_order: NewOrder) -> Result<Order, TradingError> {
        let feed_price = self.current_price(&new_order.symbol)?;
        let reference_price = match (new_order.price_type, new_order.price) {
            (PriceType::Market, _) => feed_price,
            (PriceType::Limit, Some(limit)) => limit,
            (PriceType::Limit, None) => {
                return Err(TradingError::Validation(
                    "Price is required for limit orders".to_string(),
                ));
            }
        };

        let _guard = self.locks.acquire(user_id).await?;
        let mut tx = persistence::begin_write(&self.pool).await?;

        match new_order.order_type {
            OrderSide::Buy => {
                let portfolio = self.ledger.get_or_create(&mut tx, user_id).await?;
                let needed = order_value(reference_price, new_order.quantity)?;
                if needed > portfolio.cash_balance {
                    return Err(TradingError::InsufficientFunds {
                        needed,
                        available: portfolio.cash_balance,
                    });
                }
            }
            OrderSide::Sell => {
                let available = holdings::get(&mut tx, user_id, &new_order.symbol)
                    .await?
                    .map_or(0, |h| h.quantity);
                if available < new_order.quantity {
                    return Err(TradingError::InsufficientShares {
                        needed: new_order.quantity,
                        available,
                    });
                }
            }
        }

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4(),
            user_id,
            symbol: new_order.symbol,
            order_type: new_order.order_type,
            price_type: new_order.price_type,
            quantity: new_order.quantity,
            price: new_order.price,
            filled_quantity: 0,
            executed_price: None,
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        persistence::insert_order(&mut *tx, &order).await?;

        let order = match order.price_type {
            PriceType::Market => {
                let execution_price = self.current_price(&order.symbol)?;
                self.settle_in(&mut tx, order, execution_price).await?
            }
            PriceType::Limit => order,
        };
        tx.commit().await?;

        info!(
            "Order {} {} {} {} x{} -> {:?}",
            order.id,
            order.order_type.as_str(),
            order.price_type.as_str(),
            order.symbol,
            order.quantity,
            order.status
        );
        Ok(order)
    }

    /// Fill a PENDING order in full at `execution_price`.
    pub async fn settle(&self, order_id: OrderId, execution_price: Price) -> Result<Order, TradingError> {
        if execution_price <= Decimal::ZERO {
            return Err(TradingError::Validation(
                "execution price must be positive".to_string(),
            ));
        }
        let owner = persistence::get_order_by_id(&self.pool, order_id)
            .await?
            .ok_or(TradingError::OrderNotFound(order_id))?
            .user_id;

        let _guard = self.locks.acquire(owner).await?;
        let mut tx = persistence::begin_write(&self.pool).await?;
        // Re-read under the lock; the order may have been filled or cancelled meanwhile.
        let order = persistence::get_order_by_id(&mut *tx, order_id)
            .await?
            .ok_or(TradingError::OrderNotFound(order_id))?;
        let order = self.settle_in(&mut tx, order, execution_price).await?;
        tx.commit().await?;
        Ok(order)
    }

    /// Settlement steps, run on the caller's transaction: mark filled, move
    /// the holding, move cash, revalue.
    async fn settle_in(
        &self,
        conn: &mut SqliteConnection,
        order: Order,
        execution_price: Price,
    ) -> Result<Order, TradingError> {
        if order.status != OrderStatus::Pending {
            return Err(TradingError::OrderNotPending(order.id));
        }

        let now = Utc::now();
        let amount = order_value(execution_price, order.quantity)?;
        persistence::mark_order_filled(&mut *conn, order.id, order.quantity, execution_price, now)
            .await?;

        match order.order_type {
            OrderSide::Buy => {
                let portfolio = self.ledger.get_or_create(conn, order.user_id).await?;
                if amount > portfolio.cash_balance {
                    warn!(
                        "Order {} rejected at settlement: needs {}, cash {}",
                        order.id, amount, portfolio.cash_balance
                    );
                    return Err(TradingError::InsufficientFunds {
                        needed: amount,
                        available: portfolio.cash_balance,
                    });
                }
                holdings::upsert_buy(conn, order.user_id, &order.symbol, order.quantity, execution_price)
                    .await?;
                self.ledger.debit(conn, order.user_id, amount).await?;
            }
            OrderSide::Sell => {
                holdings::apply_sell(conn, order.user_id, &order.symbol, order.quantity).await?;
                self.ledger.credit(conn, order.user_id, amount).await?;
            }
        }

        self.revalue(conn, order.user_id).await?;
        debug!("Order {} filled at {}", order.id, execution_price);

        Ok(Order {
            status: OrderStatus::Filled,
            filled_quantity: order.quantity,
            executed_price: Some(execution_price),
            updated_at: now,
            ..order
        })
    }

    /// Reprice every holding at the feed and store `cash + invested` as the
    /// ledger's total value.
    async fn revalue(&self, conn: &mut SqliteConnection, user_id: Uuid) -> Result<Portfolio, TradingError> {
        let mut invested = Decimal::ZERO;
        for holding in holdings::list_for_user(conn, user_id).await? {
            let value = match self.current_price(&holding.symbol) {
                Ok(price) => order_value(price, holding.quantity)?,
                Err(_) => {
                    warn!("No price for {}, valuing at cost", holding.symbol);
                    holding.cost_basis()
                }
            };
            persistence::set_current_value(&mut *conn, user_id, &holding.symbol, value).await?;
            invested += value;
        }

        let mut portfolio = self.ledger.get_or_create(conn, user_id).await?;
        portfolio.total_value = portfolio.cash_balance + invested;
        self.ledger
            .set_total_value(conn, user_id, portfolio.total_value)
            .await?;
        Ok(portfolio)
    }

    /// Cancel a PENDING order owned by `user_id`.
    pub async fn cancel_order(&self, order_id: OrderId, user_id: Uuid) -> Result<Order, TradingError> {
        let order = persistence::get_order_by_id(&self.pool, order_id)
            .await?
            .ok_or(TradingError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(TradingError::Unauthorized);
        }

        let _guard = self.locks.acquire(user_id).await?;
        let mut tx = persistence::begin_write(&self.pool).await?;
        let order = persistence::get_order_by_id(&mut *tx, order_id)
            .await?
            .ok_or(TradingError::OrderNotFound(order_id))?;
        if order.status != OrderStatus::Pending {
            return Err(TradingError::OrderNotCancellable(order_id));
        }
        let now = Utc::now();
        persistence::update_order_status(&mut *tx, order_id, OrderStatus::Cancelled, now).await?;
        tx.commit().await?;

        info!("Order {} cancelled", order_id);
        Ok(Order {
            status: OrderStatus::Cancelled,
            updated_at: now,
            ..order
        })
    }

    pub async fn get_order(&self, order_id: OrderId, user_id: Uuid) -> Result<Order, TradingError> {
        let order = persistence::get_order_by_id(&self.pool, order_id)
            .await?
            .ok_or(TradingError::OrderNotFound(order_id))?;
        if order.user_id != user_id {
            return Err(TradingError::Unauthorized);
        }
        Ok(order)
    }

    pub async fn list_orders(
        &self,
        user_id: Uuid,
        status: Option<OrderStatus>,
    ) -> Result<Vec<Order>, TradingError> {
        Ok(persistence::list_orders_for_user(&self.pool, user_id, status).await?)
    }

    /// Ledger snapshot, created with the starting balance on first access.
    pub async fn get_portfolio(&self, user_id: Uuid) -> Result<Portfolio, TradingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(self.ledger.get_or_create(&mut conn, user_id).await?)
    }

    pub async fn list_holdings(&self, user_id: Uuid) -> Result<Vec<Holding>, TradingError> {
        let mut conn = self.pool.acquire().await?;
        Ok(holdings::list_for_user(&mut conn, user_id).await?)
    }
}

/// `price * quantity`, rejecting values past the decimal range.
fn order_value(price: Price, quantity: Qty) -> Result<Decimal, TradingError> {
    price
        .checked_mul(Decimal::from(quantity))
        .ok_or_else(|| TradingError::Validation("order value is too large".to_string()))
}
