use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{accounts, market, orders, portfolio, ws};
use crate::feed::MarketDataStore;
use crate::trading::TradingService;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub trading: TradingService,
    pub market: Arc<MarketDataStore>,
    pub db: SqlitePool,
    pub jwt_secret: Arc<Vec<u8>>,
}

async fn health() -> &'static str {
    "healthy"
}

pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/register", post(accounts::register))
        .route("/auth/login", post(accounts::login))
        .route("/auth/me", get(accounts::me))
        .route("/orders", post(orders::place_order).get(orders::list_orders))
        .route("/orders/{id}", get(orders::get_order))
        .route("/orders/{id}/cancel", post(orders::cancel_order))
        .route("/portfolio", get(portfolio::get_portfolio))
        .route("/portfolio/holdings", get(portfolio::list_holdings))
        .route("/market/overview", get(market::overview))
        .route("/market/symbols", get(market::symbols))
        .route("/market/news", get(market::news))
        .route("/market/{symbol}/price", get(market::price))
        .route("/market/{symbol}/history", get(market::history))
        .route("/ws", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
