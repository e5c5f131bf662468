//! Market data endpoints (no authentication):
//! - GET /market/overview
//! - GET /market/symbols
//! - GET /market/news?date=
//! - GET /market/{symbol}/price
//! - GET /market/{symbol}/history?days=

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::api::ErrorResponse;
use crate::api::routes::AppState;
use crate::feed::PriceFeed;
use crate::types::market::{MarketDataPoint, MarketOverviewEntry, NewsItem, PriceQuote};

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    pub days: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct NewsQuery {
    pub date: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub symbol: String,
    pub data: Vec<MarketDataPoint>,
}

pub async fn overview(State(state): State<AppState>) -> Json<Vec<MarketOverviewEntry>> {
    Json(state.market.overview())
}

pub async fn symbols(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.market.supported_symbols())
}

pub async fn price(State(state): State<AppState>, Path(symbol): Path<String>) -> Response {
    let symbol = symbol.to_uppercase();
    match state.market.current_price(&symbol).filter(|p| !p.is_zero()) {
        Some(price) => Json(PriceQuote { symbol, price }).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: "Symbol not found".to_string(),
                code: "SYMBOL_NOT_FOUND".to_string(),
            }),
        )
            .into_response(),
    }
}

pub async fn history(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Json<HistoryResponse> {
    let symbol = symbol.to_uppercase();
    let data = state.market.history(&symbol, query.days);
    Json(HistoryResponse { symbol, data })
}

pub async fn news(State(state): State<AppState>, Query(query): Query<NewsQuery>) -> Json<Vec<NewsItem>> {
    Json(state.market.news(query.date.as_deref()))
}
