//! Order endpoints:
//! - POST /orders - place an order
//! - GET /orders?status= - list own orders
//! - GET /orders/{id} - get one own order
//! - POST /orders/{id}/cancel - cancel a pending order

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::error;
use uuid::Uuid;

use crate::api::ErrorResponse;
use crate::api::auth::AuthUser;
use crate::api::routes::AppState;
use crate::error::TradingError;
use crate::types::order::{Order, OrderStatus, PlaceOrderRequest};

impl IntoResponse for TradingError {
    fn into_response(self) -> Response {
        let status = match &self {
            TradingError::OrderNotFound(_) => StatusCode::NOT_FOUND,
            TradingError::SettlementTimeout => StatusCode::SERVICE_UNAVAILABLE,
            TradingError::Storage(e) => {
                error!("Storage failure: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    pub status: Option<String>,
}

pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<PlaceOrderRequest>, JsonRejection>,
) -> Result<Json<Order>, TradingError> {
    let Json(req) = payload.map_err(|e| TradingError::Validation(e.body_text()))?;
    let new_order = req.validate()?;
    let order = state.trading.place_order(user.user_id, new_order).await?;
    Ok(Json(order))
}

pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ListOrdersQuery>,
) -> Result<Json<Vec<Order>>, TradingError> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => Some(
            OrderStatus::parse(raw)
                .ok_or_else(|| TradingError::Validation(format!("unknown status {}", raw)))?,
        ),
        None => None,
    };
    let orders = state.trading.list_orders(user.user_id, status).await?;
    Ok(Json(orders))
}

pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, TradingError> {
    Ok(Json(state.trading.get_order(id, user.user_id).await?))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, TradingError> {
    Ok(Json(state.trading.cancel_order(id, user.user_id).await?))
}
