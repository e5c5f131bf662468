//! Portfolio endpoints:
//! - GET /portfolio - ledger snapshot (created on first access)
//! - GET /portfolio/holdings - current holdings

use axum::extract::State;
use axum::Json;

use crate::api::auth::AuthUser;
use crate::api::routes::AppState;
use crate::error::TradingError;
use crate::types::holding::Holding;
use crate::types::portfolio::Portfolio;

pub async fn get_portfolio(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Portfolio>, TradingError> {
    Ok(Json(state.trading.get_portfolio(user.user_id).await?))
}

pub async fn list_holdings(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Holding>>, TradingError> {
    Ok(Json(state.trading.list_holdings(user.user_id).await?))
}
