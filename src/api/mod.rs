pub mod accounts;
pub mod auth;
pub mod market;
pub mod orders;
pub mod portfolio;
pub mod routes;
pub mod ws;

use serde::Serialize;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
