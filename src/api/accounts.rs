//! Account endpoints:
//! - POST /auth/register
//! - POST /auth/login
//! - GET /auth/me

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::api::ErrorResponse;
use crate::api::auth::{self, AuthUser};
use crate::api::routes::AppState;
use crate::error::AuthError;
use crate::persistence;
use crate::types::user::{LoginRequest, RegisterRequest, User};

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub user: User,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::UsernameTaken | AuthError::EmailTaken | AuthError::Validation(_) => {
                StatusCode::BAD_REQUEST
            }
            AuthError::Hash | AuthError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: self.code().to_string(),
        });
        (status, body).into_response()
    }
}

fn validate_registration(req: &RegisterRequest) -> Result<(), AuthError> {
    let name_len = req.username.chars().count();
    if !(3..=50).contains(&name_len) {
        return Err(AuthError::Validation(
            "username must be 3-50 characters".to_string(),
        ));
    }
    let email_ok = req
        .email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !email_ok {
        return Err(AuthError::Validation("email is invalid".to_string()));
    }
    if req.password.chars().count() < 6 {
        return Err(AuthError::Validation(
            "password must be at least 6 characters".to_string(),
        ));
    }
    Ok(())
}

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AuthResponse>), AuthError> {
    let Json(req) = payload.map_err(|e| AuthError::Validation(e.body_text()))?;
    validate_registration(&req)?;

    if persistence::get_user_by_username(&state.db, &req.username).await?.is_some() {
        return Err(AuthError::UsernameTaken);
    }
    if persistence::get_user_by_email(&state.db, &req.email).await?.is_some() {
        return Err(AuthError::EmailTaken);
    }

    let password_hash = auth::hash_password(&req.password)?;
    let id = Uuid::new_v4();
    let created_at = Utc::now();
    match persistence::insert_user(&state.db, id, &req.username, &req.email, &password_hash, created_at)
        .await
    {
        Ok(()) => {}
        // Lost a race with a concurrent registration.
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            return Err(AuthError::UsernameTaken);
        }
        Err(e) => return Err(e.into()),
    }

    let token = auth::create_token(&state.jwt_secret, id).map_err(|_| AuthError::InvalidToken)?;
    info!("Registered user {}", req.username);
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: User {
                id,
                username: req.username,
                email: req.email,
                created_at,
            },
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AuthError> {
    let Json(req) = payload.map_err(|e| AuthError::Validation(e.body_text()))?;
    let row = persistence::get_user_by_username(&state.db, &req.username)
        .await?
        .ok_or(AuthError::InvalidCredentials)?;
    if !auth::verify_password(&req.password, &row.password_hash)? {
        return Err(AuthError::InvalidCredentials);
    }
    let token = auth::create_token(&state.jwt_secret, row.id).map_err(|_| AuthError::InvalidToken)?;
    Ok(Json(AuthResponse {
        token,
        user: row.into(),
    }))
}

pub async fn me(State(state): State<AppState>, user: AuthUser) -> Result<Json<MeResponse>, AuthError> {
    let row = persistence::get_user_by_id(&state.db, user.user_id)
        .await?
        .ok_or(AuthError::InvalidToken)?;
    Ok(Json(MeResponse { user: row.into() }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn req(username: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn registration_rules() {
        assert!(validate_registration(&req("alice", "a@x.io", "secret")).is_ok());
        assert!(validate_registration(&req("al", "a@x.io", "secret")).is_err());
        assert!(validate_registration(&req("alice", "ax.io", "secret")).is_err());
        assert!(validate_registration(&req("alice", "a@x.io", "short")).is_err());
    }
}
