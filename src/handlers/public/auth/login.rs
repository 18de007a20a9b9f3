// handlers/public/auth/login.rs - POST /api/v1/auth/login handler

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{issue_token_pair, local_tokens, normalize_email, TokenResponse};
use crate::auth::password::verify_password;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /api/v1/auth/login - Exchange email and password for a token pair
///
/// Expected Output (Success):
/// ```json
/// {
///   "success": true,
///   "data": {
///     "access_token": "eyJhbGciOiJIUzI1NiI...",
///     "refresh_token": "eyJhbGciOiJIUzI1NiI...",
///     "token_type": "bearer",
///     "expires_in": 1800
///   }
/// }
/// ```
pub async fn login_post(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<TokenResponse> {
    let tokens = local_tokens(&state)?;
    let email = normalize_email(&payload.email);

    let user = state
        .users()
        .find_by_email(&email)
        .await?
        .ok_or_else(incorrect_credentials)?;
    let hashed = user.hashed_password.clone().ok_or_else(incorrect_credentials)?;

    let password = payload.password;
    let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hashed))
        .await
        .map_err(|e| {
            tracing::error!("Password verification task failed: {}", e);
            ApiError::internal_server_error("Could not verify credentials")
        })?;

    if !matches {
        tracing::warn!("Failed login for user {}", user.id);
        return Err(incorrect_credentials());
    }
    if !user.is_active {
        return Err(ApiError::bad_request("Account is deactivated"));
    }

    let pair = issue_token_pair(tokens, &user)?;
    Ok(ApiResponse::success(pair))
}

fn incorrect_credentials() -> ApiError {
    ApiError::unauthorized("Incorrect email or password")
}
