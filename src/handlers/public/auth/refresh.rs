// handlers/public/auth/refresh.rs - POST /api/v1/auth/refresh handler

use axum::{extract::State, Json};
use serde::Deserialize;

use super::{issue_token_pair, local_tokens, TokenResponse};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

/// POST /api/v1/auth/refresh - Trade a refresh token for a new token pair
///
/// The token must verify against the shared secret, be unexpired and carry
/// `type: "refresh"`. Access tokens are refused here.
pub async fn refresh_post(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<TokenResponse> {
    let tokens = local_tokens(&state)?;

    let claims = tokens.verify_refresh(&payload.refresh_token).map_err(|e| {
        tracing::warn!("Rejected refresh token: {}", e);
        ApiError::unauthorized("Invalid refresh token")
    })?;

    let users = state.users();
    let user = match (claims.user_id(), claims.subject()) {
        (Some(id), _) => users.find_by_id(id).await?,
        (None, Some(email)) => users.find_by_email(email).await?,
        (None, None) => None,
    }
    .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    if !user.is_active {
        return Err(ApiError::bad_request("Account is deactivated"));
    }

    let pair = issue_token_pair(tokens, &user)?;
    Ok(ApiResponse::success(pair))
}
