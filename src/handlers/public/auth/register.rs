// handlers/public/auth/register.rs - POST /api/v1/auth/register handler

use axum::{extract::State, Json};
use serde::Deserialize;
use std::collections::HashMap;

use super::{is_valid_email, local_tokens, normalize_email, UserResponse};
use crate::auth::password::hash_password;
use crate::database::{DatabaseError, NewUser};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;

const ROLES: &[&str] = &["elder", "caregiver"];

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub role: Option<String>,
    pub phone_number: Option<String>,
}

/// POST /api/v1/auth/register - Create a local account
///
/// Expected Input:
/// ```json
/// {
///   "email": "asha@example.com",
///   "password": "string",
///   "first_name": "Asha",
///   "last_name": "Rao",
///   "role": "elder",            // optional: elder | caregiver
///   "phone_number": "+91..."    // optional
/// }
/// ```
///
/// Returns 201 with the created account.
pub async fn register_post(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<UserResponse> {
    local_tokens(&state)?;

    let email = normalize_email(&payload.email);
    let role = payload
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or("elder")
        .to_lowercase();

    let mut field_errors = HashMap::new();
    if !is_valid_email(&email) {
        field_errors.insert("email".to_string(), "Invalid email address".to_string());
    }
    if payload.password.is_empty() {
        field_errors.insert("password".to_string(), "Password must not be empty".to_string());
    }
    if !ROLES.contains(&role.as_str()) {
        field_errors.insert("role".to_string(), format!("Role must be one of: {}", ROLES.join(", ")));
    }
    if !field_errors.is_empty() {
        return Err(ApiError::unprocessable_entity("Validation failed", field_errors));
    }

    let users = state.users();
    if users.find_by_email(&email).await?.is_some() {
        return Err(ApiError::bad_request("Email already registered"));
    }

    let cost = state.config.auth.password_hash_cost;
    let password = payload.password;
    let hashed_password = tokio::task::spawn_blocking(move || hash_password(&password, cost))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal_server_error("Could not create account")
        })?
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal_server_error("Could not create account")
        })?;

    let user = users
        .create(NewUser {
            email,
            hashed_password,
            first_name: payload.first_name.trim().to_string(),
            last_name: payload.last_name.trim().to_string(),
            phone: payload.phone_number.filter(|p| !p.trim().is_empty()),
            role,
        })
        .await
        .map_err(|e| match e {
            // A concurrent registration won the race past the lookup above
            DatabaseError::UniqueViolation(_) => ApiError::bad_request("Email already registered"),
            other => other.into(),
        })?;

    tracing::info!("Registered user {}", user.id);
    Ok(ApiResponse::created(user.into()))
}
