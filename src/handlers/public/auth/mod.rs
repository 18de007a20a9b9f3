// handlers/public/auth/mod.rs - Account handlers for self-issued tokens
//
// Register, login, refresh and logout. Register/login/refresh are only routed
// when the self-issued strategy is active, since only it accepts what they sign.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::auth::{AuthError, Claims, SelfIssuedTokens};
use crate::database::User;
use crate::error::ApiError;
use crate::state::AppState;

pub mod login;    // POST /api/v1/auth/login
pub mod logout;   // POST /api/v1/auth/logout
pub mod refresh;  // POST /api/v1/auth/refresh
pub mod register; // POST /api/v1/auth/register

pub use login::login_post;
pub use logout::logout_post;
pub use refresh::refresh_post;
pub use register::register_post;

/// Account as returned to clients; never includes the password hash
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_caregiver: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            first_name: user.first_name,
            last_name: user.last_name,
            name: user.name,
            phone_number: user.phone,
            role: user.role,
            is_active: user.is_active,
            is_verified: user.is_verified,
            is_caregiver: user.is_caregiver,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

/// Signs an access/refresh pair for `user`.
///
/// Access claims: `sub` (email), `user_id`, `role`. Refresh claims: `sub`, `user_id`.
pub fn issue_token_pair(tokens: &SelfIssuedTokens, user: &User) -> Result<TokenResponse, AuthError> {
    let subject = user.email.clone().unwrap_or_else(|| user.id.to_string());

    let access_token = tokens.issue_access(
        Claims::new()
            .with("sub", subject.clone())
            .with("user_id", user.id)
            .with("role", user.role.clone()),
    )?;
    let refresh_token = tokens.issue_refresh(Claims::new().with("sub", subject).with("user_id", user.id))?;

    Ok(TokenResponse {
        access_token,
        refresh_token,
        token_type: "bearer",
        expires_in: tokens.access_ttl().num_seconds(),
    })
}

/// The local token issuer, or 404 when this process verifies someone else's tokens.
pub(crate) fn local_tokens(state: &AppState) -> Result<&SelfIssuedTokens, ApiError> {
    state
        .auth
        .tokens()
        .ok_or_else(|| ApiError::not_found("Account endpoints are not enabled"))
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Shape check only: one `@`, non-empty local part, dotted domain, no whitespace.
pub(crate) fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
