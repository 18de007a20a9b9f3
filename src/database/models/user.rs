use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// One account. Local accounts carry `email` + `hashed_password`; accounts
/// created from identity-provider claims carry `sub`.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: i64,
    pub sub: Option<String>,
    pub email: Option<String>,
    #[serde(skip_serializing)]
    pub hashed_password: Option<String>,
    pub name: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub phone: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub is_verified: bool,
    pub is_caregiver: bool,
    pub created_at: DateTime<Utc>,
}

/// Insert payload for a locally registered account
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub hashed_password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub role: String,
}
