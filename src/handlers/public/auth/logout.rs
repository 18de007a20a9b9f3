// handlers/public/auth/logout.rs - POST /api/v1/auth/logout handler

use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult};

/// POST /api/v1/auth/logout
///
/// Tokens are stateless, so there is nothing to revoke server-side; clients
/// discard their pair.
pub async fn logout_post() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({ "message": "Successfully logged out" })))
}
