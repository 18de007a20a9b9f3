use axum::extract::{Extension, State};
use serde::Serialize;
use serde_json::{json, Value};

use crate::database::User;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub sub: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: String,
    pub is_caregiver: bool,
}

impl From<User> for MeResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            sub: user.sub,
            name: user.name,
            email: user.email,
            role: user.role,
            is_caregiver: user.is_caregiver,
        }
    }
}

/// GET /api/me - The account behind the presented token
///
/// Self-issued tokens name their account through `user_id`. Identity-provider
/// tokens are matched on `sub`, and the account is created on first sight
/// from the `name` / `email` claims. Claims without a subject are anonymous.
pub async fn me_get(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> ApiResult<Value> {
    let claims = &auth_user.claims;
    let users = state.users();

    let user = match (claims.user_id(), claims.subject()) {
        (Some(id), _) => users.get_404(id).await?,
        (None, Some(sub)) => {
            users
                .upsert_by_sub(sub, claims.str_claim("name"), claims.str_claim("email"))
                .await?
        }
        (None, None) => return Ok(ApiResponse::success(json!({ "anonymous": true }))),
    };

    Ok(ApiResponse::success(json!(MeResponse::from(user))))
}
