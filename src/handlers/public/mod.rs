// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service banner, health check and the account endpoints that hand out tokens.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::state::AppState;

pub mod auth;

/// GET / - Service banner
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    // Account routes other than logout exist only when we issue our own tokens
    let auth = if state.auth.tokens().is_some() {
        "/api/v1/auth/register, /api/v1/auth/login, /api/v1/auth/refresh, /api/v1/auth/logout (public)"
    } else {
        "/api/v1/auth/logout (public)"
    };

    Json(json!({
        "success": true,
        "data": {
            "name": "Swaasth API",
            "version": env!("CARGO_PKG_VERSION"),
            "auth_mode": state.auth.mode().as_str(),
            "endpoints": {
                "health": "/health, /api/health (public)",
                "auth": auth,
                "me": "/api/me, /api/v1/auth/me (protected)",
            }
        }
    }))
}

/// GET /health - Liveness plus a database round trip
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    match state.database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok",
                    "auth_mode": state.auth.mode().as_str(),
                }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": {
                        "status": "degraded",
                        "timestamp": now,
                    }
                })),
            )
        }
    }
}
