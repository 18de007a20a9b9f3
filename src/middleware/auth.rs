use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};

use crate::auth::Claims;
use crate::error::ApiError;
use crate::state::AppState;

/// Verified caller identity, inserted into request extensions
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl AuthUser {
    pub fn subject(&self) -> Option<&str> {
        self.claims.subject()
    }
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self { claims }
    }
}

/// Bearer authentication for protected routes.
///
/// Runs the configured verification strategy over the `Authorization` header and
/// rejects the request with the mapped `ApiError` when it fails.
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(request.headers());
    let claims = state.auth.authenticate(token).await?;

    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Token from an `Authorization: Bearer <token>` header.
///
/// A missing header, another scheme, or an empty token all count as no credential.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;

    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Authenticator, SelfIssuedTokens};
    use crate::config::{AppConfig, DatabaseConfig};
    use crate::database::DatabaseManager;
    use axum::{
        body::Body,
        http::{self, HeaderValue, StatusCode},
        routing::get,
        Extension, Router,
    };
    use chrono::Duration;
    use jsonwebtoken::Algorithm;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc.def.ghi")), Some("abc.def.ghi"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic dXNlcjpwYXNz")), None);
        assert_eq!(bearer_token(&headers_with("Bearer   ")), None);
        assert_eq!(bearer_token(&headers_with("Bearer")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    async fn test_state(tokens: SelfIssuedTokens) -> AppState {
        let database = DatabaseManager::connect(&DatabaseConfig {
            url: "sqlite::memory:".to_string(),
            max_connections: 1,
            connection_timeout: 5,
        })
        .await
        .unwrap();

        AppState {
            config: Arc::new(AppConfig::development()),
            auth: Authenticator::self_issued(tokens),
            database,
        }
    }

    fn tokens() -> SelfIssuedTokens {
        SelfIssuedTokens::new(
            b"middleware-test-secret",
            Algorithm::HS256,
            Duration::minutes(1),
            Duration::hours(1),
        )
    }

    async fn subject(Extension(user): Extension<AuthUser>) -> String {
        user.subject().unwrap_or("anonymous").to_string()
    }

    fn router(state: AppState) -> Router {
        Router::new()
            .route("/whoami", get(subject))
            .route_layer(axum::middleware::from_fn_with_state(
                state.clone(),
                jwt_auth_middleware,
            ))
            .with_state(state)
    }

    #[tokio::test]
    async fn test_missing_header_is_rejected() {
        let app = router(test_state(tokens()).await);

        let response = app
            .oneshot(http::Request::get("/whoami").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers().get(header::WWW_AUTHENTICATE).unwrap(), "Bearer");
    }

    #[tokio::test]
    async fn test_verified_claims_reach_handler() {
        let tokens = tokens();
        let token = tokens.issue_access(Claims::new().with("sub", "u1")).unwrap();
        let app = router(test_state(tokens).await);

        let response = app
            .oneshot(
                http::Request::get("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], b"u1");
    }

    #[tokio::test]
    async fn test_forged_token_is_rejected() {
        let forged = SelfIssuedTokens::new(
            b"some-other-secret",
            Algorithm::HS256,
            Duration::minutes(1),
            Duration::hours(1),
        )
        .issue_access(Claims::new().with("sub", "u1"))
        .unwrap();
        let app = router(test_state(tokens()).await);

        let response = app
            .oneshot(
                http::Request::get("/whoami")
                    .header(header::AUTHORIZATION, format!("Bearer {}", forged))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
