use axum::{
    http::HeaderValue,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod auth;
pub mod cli;
pub mod config;
pub mod database;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

pub use state::AppState;

/// The full HTTP surface over `state`.
pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .merge(public_routes())
        .merge(logout_routes())
        // Protected
        .merge(protected_routes(state.clone()));

    // Tokens minted here are only accepted by the self-issued strategy
    if state.auth.tokens().is_some() {
        router = router.merge(account_routes());
    }

    router
        .layer(cors_layer(&state.config.server.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn public_routes() -> Router<AppState> {
    use handlers::public;

    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/api/health", get(public::health))
}

fn logout_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new().route("/api/v1/auth/logout", post(auth::logout_post))
}

fn account_routes() -> Router<AppState> {
    use handlers::public::auth;

    Router::new()
        .route("/api/v1/auth/register", post(auth::register_post))
        .route("/api/v1/auth/login", post(auth::login_post))
        .route("/api/v1/auth/refresh", post(auth::refresh_post))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use handlers::protected;

    Router::new()
        .route("/api/me", get(protected::me_get))
        .route("/api/v1/auth/me", get(protected::me_get))
        .route_layer(from_fn_with_state(state, middleware::jwt_auth_middleware))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}
