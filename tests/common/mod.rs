#![allow(dead_code)]

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use axum::{routing::get, Json, Router};
use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use reqwest::StatusCode;
use serde_json::Value;

use swaasth_api::config::{AppConfig, AuthConfig, AuthMode};
use swaasth_api::database::DatabaseManager;
use swaasth_api::{app, AppState};

pub const PRIMARY_PEM: &[u8] = include_bytes!("../fixtures/primary_rsa.pem");
pub const ROGUE_PEM: &[u8] = include_bytes!("../fixtures/rogue_rsa.pem");
pub const JWKS: &str = include_str!("../fixtures/jwks.json");
pub const KID: &str = "primary-2026";

pub const IDP_DOMAIN: &str = "swaasth.test.local";
pub const IDP_ISSUER: &str = "https://swaasth.test.local/";
pub const AUDIENCE: &str = "https://api.swaasth.test";

/// One app instance on its own port, torn down with the test runtime
pub struct TestServer {
    pub port: u16,
    pub base_url: String,
    pub client: reqwest::Client,
}

impl TestServer {
    pub async fn start(config: AppConfig) -> Result<Self> {
        let database = DatabaseManager::connect(&config.database)
            .await
            .context("failed to open test database")?;
        let state = AppState::new(config, database).context("invalid test configuration")?;

        let (port, base_url) = serve(app(state)).await?;
        let server = Self {
            port,
            base_url,
            client: reqwest::Client::new(),
        };
        server.wait_ready(Duration::from_secs(10)).await?;
        Ok(server)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            if let Ok(resp) = self.client.get(self.url("/health")).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }

    pub async fn get_json(&self, path: &str, token: Option<&str>) -> Result<(StatusCode, Value)> {
        let mut request = self.client.get(self.url(path));
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        let resp = request.send().await?;
        Ok((resp.status(), resp.json().await?))
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> Result<(StatusCode, Value)> {
        let resp = self.client.post(self.url(path)).json(body).send().await?;
        Ok((resp.status(), resp.json().await?))
    }
}

async fn serve(router: Router) -> Result<(u16, String)> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    Ok((port, format!("http://127.0.0.1:{}", port)))
}

fn base_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.database.url = "sqlite::memory:".to_string();
    config.auth.password_hash_cost = 4;
    config
}

pub fn self_issued_config() -> AppConfig {
    let mut config = base_config();
    config.auth.mode = AuthMode::SelfIssued;
    config.auth.jwt_secret = "integration-test-secret".to_string();
    config
}

pub fn remote_config(jwks_url: &str) -> AppConfig {
    let mut config = base_config();
    config.auth = AuthConfig {
        mode: AuthMode::Remote,
        domain: Some(IDP_DOMAIN.to_string()),
        audience: Some(AUDIENCE.to_string()),
        jwks_url: Some(jwks_url.to_string()),
        jwks_timeout_secs: 2,
        ..config.auth
    };
    config
}

/// Serves the fixture key set at `/.well-known/jwks.json`; returns its URL.
pub async fn spawn_jwks() -> Result<String> {
    let keys: Value = serde_json::from_str(JWKS)?;
    let router = Router::new().route(
        "/.well-known/jwks.json",
        get(move || {
            let keys = keys.clone();
            async move { Json(keys) }
        }),
    );
    let (_, base_url) = serve(router).await?;
    Ok(format!("{}/.well-known/jwks.json", base_url))
}

/// A URL where nothing is listening.
pub fn dead_jwks_url() -> Result<String> {
    let port = portpicker::pick_unused_port().context("failed to pick free port")?;
    Ok(format!("http://127.0.0.1:{}/.well-known/jwks.json", port))
}

/// An identity-provider style RS256 token with `claims` plus valid iss/aud/exp.
pub fn idp_token(pem: &[u8], kid: Option<&str>, mut claims: Value) -> Result<String> {
    let now = Utc::now().timestamp();
    claims["iss"] = IDP_ISSUER.into();
    claims["aud"] = AUDIENCE.into();
    claims["iat"] = now.into();
    if claims.get("exp").is_none() {
        claims["exp"] = (now + 600).into();
    }

    let mut header = Header::new(Algorithm::RS256);
    header.kid = kid.map(str::to_string);
    Ok(encode(&header, &claims, &EncodingKey::from_rsa_pem(pem)?)?)
}
