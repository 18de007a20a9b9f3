use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};
use url::Url;

use super::AuthError;

/// One entry of a published key set. Only RSA signing keys are usable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    pub kty: String,
    #[serde(default)]
    pub kid: Option<String>,
    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,
}

impl Jwk {
    /// RSA public key built from the `n` / `e` components.
    pub fn decoding_key(&self) -> Result<DecodingKey, AuthError> {
        if self.kty != "RSA" {
            return Err(AuthError::invalid_token(format!(
                "unsupported key type '{}'",
                self.kty
            )));
        }

        match (&self.n, &self.e) {
            (Some(n), Some(e)) => Ok(DecodingKey::from_rsa_components(n, e)?),
            _ => Err(AuthError::invalid_token("RSA key is missing its modulus or exponent")),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    #[serde(default)]
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    pub fn find(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|key| key.kid.as_deref() == Some(kid))
    }

    pub fn key_ids(&self) -> impl Iterator<Item = &str> {
        self.keys.iter().filter_map(|key| key.kid.as_deref())
    }
}

/// Where a key set comes from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, AuthError>;

    /// Human readable origin for logs.
    fn describe(&self) -> String;
}

/// Fetches `{ "keys": [...] }` over HTTP(S).
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySetSource {
    pub fn new(url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, AuthError> {
        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| AuthError::key_set_unavailable(format!("GET {}: {}", self.url, e)))?;

        response
            .json::<JwkSet>()
            .await
            .map_err(|e| AuthError::key_set_unavailable(format!("decoding {}: {}", self.url, e)))
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

struct CachedKeySet {
    keys: Arc<JwkSet>,
    fetched_at: Instant,
}

/// Outcome of the most recent fetch attempt, guarded by the refresh lock.
#[derive(Default)]
struct LastAttempt {
    generation: u64,
    failure: Option<String>,
}

/// Process-wide key set cache.
///
/// - Entries older than `ttl` are refetched on next use.
/// - Concurrent callers that find the cache cold or stale share one fetch,
///   and share its error when it fails.
/// - A failed fetch is not stored, so the next call after it retries.
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    ttl: Duration,
    current: RwLock<Option<CachedKeySet>>,
    refresh: Mutex<LastAttempt>,
    attempts: AtomicU64,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>, ttl: Duration) -> Self {
        Self {
            source,
            ttl,
            current: RwLock::new(None),
            refresh: Mutex::new(LastAttempt::default()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn source(&self) -> &dyn KeySetSource {
        self.source.as_ref()
    }

    pub async fn get(&self) -> Result<Arc<JwkSet>, AuthError> {
        // Fast path: try read lock
        if let Some(keys) = self.fresh().await {
            debug!("Key set cache hit");
            return Ok(keys);
        }

        let seen = self.attempts.load(Ordering::Acquire);
        let mut last = self.refresh.lock().await;

        // Whoever held the refresh lock before us may already have filled the cache
        if let Some(keys) = self.fresh().await {
            return Ok(keys);
        }

        // ...or failed while we were queued; their error is ours too
        if last.generation > seen {
            if let Some(reason) = &last.failure {
                return Err(AuthError::key_set_unavailable(reason.clone()));
            }
        }

        let outcome = self.source.fetch().await;
        last.generation = self.attempts.fetch_add(1, Ordering::AcqRel) + 1;

        let keys = match outcome {
            Ok(keys) => {
                last.failure = None;
                Arc::new(keys)
            }
            Err(e) => {
                warn!("Key set fetch from {} failed: {}", self.source.describe(), e);
                last.failure = Some(match &e {
                    AuthError::KeySetUnavailable(reason) => reason.clone(),
                    other => other.to_string(),
                });
                return Err(e);
            }
        };

        info!(
            "Fetched signing key set from {} ({} keys)",
            self.source.describe(),
            keys.keys.len()
        );

        *self.current.write().await = Some(CachedKeySet {
            keys: keys.clone(),
            fetched_at: Instant::now(),
        });

        Ok(keys)
    }

    async fn fresh(&self) -> Option<Arc<JwkSet>> {
        let current = self.current.read().await;
        current
            .as_ref()
            .filter(|cached| cached.fetched_at.elapsed() < self.ttl)
            .map(|cached| cached.keys.clone())
    }
}
