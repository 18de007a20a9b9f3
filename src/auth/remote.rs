use async_trait::async_trait;
use jsonwebtoken::{decode, decode_header, Algorithm, Validation};
use std::sync::Arc;
use std::time::Duration;

use super::jwks::{HttpKeySetSource, KeySetCache};
use super::{AuthError, Claims, TokenVerifier};
use crate::config::{AuthConfig, AuthMode, ConfigError};

/// Verifies tokens issued by an external identity provider against its
/// published RSA key set.
pub struct RemoteVerifier {
    audience: String,
    issuer: String,
    algorithms: Vec<Algorithm>,
    leeway: u64,
    key_set: Arc<KeySetCache>,
}

impl RemoteVerifier {
    pub fn new(
        audience: impl Into<String>,
        issuer: impl Into<String>,
        algorithms: Vec<Algorithm>,
        key_set: Arc<KeySetCache>,
    ) -> Self {
        Self {
            audience: audience.into(),
            issuer: issuer.into(),
            algorithms,
            leeway: 0,
            key_set,
        }
    }

    pub fn with_leeway(mut self, leeway_secs: u64) -> Self {
        self.leeway = leeway_secs;
        self
    }

    pub fn from_config(config: &AuthConfig) -> Result<Self, ConfigError> {
        let audience = config
            .audience
            .clone()
            .ok_or(ConfigError::Missing("AUTH0_AUDIENCE"))?;
        let issuer = config.issuer().ok_or(ConfigError::Missing("AUTH0_DOMAIN"))?;

        let source = HttpKeySetSource::new(
            config.key_set_url()?,
            Duration::from_secs(config.jwks_timeout_secs),
        )
        .map_err(|e| ConfigError::Invalid {
            name: "AUTH_JWKS_URL",
            reason: e.to_string(),
        })?;
        let key_set = KeySetCache::new(
            Arc::new(source),
            Duration::from_secs(config.jwks_cache_ttl_secs),
        );

        Ok(Self::new(audience, issuer, config.algorithms.clone(), Arc::new(key_set))
            .with_leeway(config.leeway_secs))
    }

    pub fn key_set(&self) -> &KeySetCache {
        &self.key_set
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::RS256);
        validation.algorithms = self.algorithms.clone();
        validation.leeway = self.leeway;
        validation.set_audience(&[&self.audience]);
        validation.set_issuer(&[&self.issuer]);
        validation
    }
}

#[async_trait]
impl TokenVerifier for RemoteVerifier {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let header = decode_header(token)
            .map_err(|e| AuthError::invalid_token(format!("malformed header: {e}")))?;

        let keys = self.key_set.get().await?;

        let jwk = header
            .kid
            .as_deref()
            .and_then(|kid| keys.find(kid))
            .ok_or(AuthError::InvalidTokenHeader)?;

        let key = jwk.decoding_key()?;
        let data = decode::<Claims>(token, &key, &self.validation())?;
        Ok(data.claims)
    }

    fn mode(&self) -> AuthMode {
        AuthMode::Remote
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwks::{JwkSet, KeySetSource};
    use chrono::Utc;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    const PRIMARY_PEM: &str = include_str!("../../tests/fixtures/primary_rsa.pem");
    const ROGUE_PEM: &str = include_str!("../../tests/fixtures/rogue_rsa.pem");
    const JWKS: &str = include_str!("../../tests/fixtures/jwks.json");
    const KID: &str = "primary-2026";
    const AUDIENCE: &str = "https://api.swaasth.app";
    const ISSUER: &str = "https://swaasth.eu.auth0.com/";

    struct StaticKeySet(JwkSet);

    #[async_trait]
    impl KeySetSource for StaticKeySet {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Ok(self.0.clone())
        }

        fn describe(&self) -> String {
            "static".to_string()
        }
    }

    struct Unreachable;

    #[async_trait]
    impl KeySetSource for Unreachable {
        async fn fetch(&self) -> Result<JwkSet, AuthError> {
            Err(AuthError::key_set_unavailable("connection timed out"))
        }

        fn describe(&self) -> String {
            "unreachable".to_string()
        }
    }

    fn verifier_with(source: Arc<dyn KeySetSource>) -> RemoteVerifier {
        let cache = KeySetCache::new(source, Duration::from_secs(60));
        RemoteVerifier::new(AUDIENCE, ISSUER, vec![Algorithm::RS256], Arc::new(cache))
    }

    fn verifier() -> RemoteVerifier {
        let set: JwkSet = serde_json::from_str(JWKS).unwrap();
        verifier_with(Arc::new(StaticKeySet(set)))
    }

    fn claims(overrides: Value) -> Value {
        let mut claims = json!({
            "sub": "auth0|elder-1",
            "aud": AUDIENCE,
            "iss": ISSUER,
            "exp": Utc::now().timestamp() + 600,
            "name": "Kamala",
        });
        if let (Some(base), Some(extra)) = (claims.as_object_mut(), overrides.as_object()) {
            for (k, v) in extra {
                base.insert(k.clone(), v.clone());
            }
        }
        claims
    }

    fn sign(pem: &str, kid: Option<&str>, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = kid.map(str::to_string);
        encode(&header, claims, &EncodingKey::from_rsa_pem(pem.as_bytes()).unwrap()).unwrap()
    }

    #[tokio::test]
    async fn test_valid_token_returns_claims() {
        let token = sign(PRIMARY_PEM, Some(KID), &claims(json!({})));
        let claims = verifier().verify(&token).await.unwrap();

        assert_eq!(claims.subject(), Some("auth0|elder-1"));
        assert_eq!(claims.str_claim("name"), Some("Kamala"));
    }

    #[tokio::test]
    async fn test_unknown_kid_is_invalid_header() {
        let token = sign(PRIMARY_PEM, Some("abc"), &claims(json!({})));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidTokenHeader)
        ));
    }

    #[tokio::test]
    async fn test_missing_kid_is_invalid_header() {
        let token = sign(PRIMARY_PEM, None, &claims(json!({})));
        assert!(matches!(
            verifier().verify(&token).await,
            Err(AuthError::InvalidTokenHeader)
        ));
    }

    #[tokio::test]
    async fn test_wrong_audience_is_invalid() {
        let token = sign(PRIMARY_PEM, Some(KID), &claims(json!({ "aud": "https://other.app" })));
        assert!(matches!(verifier().verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_wrong_issuer_is_invalid() {
        let token = sign(
            PRIMARY_PEM,
            Some(KID),
            &claims(json!({ "iss": "https://evil.example.com/" })),
        );
        assert!(matches!(verifier().verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_expired_is_invalid() {
        let token = sign(
            PRIMARY_PEM,
            Some(KID),
            &claims(json!({ "exp": Utc::now().timestamp() - 30 })),
        );
        assert!(matches!(verifier().verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_signature_from_other_key_is_invalid() {
        let token = sign(ROGUE_PEM, Some(KID), &claims(json!({})));
        assert!(matches!(verifier().verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_hmac_token_is_invalid() {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KID.to_string());
        let token = encode(&header, &claims(json!({})), &EncodingKey::from_secret(b"guess")).unwrap();

        assert!(matches!(verifier().verify(&token).await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_malformed_token_is_invalid() {
        assert!(matches!(verifier().verify("nope").await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_unreachable_key_set_is_not_an_invalid_token() {
        let token = sign(PRIMARY_PEM, Some(KID), &claims(json!({})));
        let verifier = verifier_with(Arc::new(Unreachable));

        assert!(matches!(
            verifier.verify(&token).await,
            Err(AuthError::KeySetUnavailable(_))
        ));
    }
}
