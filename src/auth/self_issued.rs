use async_trait::async_trait;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use super::claims::{Claims, TokenType, TOKEN_TYPE_CLAIM};
use super::{AuthError, TokenVerifier};
use crate::config::{AuthConfig, AuthMode};

/// Access and refresh tokens signed and verified with one shared secret.
pub struct SelfIssuedTokens {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl SelfIssuedTokens {
    pub fn new(secret: &[u8], algorithm: Algorithm, access_ttl: Duration, refresh_ttl: Duration) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm,
            access_ttl,
            refresh_ttl,
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            config.jwt_secret.as_bytes(),
            config.jwt_algorithm,
            Duration::minutes(config.access_token_expire_minutes),
            Duration::days(config.refresh_token_expire_days),
        )
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    /// Signs `claims` as an access token valid for the configured lifetime.
    pub fn issue_access(&self, claims: Claims) -> Result<String, AuthError> {
        self.issue_access_for(claims, self.access_ttl)
    }

    /// Signs `claims` as an access token valid for `ttl`. A negative `ttl` yields an already-expired token.
    pub fn issue_access_for(&self, claims: Claims, ttl: Duration) -> Result<String, AuthError> {
        self.sign(claims, ttl, TokenType::Access)
    }

    pub fn issue_refresh(&self, claims: Claims) -> Result<String, AuthError> {
        self.sign(claims, self.refresh_ttl, TokenType::Refresh)
    }

    fn sign(&self, mut claims: Claims, ttl: Duration, token_type: TokenType) -> Result<String, AuthError> {
        let now = Utc::now();
        claims.insert("exp", (now + ttl).timestamp());
        claims.insert("iat", now.timestamp());
        claims.insert(TOKEN_TYPE_CLAIM, token_type.as_str());

        encode(&Header::new(self.algorithm), &claims, &self.encoding)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Checks signature and `exp` (zero leeway). Accepts either token type.
    pub fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;
        validation.validate_aud = false;

        let data = decode::<Claims>(token, &self.decoding, &validation)?;
        Ok(data.claims)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if !claims.is_refresh() {
            return Err(AuthError::invalid_token("not a refresh token"));
        }
        Ok(claims)
    }
}

#[async_trait]
impl TokenVerifier for SelfIssuedTokens {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.is_refresh() {
            return Err(AuthError::invalid_token("refresh token used as access credential"));
        }
        Ok(claims)
    }

    fn mode(&self) -> AuthMode {
        AuthMode::SelfIssued
    }
}
