use async_trait::async_trait;
use std::sync::Arc;
use tracing::info;

use super::remote::RemoteVerifier;
use super::self_issued::SelfIssuedTokens;
use super::unverified::UnverifiedClaimsDecoder;
use super::{AuthError, Claims};
use crate::config::{AuthConfig, AuthMode, ConfigError, Environment};

/// Turns a bearer token into claims, or says why it can't.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError>;

    fn mode(&self) -> AuthMode;
}

/// The process's verification strategy plus, in self-issued mode, the token
/// issuer the account routes sign with.
#[derive(Clone)]
pub struct Authenticator {
    verifier: Arc<dyn TokenVerifier>,
    tokens: Option<Arc<SelfIssuedTokens>>,
}

impl Authenticator {
    pub fn from_config(config: &AuthConfig, environment: Environment) -> Result<Self, ConfigError> {
        config.validate(environment)?;

        let authenticator = match config.mode {
            AuthMode::SelfIssued => Self::self_issued(SelfIssuedTokens::from_config(config)),
            AuthMode::Remote => Self::with_verifier(Arc::new(RemoteVerifier::from_config(config)?)),
            AuthMode::InsecureDev => Self::with_verifier(Arc::new(
                UnverifiedClaimsDecoder::for_config(config, environment)?,
            )),
        };

        info!("Token verification mode: {}", config.mode);
        Ok(authenticator)
    }

    pub fn self_issued(tokens: SelfIssuedTokens) -> Self {
        let tokens = Arc::new(tokens);
        Self {
            verifier: tokens.clone(),
            tokens: Some(tokens),
        }
    }

    pub fn with_verifier(verifier: Arc<dyn TokenVerifier>) -> Self {
        Self {
            verifier,
            tokens: None,
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.verifier.mode()
    }

    /// Token issuer for login/refresh; `None` unless running self-issued.
    pub fn tokens(&self) -> Option<&SelfIssuedTokens> {
        self.tokens.as_deref()
    }

    /// `None` means no credential was presented.
    pub async fn authenticate(&self, bearer: Option<&str>) -> Result<Claims, AuthError> {
        let token = bearer.ok_or(AuthError::Unauthenticated)?;
        self.verifier.verify(token).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    #[tokio::test]
    async fn test_missing_credential_is_unauthenticated() {
        let auth = Authenticator::from_config(&AppConfig::development().auth, Environment::Development)
            .unwrap();
        assert!(matches!(
            auth.authenticate(None).await,
            Err(AuthError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_self_issued_mode_exposes_issuer() {
        let auth = Authenticator::from_config(&AppConfig::development().auth, Environment::Development)
            .unwrap();
        assert_eq!(auth.mode(), AuthMode::SelfIssued);

        let token = auth
            .tokens()
            .unwrap()
            .issue_access(Claims::new().with("sub", "u1"))
            .unwrap();
        let claims = auth.authenticate(Some(token.as_str())).await.unwrap();
        assert_eq!(claims.subject(), Some("u1"));
    }

    #[test]
    fn test_remote_mode_has_no_local_issuer() {
        let config = AuthConfig {
            mode: AuthMode::Remote,
            domain: Some("swaasth.eu.auth0.com".to_string()),
            audience: Some("https://api.swaasth.app".to_string()),
            ..AppConfig::development().auth
        };
        let auth = Authenticator::from_config(&config, Environment::Development).unwrap();

        assert_eq!(auth.mode(), AuthMode::Remote);
        assert!(auth.tokens().is_none());
    }

    #[test]
    fn test_insecure_mode_refused_when_domain_configured() {
        let config = AuthConfig {
            mode: AuthMode::InsecureDev,
            domain: Some("swaasth.eu.auth0.com".to_string()),
            ..AppConfig::development().auth
        };
        assert!(matches!(
            Authenticator::from_config(&config, Environment::Development),
            Err(ConfigError::InsecureWithDomain)
        ));
    }
}
