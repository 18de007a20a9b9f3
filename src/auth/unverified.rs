use async_trait::async_trait;
use jsonwebtoken::{decode, DecodingKey, Validation};

use super::{AuthError, Claims, TokenVerifier};
use crate::config::{AuthConfig, AuthMode, ConfigError, Environment};

/// Returns whatever a structurally valid token claims, without checking its
/// signature or expiry. Local development only.
///
/// The only constructor refuses a configuration that names a remote identity
/// domain or runs in production.
#[derive(Debug)]
pub struct UnverifiedClaimsDecoder {
    _guard: (),
}

impl UnverifiedClaimsDecoder {
    pub fn for_config(config: &AuthConfig, environment: Environment) -> Result<Self, ConfigError> {
        if config.domain.is_some() {
            return Err(ConfigError::InsecureWithDomain);
        }
        if environment == Environment::Production {
            return Err(ConfigError::InsecureInProduction);
        }

        tracing::warn!("Token signatures are NOT verified (AUTH_MODE=insecure-dev)");
        Ok(Self { _guard: () })
    }
}

#[async_trait]
impl TokenVerifier for UnverifiedClaimsDecoder {
    async fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        let data = decode::<Claims>(token, &DecodingKey::from_secret(&[]), &validation)?;
        Ok(data.claims)
    }

    fn mode(&self) -> AuthMode {
        AuthMode::InsecureDev
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    fn decoder() -> UnverifiedClaimsDecoder {
        let auth = AuthConfig {
            mode: AuthMode::InsecureDev,
            ..AppConfig::development().auth
        };
        UnverifiedClaimsDecoder::for_config(&auth, Environment::Development).unwrap()
    }

    #[tokio::test]
    async fn test_accepts_any_signature() {
        let token = encode(
            &Header::default(),
            &json!({ "sub": "google-oauth2|123", "name": "Asha", "exp": 1 }),
            &EncodingKey::from_secret(b"whatever"),
        )
        .unwrap();

        let claims = decoder().verify(&token).await.unwrap();
        assert_eq!(claims.subject(), Some("google-oauth2|123"));
        assert_eq!(claims.str_claim("name"), Some("Asha"));
    }

    #[tokio::test]
    async fn test_rejects_malformed_token() {
        assert!(matches!(decoder().verify("abc.def").await, Err(AuthError::InvalidToken(_))));
        assert!(matches!(decoder().verify("").await, Err(AuthError::InvalidToken(_))));
    }

    #[tokio::test]
    async fn test_rejects_alg_none() {
        // {"alg":"none","typ":"JWT"} . {"sub":"dev"} . <empty signature>
        let token = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0.eyJzdWIiOiJkZXYifQ.";
        assert!(matches!(decoder().verify(token).await, Err(AuthError::InvalidToken(_))));
    }

    #[test]
    fn test_unconstructible_with_remote_domain() {
        let auth = AuthConfig {
            mode: AuthMode::InsecureDev,
            domain: Some("tenant.auth0.com".to_string()),
            ..AppConfig::development().auth
        };
        assert!(matches!(
            UnverifiedClaimsDecoder::for_config(&auth, Environment::Development),
            Err(ConfigError::InsecureWithDomain)
        ));
    }

    #[test]
    fn test_unconstructible_in_production() {
        let auth = AuthConfig {
            mode: AuthMode::InsecureDev,
            ..AppConfig::development().auth
        };
        assert!(matches!(
            UnverifiedClaimsDecoder::for_config(&auth, Environment::Production),
            Err(ConfigError::InsecureInProduction)
        ));
    }
}
