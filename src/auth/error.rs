use thiserror::Error;

/// Why a bearer credential was not turned into claims.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No credential was presented at all.
    #[error("Not authenticated")]
    Unauthenticated,

    /// Credential present but malformed, mis-signed, expired, or for another audience/issuer.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The token's `kid` is not in the identity provider's key set.
    #[error("Invalid token header")]
    InvalidTokenHeader,

    /// The key set could not be fetched. An availability problem, not a bad credential.
    #[error("Signing key set unavailable: {0}")]
    KeySetUnavailable(String),

    #[error("Token signing failed: {0}")]
    Signing(String),
}

impl AuthError {
    pub fn invalid_token(reason: impl Into<String>) -> Self {
        AuthError::InvalidToken(reason.into())
    }

    pub fn key_set_unavailable(reason: impl Into<String>) -> Self {
        AuthError::KeySetUnavailable(reason.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AuthError::InvalidToken(err.to_string())
    }
}
