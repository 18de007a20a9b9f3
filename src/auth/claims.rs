use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Claim key that separates access tokens from refresh tokens.
pub const TOKEN_TYPE_CLAIM: &str = "type";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Decoded token payload. Built per request from a token that passed the
/// active verification strategy and never stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Builder-style insert, e.g. `Claims::new().with("sub", "u1")`.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn str_claim(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// `sub`, if present and non-empty.
    pub fn subject(&self) -> Option<&str> {
        self.str_claim("sub").filter(|s| !s.is_empty())
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    /// Local account id stamped into self-issued tokens.
    pub fn user_id(&self) -> Option<i64> {
        self.0.get("user_id").and_then(Value::as_i64)
    }

    pub fn token_type(&self) -> Option<TokenType> {
        match self.str_claim(TOKEN_TYPE_CLAIM) {
            Some("access") => Some(TokenType::Access),
            Some("refresh") => Some(TokenType::Refresh),
            _ => None,
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type() == Some(TokenType::Refresh)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

impl From<Map<String, Value>> for Claims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}
