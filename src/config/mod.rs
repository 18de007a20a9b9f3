use jsonwebtoken::Algorithm;
use once_cell::sync::Lazy;
use std::env;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use url::Url;

/// Shared secret shipped in sample `.env` files. Accepted everywhere except production.
pub const PLACEHOLDER_JWT_SECRET: &str = "your-super-secret-jwt-key-change-this-in-production";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },

    #[error("AUTH_MODE=insecure-dev cannot be combined with AUTH0_DOMAIN")]
    InsecureWithDomain,

    #[error("AUTH_MODE=insecure-dev is not allowed in production")]
    InsecureInProduction,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout: u64,
}

/// Which token verification strategy the process runs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Tokens minted by this service with the shared secret.
    SelfIssued,
    /// Tokens issued by the identity provider at `AUTH0_DOMAIN`, checked against its key set.
    Remote,
    /// Claims are decoded without any signature check. Local development only.
    InsecureDev,
}

impl AuthMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "self-issued" | "self_issued" | "local" => Some(AuthMode::SelfIssued),
            "remote" | "auth0" | "jwks" => Some(AuthMode::Remote),
            "insecure-dev" | "insecure_dev" | "unverified" => Some(AuthMode::InsecureDev),
            _ => None,
        }
    }

    /// An explicit mode wins; otherwise a configured domain selects `Remote`.
    /// `InsecureDev` is never picked implicitly.
    pub fn resolve(explicit: Option<AuthMode>, domain: Option<&str>) -> Self {
        match (explicit, domain) {
            (Some(mode), _) => mode,
            (None, Some(_)) => AuthMode::Remote,
            (None, None) => AuthMode::SelfIssued,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMode::SelfIssued => "self-issued",
            AuthMode::Remote => "remote",
            AuthMode::InsecureDev => "insecure-dev",
        }
    }
}

impl fmt::Display for AuthMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone)]
pub struct AuthConfig {
    pub mode: AuthMode,

    // Remote identity provider
    pub domain: Option<String>,
    pub audience: Option<String>,
    pub algorithms: Vec<Algorithm>,
    pub jwks_url: Option<String>,
    pub jwks_cache_ttl_secs: u64,
    pub jwks_timeout_secs: u64,
    pub leeway_secs: u64,

    // Self-issued tokens
    pub jwt_secret: String,
    pub jwt_algorithm: Algorithm,
    pub access_token_expire_minutes: i64,
    pub refresh_token_expire_days: i64,

    // Local account passwords
    pub password_hash_cost: u32,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("domain", &self.domain)
            .field("audience", &self.audience)
            .field("algorithms", &self.algorithms)
            .field("jwks_url", &self.jwks_url)
            .field("jwks_cache_ttl_secs", &self.jwks_cache_ttl_secs)
            .field("jwks_timeout_secs", &self.jwks_timeout_secs)
            .field("leeway_secs", &self.leeway_secs)
            .field("jwt_secret", &"<redacted>")
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("access_token_expire_minutes", &self.access_token_expire_minutes)
            .field("refresh_token_expire_days", &self.refresh_token_expire_days)
            .field("password_hash_cost", &self.password_hash_cost)
            .finish()
    }
}

impl AuthConfig {
    /// Expected `iss` claim for remote tokens, e.g. `https://tenant.auth0.com/`.
    pub fn issuer(&self) -> Option<String> {
        self.domain
            .as_deref()
            .map(|domain| format!("https://{}/", domain.trim_end_matches('/')))
    }

    /// Key set location: `AUTH_JWKS_URL` when given, else the provider's well-known path.
    pub fn key_set_url(&self) -> Result<Url, ConfigError> {
        let raw = match (&self.jwks_url, &self.domain) {
            (Some(url), _) => url.clone(),
            (None, Some(domain)) => format!(
                "https://{}/.well-known/jwks.json",
                domain.trim_end_matches('/')
            ),
            (None, None) => return Err(ConfigError::Missing("AUTH0_DOMAIN")),
        };

        Url::parse(&raw).map_err(|e| ConfigError::Invalid {
            name: "AUTH_JWKS_URL",
            reason: e.to_string(),
        })
    }

    pub fn validate(&self, environment: Environment) -> Result<(), ConfigError> {
        match self.mode {
            AuthMode::Remote => {
                if self.domain.is_none() {
                    return Err(ConfigError::Missing("AUTH0_DOMAIN"));
                }
                if self.audience.is_none() {
                    return Err(ConfigError::Missing("AUTH0_AUDIENCE"));
                }
                if self.algorithms.is_empty() {
                    return Err(ConfigError::Missing("AUTH_ALGORITHMS"));
                }
                if let Some(alg) = self.algorithms.iter().find(|alg| !is_rsa_family(**alg)) {
                    return Err(ConfigError::Invalid {
                        name: "AUTH_ALGORITHMS",
                        reason: format!("{alg:?} cannot be verified with an RSA key set"),
                    });
                }
                self.key_set_url()?;
            }
            AuthMode::SelfIssued => {
                if self.jwt_secret.is_empty() {
                    return Err(ConfigError::Missing("JWT_SECRET_KEY"));
                }
                if !is_hmac_family(self.jwt_algorithm) {
                    return Err(ConfigError::Invalid {
                        name: "JWT_ALGORITHM",
                        reason: format!("{:?} is not a shared-secret algorithm", self.jwt_algorithm),
                    });
                }
                if environment == Environment::Production && self.jwt_secret == PLACEHOLDER_JWT_SECRET {
                    return Err(ConfigError::Invalid {
                        name: "JWT_SECRET_KEY",
                        reason: "the sample secret must be replaced in production".to_string(),
                    });
                }
            }
            AuthMode::InsecureDev => {
                if self.domain.is_some() {
                    return Err(ConfigError::InsecureWithDomain);
                }
                if environment == Environment::Production {
                    return Err(ConfigError::InsecureInProduction);
                }
            }
        }

        if self.access_token_expire_minutes <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_EXPIRE_MINUTES",
                reason: "must be positive".to_string(),
            });
        }
        if !(4..=31).contains(&self.password_hash_cost) {
            return Err(ConfigError::Invalid {
                name: "PASSWORD_HASH_COST",
                reason: "bcrypt cost must be between 4 and 31".to_string(),
            });
        }
        if self.refresh_token_expire_days <= 0 {
            return Err(ConfigError::Invalid {
                name: "JWT_REFRESH_EXPIRE_DAYS",
                reason: "must be positive".to_string(),
            });
        }

        Ok(())
    }
}

pub fn is_rsa_family(alg: Algorithm) -> bool {
    matches!(
        alg,
        Algorithm::RS256
            | Algorithm::RS384
            | Algorithm::RS512
            | Algorithm::PS256
            | Algorithm::PS384
            | Algorithm::PS512
    )
}

pub fn is_hmac_family(alg: Algorithm) -> bool {
    matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Parses a comma separated list such as `RS256,RS512`.
pub fn parse_algorithms(value: &str) -> Result<Vec<Algorithm>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            Algorithm::from_str(s).map_err(|_| ConfigError::Invalid {
                name: "AUTH_ALGORITHMS",
                reason: format!("unknown algorithm '{s}'"),
            })
        })
        .collect()
}

/// Reads a variable, treating an empty value the same as an unset one.
fn env_non_empty(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.auth.validate(self.environment)
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Some(v) = env_non_empty("SWAASTH_API_PORT").or_else(|| env_non_empty("PORT")) {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = env_non_empty("CORS_ALLOWED_ORIGINS") {
            self.server.cors_origins = v.split(',').map(|s| s.trim().to_string()).collect();
        }

        // Database overrides
        if let Some(v) = env_non_empty("DATABASE_URL") {
            self.database.url = v;
        }
        if let Some(v) = env_non_empty("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = env_non_empty("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }

        // Remote identity provider overrides
        self.auth.domain = env_non_empty("AUTH0_DOMAIN");
        self.auth.audience = env_non_empty("AUTH0_AUDIENCE");
        self.auth.jwks_url = env_non_empty("AUTH_JWKS_URL");
        if let Some(v) = env_non_empty("AUTH_ALGORITHMS") {
            match parse_algorithms(&v) {
                Ok(algorithms) => self.auth.algorithms = algorithms,
                Err(e) => tracing::warn!("Ignoring AUTH_ALGORITHMS: {}", e),
            }
        }
        if let Some(v) = env_non_empty("AUTH_JWKS_CACHE_TTL_SECS") {
            self.auth.jwks_cache_ttl_secs = v.parse().unwrap_or(self.auth.jwks_cache_ttl_secs);
        }
        if let Some(v) = env_non_empty("AUTH_JWKS_TIMEOUT_SECS") {
            self.auth.jwks_timeout_secs = v.parse().unwrap_or(self.auth.jwks_timeout_secs);
        }
        if let Some(v) = env_non_empty("AUTH_LEEWAY_SECS") {
            self.auth.leeway_secs = v.parse().unwrap_or(self.auth.leeway_secs);
        }

        // Self-issued token overrides
        if let Some(v) = env_non_empty("JWT_SECRET_KEY") {
            self.auth.jwt_secret = v;
        }
        if let Some(v) = env_non_empty("JWT_ALGORITHM") {
            match Algorithm::from_str(&v) {
                Ok(alg) => self.auth.jwt_algorithm = alg,
                Err(_) => tracing::warn!("Ignoring unknown JWT_ALGORITHM '{}'", v),
            }
        }
        if let Some(v) = env_non_empty("JWT_EXPIRE_MINUTES") {
            self.auth.access_token_expire_minutes = v.parse().unwrap_or(self.auth.access_token_expire_minutes);
        }
        if let Some(v) = env_non_empty("JWT_REFRESH_EXPIRE_DAYS") {
            self.auth.refresh_token_expire_days = v.parse().unwrap_or(self.auth.refresh_token_expire_days);
        }
        if let Some(v) = env_non_empty("PASSWORD_HASH_COST") {
            self.auth.password_hash_cost = v.parse().unwrap_or(self.auth.password_hash_cost);
        }

        let explicit_mode = env_non_empty("AUTH_MODE").and_then(|v| {
            let mode = AuthMode::parse(&v);
            if mode.is_none() {
                tracing::warn!("Ignoring unknown AUTH_MODE '{}'", v);
            }
            mode
        });
        self.auth.mode = AuthMode::resolve(explicit_mode, self.auth.domain.as_deref());

        self
    }

    fn base_auth() -> AuthConfig {
        AuthConfig {
            mode: AuthMode::SelfIssued,
            domain: None,
            audience: None,
            algorithms: vec![Algorithm::RS256],
            jwks_url: None,
            jwks_cache_ttl_secs: 3600,
            jwks_timeout_secs: 5,
            leeway_secs: 0,
            jwt_secret: PLACEHOLDER_JWT_SECRET.to_string(),
            jwt_algorithm: Algorithm::HS256,
            access_token_expire_minutes: 30,
            refresh_token_expire_days: 7,
            password_hash_cost: bcrypt::DEFAULT_COST,
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 8000,
                cors_origins: vec![
                    "http://localhost:3000".to_string(),
                    "http://localhost:8081".to_string(),
                    "http://localhost:19006".to_string(),
                ],
            },
            database: DatabaseConfig {
                url: "sqlite://swaasth.db?mode=rwc".to_string(),
                max_connections: 5,
                connection_timeout: 30,
            },
            auth: AuthConfig {
                jwks_cache_ttl_secs: 300,
                ..Self::base_auth()
            },
        }
    }

    pub fn staging() -> Self {
        Self {
            environment: Environment::Staging,
            server: ServerConfig {
                port: 8000,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: "sqlite://swaasth.db?mode=rwc".to_string(),
                max_connections: 10,
                connection_timeout: 10,
            },
            auth: Self::base_auth(),
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig {
                port: 8000,
                cors_origins: Vec::new(),
            },
            database: DatabaseConfig {
                url: "sqlite://swaasth.db?mode=rwc".to_string(),
                max_connections: 20,
                connection_timeout: 5,
            },
            auth: Self::base_auth(),
        }
    }
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}
