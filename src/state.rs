use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::{AppConfig, ConfigError};
use crate::database::{DatabaseManager, UserRepository};

/// Shared per-process handles given to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub auth: Authenticator,
    pub database: DatabaseManager,
}

impl AppState {
    /// Builds the verification strategy from `config`; fails on an invalid auth setup.
    pub fn new(config: AppConfig, database: DatabaseManager) -> Result<Self, ConfigError> {
        let auth = Authenticator::from_config(&config.auth, config.environment)?;
        Ok(Self {
            config: Arc::new(config),
            auth,
            database,
        })
    }

    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.database.pool().clone())
    }
}
