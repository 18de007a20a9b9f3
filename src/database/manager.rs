use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager and repositories
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    UniqueViolation(String),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        sub             TEXT UNIQUE,
        email           TEXT UNIQUE,
        hashed_password TEXT,
        name            TEXT,
        first_name      TEXT,
        last_name       TEXT,
        phone           TEXT,
        role            TEXT NOT NULL DEFAULT 'elder',
        is_active       BOOLEAN NOT NULL DEFAULT 1,
        is_verified     BOOLEAN NOT NULL DEFAULT 0,
        is_caregiver    BOOLEAN NOT NULL DEFAULT 0,
        created_at      TEXT NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_users_sub ON users (sub)",
    "CREATE INDEX IF NOT EXISTS idx_users_email ON users (email)",
];

/// Owns the SQLite connection pool
#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
}

impl DatabaseManager {
    /// Open the pool and make sure the schema exists
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str(&config.url)?.foreign_keys(true);

        // Every in-memory connection is its own database, so pin exactly one
        let in_memory = config.url.contains(":memory:") || config.url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(config.max_connections)
        };

        let pool = pool_options
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect_with(options)
            .await?;

        let manager = Self { pool };
        manager.migrate().await?;

        info!("Connected to database: {}", config.url);
        Ok(manager)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn migrate(&self) -> Result<(), DatabaseError> {
        for statement in SCHEMA {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Pings the pool to ensure connectivity
    pub async fn health_check(&self) -> Result<(), DatabaseError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
