// SQLite Connection Pool Setup

use crate::error::map_sqlx_error;
use queues_core::application::config::parse_var;
use queues_core::error::{AppError, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::sqlite::SqliteSynchronous;
use std::str::FromStr;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_DB_PATH: &str = "~/.queues/queues.db";
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub const ENV_DB_PATH: &str = "QUEUES_DB_PATH";
pub const ENV_DB_MAX_CONNECTIONS: &str = "QUEUES_DB_MAX_CONNECTIONS";
pub const ENV_DB_BUSY_TIMEOUT_MS: &str = "QUEUES_DB_BUSY_TIMEOUT_MS";

/// Store settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
    /// How long SQLite waits on a locked database before reporting busy
    pub busy_timeout: Duration,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(shellexpand::tilde(DEFAULT_DB_PATH).into_owned())
    }
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        Self {
            database_url: database_url.into(),
            max_connections: DEFAULT_MAX_CONNECTIONS,
            busy_timeout: DEFAULT_BUSY_TIMEOUT,
        }
    }

    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; `~` in the path is expanded
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match lookup(ENV_DB_PATH) {
            Some(path) => Self::new(shellexpand::tilde(&path).into_owned()),
            None => Self::default(),
        };

        if let Some(max) = parse_var::<u32>(&lookup, ENV_DB_MAX_CONNECTIONS)? {
            if max == 0 {
                return Err(AppError::Config(format!(
                    "{} must be at least 1",
                    ENV_DB_MAX_CONNECTIONS
                )));
            }
            config.max_connections = max;
        }
        if let Some(ms) = parse_var::<u64>(&lookup, ENV_DB_BUSY_TIMEOUT_MS)? {
            config.busy_timeout = Duration::from_millis(ms);
        }
        Ok(config)
    }
}

/// Create SQLite connection pool with WAL mode and default settings
pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    create_pool_with(&StoreConfig::new(database_url)).await
}

/// Create SQLite connection pool with WAL mode and optimizations
pub async fn create_pool_with(config: &StoreConfig) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)
        .map_err(|e| AppError::Config(format!("invalid database url: {}", e)))?
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .busy_timeout(config.busy_timeout)
        // Per-connection: slot rows cascade with their queue
        .foreign_keys(true)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .connect_with(options)
        .await
        .map_err(map_sqlx_error)?;

    info!(
        database_url = %config.database_url,
        max_connections = config.max_connections,
        "SQLite pool ready"
    );
    Ok(pool)
}
