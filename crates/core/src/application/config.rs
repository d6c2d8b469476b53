// Engine configuration (environment variables with defaults)

use super::retry::{RetryPolicy, DEFAULT_BASE_DELAY, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_DELAY};
use crate::error::{AppError, Result};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_RETRY_MAX_ATTEMPTS: &str = "QUEUES_RETRY_MAX_ATTEMPTS";
pub const ENV_RETRY_BASE_DELAY_MS: &str = "QUEUES_RETRY_BASE_DELAY_MS";
pub const ENV_RETRY_MAX_DELAY_MS: &str = "QUEUES_RETRY_MAX_DELAY_MS";

#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub retry: RetryPolicy,
}

impl EngineConfig {
    /// Read settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through `lookup`; unset keys keep their defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let max_attempts =
            parse_var(&lookup, ENV_RETRY_MAX_ATTEMPTS)?.unwrap_or(DEFAULT_MAX_ATTEMPTS);
        let base_delay = parse_var(&lookup, ENV_RETRY_BASE_DELAY_MS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_BASE_DELAY);
        let max_delay = parse_var(&lookup, ENV_RETRY_MAX_DELAY_MS)?
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_MAX_DELAY);

        if max_attempts == 0 {
            return Err(AppError::Config(format!(
                "{} must be at least 1",
                ENV_RETRY_MAX_ATTEMPTS
            )));
        }

        Ok(Self {
            retry: RetryPolicy::new(max_attempts, base_delay).with_max_delay(max_delay),
        })
    }
}

/// Parse an optional variable, naming it in the error
pub fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("{}: invalid value {:?}", key, raw))),
    }
}
