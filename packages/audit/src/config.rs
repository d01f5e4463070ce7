use std::env;
use std::time::Duration;

use dotenvy::dotenv;

use crate::error::AuditError;

const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_SOCKET_TIMEOUT_MS: u64 = 45_000;

/// Auditor configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub store_endpoint: String,
    pub connect_timeout: Duration,
    pub socket_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AuditError> {
        // Load .env file if present (development)
        let _ = dotenv();

        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuditError> {
        let store_endpoint = lookup("STORE_ENDPOINT")
            .ok_or_else(|| AuditError::Config("STORE_ENDPOINT must be set".to_string()))?;

        let connect_timeout =
            timeout_ms(&lookup, "STORE_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?;
        let socket_timeout =
            timeout_ms(&lookup, "STORE_SOCKET_TIMEOUT_MS", DEFAULT_SOCKET_TIMEOUT_MS)?;

        Ok(Self {
            store_endpoint,
            connect_timeout,
            socket_timeout,
        })
    }
}

fn timeout_ms(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default_ms: u64,
) -> Result<Duration, AuditError> {
    let ms = match lookup(key) {
        Some(raw) => raw
            .parse()
            .map_err(|_| AuditError::Config(format!("{key} must be a number of milliseconds")))?,
        None => default_ms,
    };
    Ok(Duration::from_millis(ms))
}
