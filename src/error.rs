use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing {0} (set it in the environment or .env)")]
    MissingCredential(&'static str),
    #[error("Local key must be 16 bytes, got {0}")]
    InvalidLocalKey(usize),
    #[error("Loss threshold {loss} must not exceed gain threshold {gain}")]
    InvalidThresholds { gain: String, loss: String },
    #[error("Refresh interval must be greater than zero")]
    ZeroInterval,
    #[error("Unsupported Tuya protocol version {0:?} (expected 3.3 or 3.5)")]
    UnsupportedProtocol(String),
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Failed to read portfolio file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse portfolio JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid portfolio format: {0}")]
    Format(String),
}

impl LoadError {
    pub fn format(message: impl Into<String>) -> Self {
        Self::Format(message.into())
    }
}

#[derive(Debug, Error)]
#[error("Failed to fetch {symbol}: {source:#}")]
pub struct FetchError {
    pub symbol: String,
    #[source]
    pub source: anyhow::Error,
}

#[derive(Debug, Error)]
pub enum IndicatorError {
    #[error("Failed to connect to device at {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Device I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("Device did not answer within {0:?}")]
    Timeout(std::time::Duration),
    #[error("Failed to encrypt device payload: {0}")]
    Encrypt(String),
    #[error("Device protocol error: {0}")]
    Protocol(String),
}
