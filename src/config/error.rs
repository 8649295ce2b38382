//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Retry max_attempts must be at least 1")]
    NoRetryAttempts,

    #[error("Retry initial backoff exceeds the backoff cap")]
    BackoffAboveCap,

    #[error("Invalid timeout: {0} must be positive")]
    InvalidTimeout(&'static str),

    #[error("Invalid interval: {0} must be positive")]
    InvalidInterval(&'static str),

    #[error("Data directory must not be empty when set")]
    EmptyDataDir,
}
