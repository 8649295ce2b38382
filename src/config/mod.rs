//! Application configuration module
//!
//! Type-safe configuration loaded from environment variables using the
//! `config` and `dotenvy` crates. Variables carry the `INTERVIEW_SCHEDULER`
//! prefix and nested values use double underscores as separators. Every
//! section has defaults, so an empty environment is a valid configuration.
//!
//! # Example
//!
//! ```no_run
//! use interview_scheduler::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Sweeping every {}s", config.monitor.sweep_interval_secs);
//! ```

mod error;
mod monitor;
mod retry;
mod scheduling;
mod storage;
mod telemetry;

pub use error::{ConfigError, ValidationError};
pub use monitor::MonitorConfig;
pub use retry::RetryConfig;
pub use scheduling::SchedulingConfig;
pub use storage::StorageConfig;
pub use telemetry::{Environment, TelemetryConfig};

use serde::Deserialize;

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Negotiation limits
    #[serde(default)]
    pub scheduling: SchedulingConfig,

    /// Retry policy for NLU, messaging and calendar calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Attention sweep interval and thresholds
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Where conversations are kept
    #[serde(default)]
    pub storage: StorageConfig,

    /// Environment and log filter
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `INTERVIEW_SCHEDULER` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `INTERVIEW_SCHEDULER__RETRY__MAX_ATTEMPTS=5` -> `retry.max_attempts = 5`
    /// - `INTERVIEW_SCHEDULER__STORAGE__DATA_DIR=/var/lib/scheduler` -> `storage.data_dir`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("INTERVIEW_SCHEDULER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for zero attempts or intervals, a backoff
    /// above its cap, or an empty data directory.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.retry.validate()?;
        self.monitor.validate()?;
        self.storage.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.telemetry.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "INTERVIEW_SCHEDULER__SCHEDULING__MAX_MORE_SLOT_REQUESTS",
        "INTERVIEW_SCHEDULER__RETRY__MAX_ATTEMPTS",
        "INTERVIEW_SCHEDULER__MONITOR__SWEEP_INTERVAL_SECS",
        "INTERVIEW_SCHEDULER__STORAGE__DATA_DIR",
        "INTERVIEW_SCHEDULER__TELEMETRY__ENVIRONMENT",
    ];

    /// Helper to clear environment variables after testing
    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.scheduling.max_more_slot_requests, 2);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.monitor.sweep_interval_secs, 300);
        assert!(!config.storage.is_persistent());
        assert_eq!(config.telemetry.environment, Environment::Development);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("INTERVIEW_SCHEDULER__SCHEDULING__MAX_MORE_SLOT_REQUESTS", "4");
        env::set_var("INTERVIEW_SCHEDULER__RETRY__MAX_ATTEMPTS", "5");
        env::set_var("INTERVIEW_SCHEDULER__MONITOR__SWEEP_INTERVAL_SECS", "60");
        env::set_var("INTERVIEW_SCHEDULER__STORAGE__DATA_DIR", "/tmp/conversations");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.scheduling.max_more_slot_requests, 4);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.monitor.sweep_interval_secs, 60);
        assert_eq!(
            config.storage.data_dir,
            Some(PathBuf::from("/tmp/conversations"))
        );
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("INTERVIEW_SCHEDULER__TELEMETRY__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert!(config.is_production());
        assert!(config.telemetry.json_logs());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = AppConfig::default();
        config.retry.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::NoRetryAttempts)
        ));
    }
}
