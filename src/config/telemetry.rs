//! Logging settings

use serde::Deserialize;

/// Application environment
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Default tracing filter directive; `RUST_LOG` overrides it
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl TelemetryConfig {
    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }

    /// Production logs are JSON lines.
    pub fn json_logs(&self) -> bool {
        self.is_production()
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info,interview_scheduler=debug".to_string()
}
