//! Attention monitor settings

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::application::AttentionMonitorConfig;
use crate::domain::attention::AttentionThresholds;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MonitorConfig {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,

    /// Silence before a participant is flagged
    #[serde(default = "default_no_response_threshold_hours")]
    pub no_response_threshold_hours: i64,

    /// How long after a booked start a meeting counts as possibly missed
    #[serde(default = "default_missed_meeting_window_minutes")]
    pub missed_meeting_window_minutes: i64,
}

impl MonitorConfig {
    pub fn monitor_config(&self) -> AttentionMonitorConfig {
        AttentionMonitorConfig {
            interval: Duration::from_secs(self.sweep_interval_secs),
            thresholds: AttentionThresholds {
                no_response: chrono::Duration::hours(self.no_response_threshold_hours),
                missed_meeting_window: chrono::Duration::minutes(self.missed_meeting_window_minutes),
            },
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidInterval("monitor.sweep_interval_secs"));
        }
        if self.no_response_threshold_hours <= 0 {
            return Err(ValidationError::InvalidInterval(
                "monitor.no_response_threshold_hours",
            ));
        }
        if self.missed_meeting_window_minutes <= 0 {
            return Err(ValidationError::InvalidInterval(
                "monitor.missed_meeting_window_minutes",
            ));
        }
        Ok(())
    }
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
            no_response_threshold_hours: default_no_response_threshold_hours(),
            missed_meeting_window_minutes: default_missed_meeting_window_minutes(),
        }
    }
}

fn default_sweep_interval_secs() -> u64 {
    300
}

fn default_no_response_threshold_hours() -> i64 {
    24
}

fn default_missed_meeting_window_minutes() -> i64 {
    60
}
