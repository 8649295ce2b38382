//! Negotiation settings

use serde::Deserialize;

use crate::application::OrchestratorConfig;

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SchedulingConfig {
    /// Requests for more availability before a stuck conversation closes
    #[serde(default = "default_max_more_slot_requests")]
    pub max_more_slot_requests: u32,
}

impl SchedulingConfig {
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            max_more_slot_requests: self.max_more_slot_requests,
        }
    }
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            max_more_slot_requests: default_max_more_slot_requests(),
        }
    }
}

fn default_max_more_slot_requests() -> u32 {
    2
}
