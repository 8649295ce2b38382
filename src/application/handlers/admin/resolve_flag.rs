//! ResolveFlagHandler - Command handler for operator flag resolution.

use std::sync::Arc;

use crate::domain::foundation::{FlagId, Timestamp};
use crate::ports::{AttentionFlagRepository, RepositoryError};

use crate::application::OrchestratorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolveFlagCommand {
    pub flag_id: FlagId,
}

pub struct ResolveFlagHandler {
    flags: Arc<dyn AttentionFlagRepository>,
}

impl ResolveFlagHandler {
    pub fn new(flags: Arc<dyn AttentionFlagRepository>) -> Self {
        Self { flags }
    }

    /// Returns false if the flag was already resolved.
    ///
    /// # Errors
    ///
    /// - `DataIntegrity` if no flag has this id
    pub async fn handle(&self, cmd: ResolveFlagCommand) -> Result<bool, OrchestratorError> {
        match self.flags.resolve(&cmd.flag_id, Timestamp::now()).await {
            Ok(changed) => {
                if changed {
                    tracing::info!(flag_id = %cmd.flag_id, "attention flag resolved");
                }
                Ok(changed)
            }
            Err(RepositoryError::FlagNotFound(id)) => Err(OrchestratorError::DataIntegrity(format!(
                "attention flag {} not found",
                id
            ))),
            Err(e) => Err(e.into()),
        }
    }
}
