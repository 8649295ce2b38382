//! Errors surfaced by the application layer.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, ParticipantId, ValidationError};
use crate::domain::scheduling::SchedulingError;
use crate::ports::{RepositoryError, ServiceError};

/// Why an inbound event, start request or admin action failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OrchestratorError {
    /// Malformed input; nothing was created or changed.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// An external collaborator failed after retries.
    #[error("{operation} failed: {source}")]
    External {
        operation: &'static str,
        #[source]
        source: ServiceError,
    },

    /// A referenced conversation or participant does not exist, or the event
    /// does not fit the conversation's current state.
    #[error("Data integrity: {0}")]
    DataIntegrity(String),

    #[error("Storage error: {0}")]
    Storage(#[from] RepositoryError),
}

impl OrchestratorError {
    pub fn external(operation: &'static str, source: ServiceError) -> Self {
        Self::External { operation, source }
    }

    pub fn conversation_not_found(id: ConversationId) -> Self {
        Self::DataIntegrity(format!("conversation {} not found", id))
    }

    pub fn no_active_conversation(participant: &ParticipantId) -> Self {
        Self::DataIntegrity(format!("no active conversation for {}", participant))
    }

    pub fn is_external(&self) -> bool {
        matches!(self, Self::External { .. })
    }
}

impl From<SchedulingError> for OrchestratorError {
    fn from(err: SchedulingError) -> Self {
        match err {
            SchedulingError::Validation(e) => Self::Validation(e),
            other => Self::DataIntegrity(other.to_string()),
        }
    }
}
