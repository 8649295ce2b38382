//! Error shared by every external collaborator port.

use thiserror::Error;

/// Failure of a call to an external service (NLU, NLG, messaging, calendar).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// Service unreachable or returned a transient failure.
    #[error("service unavailable: {message}")]
    Unavailable { message: String },

    /// Call did not finish within its deadline.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// Target resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Service understood the request and refused it.
    #[error("rejected: {0}")]
    Rejected(String),
}

impl ServiceError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    /// Creates a rejected error.
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected(reason.into())
    }

    /// Returns true if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable { .. } | Self::Timeout { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
