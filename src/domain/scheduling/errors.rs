//! Errors raised by the scheduling aggregate.

use thiserror::Error;

use crate::domain::foundation::{ParticipantId, ValidationError};

use super::ParticipantState;

/// Failures of in-aggregate scheduling operations.
///
/// These are internal inconsistencies: the triggering event is dropped and
/// the aggregate is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulingError {
    #[error("participant {0} is not part of this conversation")]
    ParticipantNotFound(ParticipantId),

    #[error("participant {0} is the interviewer, expected an interviewee")]
    NotAnInterviewee(ParticipantId),

    #[error("cannot apply {event} to participant in state {state}")]
    InvalidTransition {
        state: ParticipantState,
        event: &'static str,
    },

    #[error("participant {0} holds no proposed slot")]
    NoProposedSlot(ParticipantId),

    #[error("conversation is not active")]
    ConversationClosed,

    #[error(transparent)]
    Validation(#[from] ValidationError),
}
