//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, errors and the state machine trait
//! that form the vocabulary of the scheduling domain.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{CalendarEventId, ConversationId, FlagId, ParticipantId};
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
