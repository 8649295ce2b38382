//! Scheduling domain - participants, the slot pool and negotiation.
//!
//! # Module Structure
//!
//! - `slot` - Slot value object and its identity key
//! - `pool` - Available / reserved / scheduled slots and denials
//! - `participant` - Participant entity and `ParticipantState` machine
//! - `transition` - Pure `transition(participant, event)` function
//! - `directive` - Declarative side effects and message directives
//! - `conversation` - Conversation aggregate root
//! - `negotiation` - Offer / accept / decline / advance on the aggregate

mod conversation;
mod directive;
mod errors;
mod negotiation;
mod participant;
mod pool;
mod slot;
mod transition;

pub use conversation::{
    CompletionReason, ContactPerson, Conversation, ConversationStatus, SchedulingPolicy,
};
pub use directive::{Audience, CandidateSummary, MessageDirective, SideEffect};
pub use errors::SchedulingError;
pub use participant::{
    HistoryEntry, Participant, ParticipantState, PendingAction, Role, Sender, TargetAction,
};
pub use pool::SlotPool;
pub use slot::{Slot, SlotKey};
pub use transition::{transition, ParticipantEvent, Transition};
