//! Application handlers.
//!
//! Command and query handlers for intake and operators. Inbound chat
//! messages go straight to the `ConversationOrchestrator`.

mod admin;
mod intake;

pub use admin::{
    DeleteConversationCommand, DeleteConversationHandler, ListConversationsHandler,
    ListConversationsQuery, ListFlagsHandler, ListFlagsQuery, ListScheduledInterviewsHandler,
    ResolveFlagCommand, ResolveFlagHandler, ScheduledInterview,
};
pub use intake::{
    ParticipantDetails, StartConversationCommand, StartConversationHandler,
    StartConversationResult,
};
