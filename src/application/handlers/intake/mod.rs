//! Intake command handlers.

mod start_conversation;

pub use start_conversation::{
    ParticipantDetails, StartConversationCommand, StartConversationHandler,
    StartConversationResult,
};
