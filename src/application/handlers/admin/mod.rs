//! Operator command and query handlers.

mod delete_conversation;
mod list_conversations;
mod list_flags;
mod list_scheduled_interviews;
mod resolve_flag;

pub use delete_conversation::{DeleteConversationCommand, DeleteConversationHandler};
pub use list_conversations::{ListConversationsHandler, ListConversationsQuery};
pub use list_flags::{ListFlagsHandler, ListFlagsQuery};
pub use list_scheduled_interviews::{ListScheduledInterviewsHandler, ScheduledInterview};
pub use resolve_flag::{ResolveFlagCommand, ResolveFlagHandler};
