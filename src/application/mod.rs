//! Application layer - orchestration, background work and handlers.
//!
//! Coordinates the pure scheduling domain with the ports: every inbound
//! event is serialized per conversation, run through the domain, and its
//! side effects executed with bounded retry.

mod effects;
mod errors;
pub mod handlers;
mod locks;
mod monitor;
mod orchestrator;
mod queue;
mod retry;

pub use effects::{EffectExecutor, EffectReport};
pub use errors::OrchestratorError;
pub use handlers::{
    DeleteConversationCommand, DeleteConversationHandler, ListConversationsHandler,
    ListConversationsQuery, ListFlagsHandler, ListFlagsQuery, ListScheduledInterviewsHandler,
    ParticipantDetails, ResolveFlagCommand, ResolveFlagHandler, ScheduledInterview,
    StartConversationCommand, StartConversationHandler, StartConversationResult,
};
pub use locks::{ConversationLocks, KeyedLocks, QueueLocks};
pub use monitor::{AttentionMonitor, AttentionMonitorConfig, SweepReport};
pub use orchestrator::{ConversationOrchestrator, MessageOutcome, OrchestratorConfig, StartResult};
pub use queue::{Admission, InterviewerQueue};
pub use retry::RetryPolicy;
