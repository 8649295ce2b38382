//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `storage` - Conversation and flag repositories (YAML files, in-memory)
//! - `language` - Scripted NLU
//! - `composer` - Template NLG
//! - `messaging` - Recording chat gateway
//! - `calendar` - Mock calendar

pub mod calendar;
pub mod composer;
pub mod language;
pub mod messaging;
pub mod storage;

pub use calendar::MockCalendarService;
pub use composer::TemplateMessageComposer;
pub use language::ScriptedLanguageUnderstanding;
pub use messaging::RecordingMessagingGateway;
pub use storage::{
    FileAttentionFlagRepository, FileConversationRepository, InMemoryAttentionFlagRepository,
    InMemoryConversationRepository,
};
