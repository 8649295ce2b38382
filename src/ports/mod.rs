//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Collaborator Ports
//!
//! - `LanguageUnderstanding` - Intent, slot, confirmation and timezone detection
//! - `MessageComposer` - Directive to prose
//! - `MessagingGateway` - Chat transport
//! - `CalendarService` - Interview events
//!
//! ## Persistence Ports
//!
//! - `ConversationRepository` - Conversation documents
//! - `AttentionFlagRepository` - Operator flags

mod attention_flag_repository;
mod calendar_service;
mod conversation_repository;
mod language_understanding;
mod message_composer;
mod messaging_gateway;
mod service_error;

pub use attention_flag_repository::AttentionFlagRepository;
pub use calendar_service::{CalendarEventRequest, CalendarService};
pub use conversation_repository::{ConversationRepository, RepositoryError};
pub use language_understanding::{Intent, LanguageUnderstanding, SlotExtraction};
pub use message_composer::{ComposeContext, MessageComposer};
pub use messaging_gateway::MessagingGateway;
pub use service_error::ServiceError;
