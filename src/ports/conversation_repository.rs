//! Conversation repository port.
//!
//! Defines the contract for persisting and retrieving Conversation aggregates.
//!
//! # Design
//!
//! - **Whole-document**: a conversation is read and written as one unit
//! - **Last write wins**: no transactions; callers serialize writers per
//!   conversation id
//! - **Queue source of truth**: interviewer queues are derived from the
//!   persisted `status` and `created_at` fields

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::foundation::{ConversationId, FlagId, ParticipantId};
use crate::domain::scheduling::{Conversation, ConversationStatus};

/// Errors that can occur in the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Conversation already exists: {0}")]
    AlreadyExists(ConversationId),

    #[error("Attention flag not found: {0}")]
    FlagNotFound(FlagId),

    #[error("Serialization failed: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// Repository port for Conversation aggregate persistence.
#[async_trait]
pub trait ConversationRepository: Send + Sync {
    /// Stores a new conversation.
    ///
    /// # Errors
    ///
    /// - `AlreadyExists` if the id is taken
    async fn insert(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Replaces a stored conversation with `conversation`.
    ///
    /// # Errors
    ///
    /// - `NotFound` if it was deleted in the meantime; deleted conversations
    ///   are never resurrected by a late write
    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError>;

    /// Loads a conversation. Returns `None` if not found.
    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError>;

    /// Finds the oldest active conversation the number takes part in.
    async fn find_active_by_participant(
        &self,
        participant: &ParticipantId,
    ) -> Result<Option<Conversation>, RepositoryError>;

    /// All conversations with `status`, oldest first.
    async fn list_by_status(
        &self,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    /// Conversations led by `interviewer` with `status`, oldest first.
    async fn list_for_interviewer(
        &self,
        interviewer: &ParticipantId,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError>;

    /// Removes a conversation. Returns false if it did not exist.
    async fn delete(&self, id: &ConversationId) -> Result<bool, RepositoryError>;
}
