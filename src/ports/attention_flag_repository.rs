//! Attention flag repository port.

use async_trait::async_trait;

use crate::domain::attention::{AttentionFlag, FlagType};
use crate::domain::foundation::{ConversationId, FlagId, ParticipantId, Timestamp};

use super::RepositoryError;

#[async_trait]
pub trait AttentionFlagRepository: Send + Sync {
    async fn insert(&self, flag: &AttentionFlag) -> Result<(), RepositoryError>;

    /// Every flag, oldest first.
    async fn list_all(&self) -> Result<Vec<AttentionFlag>, RepositoryError>;

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<AttentionFlag>, RepositoryError>;

    /// Resolves one flag. Returns false if it was already resolved.
    ///
    /// # Errors
    ///
    /// - `FlagNotFound` if no flag has this id
    async fn resolve(&self, id: &FlagId, at: Timestamp) -> Result<bool, RepositoryError>;

    /// Resolves every unresolved flag of `flag_type` for a participant.
    /// Returns how many were resolved.
    async fn resolve_matching(
        &self,
        conversation_id: &ConversationId,
        participant: &ParticipantId,
        flag_type: FlagType,
        at: Timestamp,
    ) -> Result<usize, RepositoryError>;

    /// Drops all flags of a conversation. Returns how many were removed.
    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, RepositoryError>;
}
