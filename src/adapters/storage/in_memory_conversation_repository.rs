//! In-Memory Conversation Repository
//!
//! Stores conversation documents in memory.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{ConversationId, ParticipantId};
use crate::domain::scheduling::{Conversation, ConversationStatus};
use crate::ports::{ConversationRepository, RepositoryError};

/// In-memory storage for conversations
#[derive(Debug, Clone, Default)]
pub struct InMemoryConversationRepository {
    conversations: Arc<RwLock<HashMap<ConversationId, Conversation>>>,
}

impl InMemoryConversationRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the number of stored conversations
    pub async fn count(&self) -> usize {
        self.conversations.read().await.len()
    }

    async fn collect_sorted<F>(&self, keep: F) -> Vec<Conversation>
    where
        F: Fn(&Conversation) -> bool,
    {
        let guard = self.conversations.read().await;
        let mut found: Vec<Conversation> = guard.values().filter(|c| keep(c)).cloned().collect();
        found.sort_by_key(|c| (c.created_at(), c.id()));
        found
    }
}

#[async_trait]
impl ConversationRepository for InMemoryConversationRepository {
    async fn insert(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut guard = self.conversations.write().await;
        if guard.contains_key(&conversation.id()) {
            return Err(RepositoryError::AlreadyExists(conversation.id()));
        }
        guard.insert(conversation.id(), conversation.clone());
        Ok(())
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        let mut guard = self.conversations.write().await;
        match guard.get_mut(&conversation.id()) {
            Some(stored) => {
                *stored = conversation.clone();
                Ok(())
            }
            None => Err(RepositoryError::NotFound(conversation.id())),
        }
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self.conversations.read().await.get(id).cloned())
    }

    async fn find_active_by_participant(
        &self,
        participant: &ParticipantId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        let found = self
            .collect_sorted(|c| c.is_active() && c.participant(participant).is_some())
            .await;
        Ok(found.into_iter().next())
    }

    async fn list_by_status(
        &self,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        Ok(self.collect_sorted(|c| c.status() == status).await)
    }

    async fn list_for_interviewer(
        &self,
        interviewer: &ParticipantId,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        Ok(self
            .collect_sorted(|c| c.status() == status && c.interviewer().id() == interviewer)
            .await)
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
        Ok(self.conversations.write().await.remove(id).is_some())
    }
}
