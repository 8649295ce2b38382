//! Per-interviewer conversation queue.
//!
//! An interviewer has at most one active conversation. Others wait with
//! status `queued` and are promoted oldest first. The queue keeps no state of
//! its own: it is read from the repository every time, so it survives
//! restarts and cannot drift from what is stored.

use std::sync::Arc;

use tokio::sync::OwnedMutexGuard;

use crate::domain::foundation::{ConversationId, ParticipantId};
use crate::domain::scheduling::{Conversation, ConversationStatus};
use crate::ports::ConversationRepository;

use super::{OrchestratorError, QueueLocks};

/// Where a new conversation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// The interviewer was free; the conversation should start now.
    Activate,
    /// Waiting behind `ahead` older conversations (the active one included).
    Queued { ahead: usize },
}

/// Queue view over the conversation repository.
pub struct InterviewerQueue {
    conversations: Arc<dyn ConversationRepository>,
    locks: QueueLocks,
}

impl InterviewerQueue {
    pub fn new(conversations: Arc<dyn ConversationRepository>) -> Self {
        Self {
            conversations,
            locks: QueueLocks::new(),
        }
    }

    /// Serializes queue changes for one interviewer.
    ///
    /// Hold this across admit-and-insert and across promotion.
    pub async fn lock(&self, interviewer: &ParticipantId) -> OwnedMutexGuard<()> {
        self.locks.acquire(interviewer).await
    }

    pub async fn active_for(
        &self,
        interviewer: &ParticipantId,
    ) -> Result<Option<Conversation>, OrchestratorError> {
        Ok(self
            .conversations
            .list_for_interviewer(interviewer, ConversationStatus::Active)
            .await?
            .into_iter()
            .next())
    }

    /// Queued conversation ids, oldest first.
    pub async fn pending(
        &self,
        interviewer: &ParticipantId,
    ) -> Result<Vec<ConversationId>, OrchestratorError> {
        Ok(self
            .conversations
            .list_for_interviewer(interviewer, ConversationStatus::Queued)
            .await?
            .iter()
            .map(Conversation::id)
            .collect())
    }

    /// Decides whether a new conversation for `interviewer` may start now.
    ///
    /// Only when nothing is active and nothing older is waiting. Call under
    /// [`lock`](Self::lock), after promoting any queued conversation.
    pub async fn admit(&self, interviewer: &ParticipantId) -> Result<Admission, OrchestratorError> {
        let active = usize::from(self.active_for(interviewer).await?.is_some());
        let ahead = self.pending(interviewer).await?.len() + active;
        if ahead == 0 {
            return Ok(Admission::Activate);
        }
        Ok(Admission::Queued { ahead })
    }

    /// The oldest queued conversation that still exists and is not in
    /// `skip`, if the interviewer is free.
    ///
    /// Call under [`lock`](Self::lock). Ids that vanished between listing
    /// and loading are skipped.
    pub async fn next_to_promote(
        &self,
        interviewer: &ParticipantId,
        skip: &[ConversationId],
    ) -> Result<Option<Conversation>, OrchestratorError> {
        if self.active_for(interviewer).await?.is_some() {
            return Ok(None);
        }
        for id in self.pending(interviewer).await? {
            if skip.contains(&id) {
                continue;
            }
            match self.conversations.find_by_id(&id).await? {
                Some(conv) if conv.status() == ConversationStatus::Queued => return Ok(Some(conv)),
                Some(_) => {}
                None => {
                    tracing::warn!(conversation_id = %id, "queued conversation vanished, skipping");
                }
            }
        }
        Ok(None)
    }
}
