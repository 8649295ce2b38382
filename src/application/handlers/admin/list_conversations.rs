//! ListConversationsHandler - Query handler for conversations by status.

use std::sync::Arc;

use crate::domain::scheduling::{Conversation, ConversationStatus};
use crate::ports::ConversationRepository;

use crate::application::OrchestratorError;

/// Query for conversations in one lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListConversationsQuery {
    pub status: ConversationStatus,
}

impl ListConversationsQuery {
    pub fn active() -> Self {
        Self {
            status: ConversationStatus::Active,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: ConversationStatus::Completed,
        }
    }

    pub fn queued() -> Self {
        Self {
            status: ConversationStatus::Queued,
        }
    }
}

pub struct ListConversationsHandler {
    repository: Arc<dyn ConversationRepository>,
}

impl ListConversationsHandler {
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// Oldest first.
    pub async fn handle(
        &self,
        query: ListConversationsQuery,
    ) -> Result<Vec<Conversation>, OrchestratorError> {
        Ok(self.repository.list_by_status(query.status).await?)
    }
}
