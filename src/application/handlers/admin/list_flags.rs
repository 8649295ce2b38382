//! ListFlagsHandler - Query handler for attention flags.

use std::sync::Arc;

use crate::domain::attention::AttentionFlag;
use crate::domain::foundation::ConversationId;
use crate::ports::AttentionFlagRepository;

use crate::application::OrchestratorError;

/// Query for flags, optionally narrowed to one conversation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListFlagsQuery {
    pub conversation_id: Option<ConversationId>,
    pub unresolved_only: bool,
}

pub struct ListFlagsHandler {
    flags: Arc<dyn AttentionFlagRepository>,
}

impl ListFlagsHandler {
    pub fn new(flags: Arc<dyn AttentionFlagRepository>) -> Self {
        Self { flags }
    }

    pub async fn handle(&self, query: ListFlagsQuery) -> Result<Vec<AttentionFlag>, OrchestratorError> {
        let flags = match query.conversation_id {
            Some(id) => self.flags.list_for_conversation(&id).await?,
            None => self.flags.list_all().await?,
        };
        Ok(flags
            .into_iter()
            .filter(|f| !query.unresolved_only || !f.is_resolved())
            .collect())
    }
}
