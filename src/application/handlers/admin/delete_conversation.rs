//! DeleteConversationHandler - Command handler for removing a conversation.

use std::sync::Arc;

use crate::domain::foundation::ConversationId;

use crate::application::{ConversationOrchestrator, OrchestratorError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteConversationCommand {
    pub conversation_id: ConversationId,
}

pub struct DeleteConversationHandler {
    orchestrator: Arc<ConversationOrchestrator>,
}

impl DeleteConversationHandler {
    pub fn new(orchestrator: Arc<ConversationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Deletes the conversation and its flags.
    ///
    /// # Errors
    ///
    /// - `DataIntegrity` if the conversation does not exist
    pub async fn handle(&self, cmd: DeleteConversationCommand) -> Result<(), OrchestratorError> {
        if self.orchestrator.delete(cmd.conversation_id).await? {
            Ok(())
        } else {
            Err(OrchestratorError::conversation_not_found(cmd.conversation_id))
        }
    }
}
