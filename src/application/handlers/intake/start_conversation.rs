//! StartConversationHandler - Command handler for new scheduling requests.

use std::sync::Arc;

use serde::Deserialize;

use crate::domain::foundation::{ConversationId, ParticipantId, ValidationError};
use crate::domain::scheduling::{ContactPerson, Conversation, Participant, SchedulingPolicy};

use crate::application::{Admission, ConversationOrchestrator, OrchestratorError};

/// One person taking part, as submitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParticipantDetails {
    pub name: String,
    pub number: String,
    pub email: Option<String>,
    /// Position applied for. Ignored for the interviewer.
    pub job_title: Option<String>,
}

/// Command to start negotiating interviews for one interviewer.
#[derive(Debug, Clone, Deserialize)]
pub struct StartConversationCommand {
    pub interviewer: ParticipantDetails,
    pub interviewees: Vec<ParticipantDetails>,
    pub meeting_duration_minutes: u32,
    /// Escalation contact for attention alerts.
    pub contact: Option<ParticipantDetails>,
    pub company_details: Option<String>,
}

/// Result of a successful start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartConversationResult {
    pub conversation_id: ConversationId,
    pub admission: Admission,
}

/// Handler for starting conversations.
pub struct StartConversationHandler {
    orchestrator: Arc<ConversationOrchestrator>,
}

impl StartConversationHandler {
    pub fn new(orchestrator: Arc<ConversationOrchestrator>) -> Self {
        Self { orchestrator }
    }

    /// Validates the request, stores the conversation and starts or queues it.
    ///
    /// # Errors
    ///
    /// - `Validation` for missing names or numbers, an empty interviewee
    ///   list, a zero duration or duplicate numbers; nothing is stored
    /// - `External` if the greeting step failed after retries
    pub async fn handle(
        &self,
        cmd: StartConversationCommand,
    ) -> Result<StartConversationResult, OrchestratorError> {
        let conversation = build_conversation(cmd)?;
        let started = self.orchestrator.start(conversation).await?;
        Ok(StartConversationResult {
            conversation_id: started.conversation_id,
            admission: started.admission,
        })
    }
}

fn build_conversation(cmd: StartConversationCommand) -> Result<Conversation, ValidationError> {
    let (id, name) = identify(&cmd.interviewer, "interviewer")?;
    let interviewer = Participant::interviewer(id, name, cmd.interviewer.email);

    let interviewees = cmd
        .interviewees
        .into_iter()
        .map(|p| {
            let (id, name) = identify(&p, "interviewee")?;
            Ok(Participant::interviewee(id, name, p.email, p.job_title))
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    let contact = cmd
        .contact
        .map(|c| {
            let (number, name) = identify(&c, "contact")?;
            Ok::<_, ValidationError>(ContactPerson {
                name,
                number,
                email: c.email,
            })
        })
        .transpose()?;

    let policy = SchedulingPolicy::new(cmd.meeting_duration_minutes, contact, cmd.company_details)?;
    Conversation::new(interviewer, interviewees, policy)
}

fn identify(details: &ParticipantDetails, field: &str) -> Result<(ParticipantId, String), ValidationError> {
    let name = details.name.trim();
    if name.is_empty() {
        return Err(ValidationError::empty_field(format!("{}.name", field)));
    }
    let id = ParticipantId::from_phone(&details.number)
        .map_err(|_| ValidationError::empty_field(format!("{}.number", field)))?;
    Ok((id, name.to_string()))
}
