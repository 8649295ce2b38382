//! ListScheduledInterviewsHandler - every booked interview, across
//! active and completed conversations.

use std::sync::Arc;

use crate::domain::foundation::{CalendarEventId, ConversationId, ParticipantId};
use crate::domain::scheduling::{ConversationStatus, Slot};
use crate::ports::ConversationRepository;

use crate::application::OrchestratorError;

/// One booked interview.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledInterview {
    pub conversation_id: ConversationId,
    pub interviewer: String,
    pub interviewee: String,
    pub interviewee_number: ParticipantId,
    pub slot: Slot,
    /// Missing if the calendar event could not be created.
    pub event_id: Option<CalendarEventId>,
}

pub struct ListScheduledInterviewsHandler {
    repository: Arc<dyn ConversationRepository>,
}

impl ListScheduledInterviewsHandler {
    pub fn new(repository: Arc<dyn ConversationRepository>) -> Self {
        Self { repository }
    }

    /// Sorted by interview start.
    pub async fn handle(&self) -> Result<Vec<ScheduledInterview>, OrchestratorError> {
        let mut interviews = Vec::new();
        for status in [ConversationStatus::Active, ConversationStatus::Completed] {
            for conv in self.repository.list_by_status(status).await? {
                for p in conv.scheduled_interviewees() {
                    let Some(slot) = p.scheduled_slot() else {
                        tracing::warn!(
                            conversation_id = %conv.id(),
                            participant = %p.id(),
                            "scheduled interviewee without a slot"
                        );
                        continue;
                    };
                    interviews.push(ScheduledInterview {
                        conversation_id: conv.id(),
                        interviewer: conv.interviewer().name().to_string(),
                        interviewee: p.name().to_string(),
                        interviewee_number: p.id().clone(),
                        slot,
                        event_id: p.event_id().cloned(),
                    });
                }
            }
        }
        interviews.sort_by_key(|i| i.slot.start);
        Ok(interviews)
    }
}
