//! Calendar Service Port - interview events.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{CalendarEventId, ConversationId, ParticipantId};
use crate::domain::scheduling::Slot;

use super::ServiceError;

/// Everything the calendar needs to book one interview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEventRequest {
    pub conversation_id: ConversationId,
    pub participant_id: ParticipantId,
    pub title: String,
    pub slot: Slot,
    pub attendees: Vec<String>,
    pub timezone: Option<String>,
}

/// Port for the calendar collaborator.
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Books an event and returns its id.
    async fn create_event(
        &self,
        request: &CalendarEventRequest,
    ) -> Result<CalendarEventId, ServiceError>;

    /// Deletes an event.
    ///
    /// # Errors
    ///
    /// `ServiceError::NotFound` if the event does not exist; callers treat
    /// that as success.
    async fn delete_event(&self, event_id: &CalendarEventId) -> Result<(), ServiceError>;

    /// Moves an existing event to a new slot.
    async fn update_event(&self, event_id: &CalendarEventId, slot: &Slot)
        -> Result<(), ServiceError>;
}
