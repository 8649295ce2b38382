//! Attention flags: operator-visible alerts for stalling conversations.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{ConversationId, FlagId, ParticipantId, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FlagType {
    /// Participant silent past the response threshold.
    NoResponse,
    /// A booked meeting started without anyone marking it held.
    MissedScheduledMeeting,
    /// Interviewee has nothing left to be offered.
    NoAvailableSlots,
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FlagType::NoResponse => "NO_RESPONSE",
            FlagType::MissedScheduledMeeting => "MISSED_SCHEDULED_MEETING",
            FlagType::NoAvailableSlots => "NO_AVAILABLE_SLOTS",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttentionFlag {
    id: FlagId,
    conversation_id: ConversationId,
    participant_id: ParticipantId,
    flag_type: FlagType,
    created_at: Timestamp,
    resolved: bool,
    resolved_at: Option<Timestamp>,
}

impl AttentionFlag {
    pub fn raise(
        conversation_id: ConversationId,
        participant_id: ParticipantId,
        flag_type: FlagType,
        now: Timestamp,
    ) -> Self {
        Self {
            id: FlagId::new(),
            conversation_id,
            participant_id,
            flag_type,
            created_at: now,
            resolved: false,
            resolved_at: None,
        }
    }

    pub fn id(&self) -> FlagId {
        self.id
    }

    pub fn conversation_id(&self) -> ConversationId {
        self.conversation_id
    }

    pub fn participant_id(&self) -> &ParticipantId {
        &self.participant_id
    }

    pub fn flag_type(&self) -> FlagType {
        self.flag_type
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub fn resolved_at(&self) -> Option<Timestamp> {
        self.resolved_at
    }

    /// Marks the flag resolved. Returns false if it already was.
    pub fn resolve(&mut self, now: Timestamp) -> bool {
        if self.resolved {
            return false;
        }
        self.resolved = true;
        self.resolved_at = Some(now);
        true
    }

    /// True if this flag is about the same thing as `(participant, flag_type)`.
    pub fn concerns(&self, participant: &ParticipantId, flag_type: FlagType) -> bool {
        &self.participant_id == participant && self.flag_type == flag_type
    }
}
