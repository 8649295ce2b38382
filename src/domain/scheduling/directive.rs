//! Declarative side effects emitted by the scheduling domain.
//!
//! The domain never talks to the outside world. It returns `SideEffect`s and
//! the application layer executes them: messages are composed from a
//! `MessageDirective` by the NLG collaborator, calendar effects go to the
//! calendar service.

use serde::{Deserialize, Serialize};

use crate::domain::attention::FlagType;
use crate::domain::foundation::{CalendarEventId, ParticipantId};

use super::{ParticipantState, Slot, TargetAction};

/// Who a notification is for.
///
/// `Interviewer` and `Contact` are resolved against the conversation at
/// execution time, so transitions do not need to know who fills those roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Audience {
    Participant(ParticipantId),
    Interviewer,
    Contact,
}

/// Interviewee summary included in the interviewer greeting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateSummary {
    pub name: String,
    pub job_title: Option<String>,
}

/// Structured instruction for the message composer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "directive")]
pub enum MessageDirective {
    Greeting {
        candidates: Vec<CandidateSummary>,
        meeting_duration_minutes: u32,
    },
    RequestTimezone,
    ConfirmExtractedSlots {
        slots: Vec<Slot>,
    },
    SlotsConfirmed {
        count: usize,
    },
    AvailabilityUnclear,
    SlotsRemoved {
        count: usize,
    },
    ProposeSlot {
        slot: Slot,
    },
    MeetingScheduled {
        slot: Slot,
    },
    NoSlotsRemaining,
    RequestMoreAvailability {
        attempt: u32,
        waiting: Vec<String>,
    },
    NameTargetPrompt {
        action: TargetAction,
    },
    UnknownInterviewee {
        name: String,
    },
    MeetingCancelled {
        interviewee: String,
    },
    NothingToCancel,
    NothingToReschedule,
    RescheduleStarted {
        interviewee: String,
    },
    AnswerQuery {
        question: String,
    },
    StatusUpdate {
        state: ParticipantState,
        scheduled: Option<Slot>,
    },
    FinalReport {
        lines: Vec<String>,
    },
    AttentionAlert {
        raised: Vec<FlagType>,
    },
    /// Generic apology; participants never see raw errors.
    Apology,
}

impl MessageDirective {
    /// Stable snake_case name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Greeting { .. } => "greeting",
            Self::RequestTimezone => "request_timezone",
            Self::ConfirmExtractedSlots { .. } => "confirm_extracted_slots",
            Self::SlotsConfirmed { .. } => "slots_confirmed",
            Self::AvailabilityUnclear => "availability_unclear",
            Self::SlotsRemoved { .. } => "slots_removed",
            Self::ProposeSlot { .. } => "propose_slot",
            Self::MeetingScheduled { .. } => "meeting_scheduled",
            Self::NoSlotsRemaining => "no_slots_remaining",
            Self::RequestMoreAvailability { .. } => "request_more_availability",
            Self::NameTargetPrompt { .. } => "name_target_prompt",
            Self::UnknownInterviewee { .. } => "unknown_interviewee",
            Self::MeetingCancelled { .. } => "meeting_cancelled",
            Self::NothingToCancel => "nothing_to_cancel",
            Self::NothingToReschedule => "nothing_to_reschedule",
            Self::RescheduleStarted { .. } => "reschedule_started",
            Self::AnswerQuery { .. } => "answer_query",
            Self::StatusUpdate { .. } => "status_update",
            Self::FinalReport { .. } => "final_report",
            Self::AttentionAlert { .. } => "attention_alert",
            Self::Apology => "apology",
        }
    }
}

/// Something the outside world must do as a consequence of a transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "effect")]
pub enum SideEffect {
    Notify {
        audience: Audience,
        directive: MessageDirective,
    },
    CreateCalendarEvent {
        participant: ParticipantId,
        slot: Slot,
    },
    DeleteCalendarEvent {
        participant: ParticipantId,
        event_id: CalendarEventId,
    },
}

impl SideEffect {
    pub fn notify(audience: Audience, directive: MessageDirective) -> Self {
        Self::Notify {
            audience,
            directive,
        }
    }

    pub fn notify_participant(id: &ParticipantId, directive: MessageDirective) -> Self {
        Self::notify(Audience::Participant(id.clone()), directive)
    }

    /// Fail-closed effects must succeed before the new state may be persisted.
    pub fn is_fail_closed(&self) -> bool {
        matches!(self, Self::DeleteCalendarEvent { .. })
    }
}
