//! Participants and their negotiation states.
//!
//! A conversation has one interviewer and an ordered list of interviewees.
//! Both roles share one state enum; the transition table is role-agnostic and
//! the transition function in `transition.rs` decides which edges each role
//! actually takes.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{CalendarEventId, ParticipantId, StateMachine, Timestamp};

use super::{SchedulingError, Slot, SlotKey};

/// Which side of the interview a participant is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Interviewer,
    Interviewee,
}

/// Negotiation state of a single participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantState {
    /// Initial state. Interviewer: expected to send availability.
    /// Interviewee: waiting for the pool to yield an untried slot.
    #[default]
    AwaitingAvailability,

    /// Interviewer is confirming slots extracted from their own message.
    AwaitingSlotConfirmation,

    /// Interviewer was asked for more availability by escalation.
    AwaitingMoreSlotsFromInterviewer,

    /// Interviewee holds a proposed slot and must accept or decline.
    ConfirmationPending,

    /// Interviewee has no untried slot left in the pool.
    NoSlotsAvailable,

    /// Interview booked.
    Scheduled,

    /// Interviewee withdrawn from the conversation.
    Cancelled,

    /// Interviewer must name which interviewee a cancel/reschedule targets.
    AwaitingCancellationIntervieweeName,

    /// Timezone could not be inferred and was asked for.
    TimezoneClarification,

    /// Interviewer idle, nothing pending.
    ConversationActive,
}

impl ParticipantState {
    /// SCHEDULED and CANCELLED end an interviewee's negotiation.
    ///
    /// Unlike `StateMachine::is_terminal`, SCHEDULED still has outgoing
    /// edges (reschedule, cancel) but counts as settled for completion.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Scheduled | Self::Cancelled)
    }

    /// Upper snake case name used in reports and directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingAvailability => "AWAITING_AVAILABILITY",
            Self::AwaitingSlotConfirmation => "AWAITING_SLOT_CONFIRMATION",
            Self::AwaitingMoreSlotsFromInterviewer => "AWAITING_MORE_SLOTS_FROM_INTERVIEWER",
            Self::ConfirmationPending => "CONFIRMATION_PENDING",
            Self::NoSlotsAvailable => "NO_SLOTS_AVAILABLE",
            Self::Scheduled => "SCHEDULED",
            Self::Cancelled => "CANCELLED",
            Self::AwaitingCancellationIntervieweeName => "AWAITING_CANCELLATION_INTERVIEWEE_NAME",
            Self::TimezoneClarification => "TIMEZONE_CLARIFICATION",
            Self::ConversationActive => "CONVERSATION_ACTIVE",
        }
    }
}

impl fmt::Display for ParticipantState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for ParticipantState {
    fn can_transition_to(&self, target: &Self) -> bool {
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ParticipantState::*;
        match self {
            AwaitingAvailability => vec![
                AwaitingSlotConfirmation,
                ConfirmationPending,
                NoSlotsAvailable,
                TimezoneClarification,
                AwaitingCancellationIntervieweeName,
                Cancelled,
            ],
            AwaitingSlotConfirmation => vec![
                AwaitingSlotConfirmation,
                ConversationActive,
                AwaitingCancellationIntervieweeName,
            ],
            AwaitingMoreSlotsFromInterviewer => vec![
                AwaitingSlotConfirmation,
                ConversationActive,
                AwaitingCancellationIntervieweeName,
            ],
            ConfirmationPending => {
                vec![Scheduled, AwaitingAvailability, NoSlotsAvailable, Cancelled]
            }
            NoSlotsAvailable => vec![AwaitingAvailability, Cancelled],
            // Reschedule reopens negotiation
            Scheduled => vec![AwaitingAvailability, Cancelled],
            Cancelled => vec![],
            AwaitingCancellationIntervieweeName => vec![
                AwaitingCancellationIntervieweeName,
                AwaitingAvailability,
                AwaitingSlotConfirmation,
                AwaitingMoreSlotsFromInterviewer,
                ConversationActive,
            ],
            TimezoneClarification => vec![AwaitingAvailability, Cancelled],
            ConversationActive => vec![
                AwaitingSlotConfirmation,
                AwaitingMoreSlotsFromInterviewer,
                AwaitingCancellationIntervieweeName,
            ],
        }
    }
}

/// What an interviewer's pending name prompt will be used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetAction {
    Cancel,
    Reschedule,
}

/// An interviewer action waiting for an interviewee name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub action: TargetAction,
    /// State to return to once the prompt is answered.
    pub resume: ParticipantState,
}

/// Who wrote a history line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    Participant,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub at: Timestamp,
    pub sender: Sender,
    pub text: String,
}

/// A conversation member, addressed by normalized phone number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Participant {
    id: ParticipantId,
    name: String,
    email: Option<String>,
    role: Role,
    job_title: Option<String>,
    state: ParticipantState,
    timezone: Option<String>,
    history: Vec<HistoryEntry>,
    offered_slots: Vec<SlotKey>,
    proposed_slot: Option<Slot>,
    scheduled_slot: Option<Slot>,
    event_id: Option<CalendarEventId>,
    reschedule_count: u32,
    cancellation_count: u32,
    /// Interviewer only: extracted slots awaiting confirmation.
    #[serde(default)]
    staged_slots: Vec<Slot>,
    #[serde(default)]
    pending_action: Option<PendingAction>,
}

impl Participant {
    pub fn interviewer(id: ParticipantId, name: impl Into<String>, email: Option<String>) -> Self {
        Self::new(id, name.into(), email, Role::Interviewer, None)
    }

    pub fn interviewee(
        id: ParticipantId,
        name: impl Into<String>,
        email: Option<String>,
        job_title: Option<String>,
    ) -> Self {
        Self::new(id, name.into(), email, Role::Interviewee, job_title)
    }

    fn new(
        id: ParticipantId,
        name: String,
        email: Option<String>,
        role: Role,
        job_title: Option<String>,
    ) -> Self {
        Self {
            id,
            name,
            email,
            role,
            job_title,
            state: ParticipantState::AwaitingAvailability,
            timezone: None,
            history: Vec::new(),
            offered_slots: Vec::new(),
            proposed_slot: None,
            scheduled_slot: None,
            event_id: None,
            reschedule_count: 0,
            cancellation_count: 0,
            staged_slots: Vec::new(),
            pending_action: None,
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> &ParticipantId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn job_title(&self) -> Option<&str> {
        self.job_title.as_deref()
    }

    pub fn state(&self) -> ParticipantState {
        self.state
    }

    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    /// Every slot ever proposed to this participant, in offer order.
    pub fn offered_slots(&self) -> &[SlotKey] {
        &self.offered_slots
    }

    pub fn has_been_offered(&self, key: &SlotKey) -> bool {
        self.offered_slots.contains(key)
    }

    pub fn proposed_slot(&self) -> Option<Slot> {
        self.proposed_slot
    }

    pub fn scheduled_slot(&self) -> Option<Slot> {
        self.scheduled_slot
    }

    pub fn event_id(&self) -> Option<&CalendarEventId> {
        self.event_id.as_ref()
    }

    pub fn reschedule_count(&self) -> u32 {
        self.reschedule_count
    }

    pub fn cancellation_count(&self) -> u32 {
        self.cancellation_count
    }

    pub fn staged_slots(&self) -> &[Slot] {
        &self.staged_slots
    }

    pub fn pending_action(&self) -> Option<PendingAction> {
        self.pending_action
    }

    /// Interviewee that is neither scheduled nor cancelled.
    pub fn is_unscheduled(&self) -> bool {
        self.role == Role::Interviewee && !self.state.is_terminal()
    }

    /// Case-insensitive name match used for interviewer prompts.
    pub fn name_matches(&self, candidate: &str) -> bool {
        self.name.trim().eq_ignore_ascii_case(candidate.trim())
    }

    // ───────────────────────────────────────────────────────────────
    // Mutation (driven by the Conversation aggregate)
    // ───────────────────────────────────────────────────────────────

    /// Moves to `next`, validated against the transition table.
    /// Re-entering the current state is always allowed.
    pub(crate) fn enter(&mut self, next: ParticipantState) -> Result<(), SchedulingError> {
        if next != self.state {
            self.state = self.state.transition_to(next)?;
        }
        Ok(())
    }

    pub(crate) fn set_timezone(&mut self, timezone: impl Into<String>) {
        self.timezone = Some(timezone.into());
    }

    pub(crate) fn log(&mut self, sender: Sender, text: impl Into<String>, at: Timestamp) {
        self.history.push(HistoryEntry {
            at,
            sender,
            text: text.into(),
        });
    }

    pub(crate) fn hold(&mut self, slot: Slot) {
        let key = slot.key();
        if !self.offered_slots.contains(&key) {
            self.offered_slots.push(key);
        }
        self.proposed_slot = Some(slot);
    }

    pub(crate) fn release_hold(&mut self) -> Option<Slot> {
        self.proposed_slot.take()
    }

    pub(crate) fn book(&mut self, slot: Slot) {
        self.proposed_slot = None;
        self.scheduled_slot = Some(slot);
    }

    /// Clears the booking, returning the calendar event that backed it.
    pub(crate) fn unbook(&mut self) -> Option<CalendarEventId> {
        self.scheduled_slot = None;
        self.event_id.take()
    }

    pub(crate) fn set_event_id(&mut self, event_id: CalendarEventId) {
        self.event_id = Some(event_id);
    }

    pub(crate) fn count_reschedule(&mut self) {
        self.reschedule_count += 1;
    }

    pub(crate) fn count_cancellation(&mut self) {
        self.cancellation_count += 1;
    }

    pub(crate) fn stage_slots(&mut self, slots: Vec<Slot>) {
        self.staged_slots = slots;
    }

    pub(crate) fn take_staged_slots(&mut self) -> Vec<Slot> {
        std::mem::take(&mut self.staged_slots)
    }

    pub(crate) fn set_pending_action(&mut self, action: Option<PendingAction>) {
        self.pending_action = action;
    }
}
