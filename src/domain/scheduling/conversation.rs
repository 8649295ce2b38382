//! Conversation aggregate - one interviewer, many interviewees, one slot pool.
//!
//! The aggregate is the unit of consistency: the slot pool and every
//! participant record are read, mutated and written back together. Callers
//! serialize access per conversation id; the aggregate itself assumes it is
//! the only writer.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::foundation::{
    CalendarEventId, ConversationId, ParticipantId, StateMachine, Timestamp, ValidationError,
};

use super::{
    transition, Audience, CandidateSummary, MessageDirective, Participant, ParticipantEvent,
    ParticipantState, PendingAction, Role, SchedulingError, Sender, SideEffect, Slot, SlotPool,
    TargetAction, Transition,
};

/// Lifecycle of a conversation within its interviewer's queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationStatus {
    /// Waiting behind another active conversation of the same interviewer.
    #[default]
    Queued,
    Active,
    Completed,
}

impl ConversationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl StateMachine for ConversationStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use ConversationStatus::*;
        matches!((self, target), (Queued, Active) | (Active, Completed))
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use ConversationStatus::*;
        match self {
            Queued => vec![Active],
            Active => vec![Completed],
            Completed => vec![],
        }
    }
}

/// Why a conversation was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    /// Every interviewee is scheduled or cancelled.
    AllSettled,
    /// More-slot requests ran out with interviewees still unscheduled.
    EscalationExhausted,
}

/// Escalation contact alerted when attention flags are raised.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactPerson {
    pub name: String,
    pub number: ParticipantId,
    pub email: Option<String>,
}

/// Per-conversation settings fixed at intake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPolicy {
    meeting_duration_minutes: u32,
    contact: Option<ContactPerson>,
    company_details: Option<String>,
}

impl SchedulingPolicy {
    pub fn new(
        meeting_duration_minutes: u32,
        contact: Option<ContactPerson>,
        company_details: Option<String>,
    ) -> Result<Self, ValidationError> {
        if meeting_duration_minutes == 0 {
            return Err(ValidationError::out_of_range(
                "meeting_duration_minutes",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(Self {
            meeting_duration_minutes,
            contact,
            company_details,
        })
    }

    pub fn meeting_duration_minutes(&self) -> u32 {
        self.meeting_duration_minutes
    }

    pub fn contact(&self) -> Option<&ContactPerson> {
        self.contact.as_ref()
    }

    pub fn company_details(&self) -> Option<&str> {
        self.company_details.as_deref()
    }
}

/// The Conversation aggregate root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    id: ConversationId,
    status: ConversationStatus,
    interviewer: Participant,
    interviewees: Vec<Participant>,
    policy: SchedulingPolicy,
    pool: SlotPool,
    pool_opened: bool,
    more_slots_requests: u32,
    last_response_times: BTreeMap<ParticipantId, Timestamp>,
    completion_reason: Option<CompletionReason>,
    created_at: Timestamp,
    activated_at: Option<Timestamp>,
    completed_at: Option<Timestamp>,
}

impl Conversation {
    /// Creates a queued conversation.
    ///
    /// Rejects an empty interviewee list and duplicate participant numbers.
    pub fn new(
        interviewer: Participant,
        interviewees: Vec<Participant>,
        policy: SchedulingPolicy,
    ) -> Result<Self, ValidationError> {
        if interviewer.role() != Role::Interviewer {
            return Err(ValidationError::invalid_format(
                "interviewer",
                "participant is not an interviewer",
            ));
        }
        if interviewees.is_empty() {
            return Err(ValidationError::empty_field("interviewees"));
        }

        let mut seen = BTreeSet::new();
        seen.insert(interviewer.id().clone());
        for p in &interviewees {
            if p.role() != Role::Interviewee {
                return Err(ValidationError::invalid_format(
                    "interviewees",
                    format!("{} is not an interviewee", p.id()),
                ));
            }
            if !seen.insert(p.id().clone()) {
                return Err(ValidationError::invalid_format(
                    "number",
                    format!("duplicate participant number {}", p.id()),
                ));
            }
        }

        Ok(Self {
            id: ConversationId::new(),
            status: ConversationStatus::Queued,
            interviewer,
            interviewees,
            policy,
            pool: SlotPool::new(),
            pool_opened: false,
            more_slots_requests: 0,
            last_response_times: BTreeMap::new(),
            completion_reason: None,
            created_at: Timestamp::now(),
            activated_at: None,
            completed_at: None,
        })
    }

    // ───────────────────────────────────────────────────────────────
    // Accessors
    // ───────────────────────────────────────────────────────────────

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn status(&self) -> ConversationStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }

    pub fn interviewer(&self) -> &Participant {
        &self.interviewer
    }

    pub fn interviewees(&self) -> &[Participant] {
        &self.interviewees
    }

    pub fn policy(&self) -> &SchedulingPolicy {
        &self.policy
    }

    pub fn pool(&self) -> &SlotPool {
        &self.pool
    }

    /// True once the interviewer has confirmed a first batch of slots.
    pub fn is_pool_open(&self) -> bool {
        self.pool_opened
    }

    pub fn more_slots_requests(&self) -> u32 {
        self.more_slots_requests
    }

    pub fn last_response_times(&self) -> &BTreeMap<ParticipantId, Timestamp> {
        &self.last_response_times
    }

    pub fn last_response_of(&self, id: &ParticipantId) -> Option<Timestamp> {
        self.last_response_times.get(id).copied()
    }

    pub fn completion_reason(&self) -> Option<CompletionReason> {
        self.completion_reason
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn activated_at(&self) -> Option<Timestamp> {
        self.activated_at
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Interviewer first, then interviewees in intake order.
    pub fn participants(&self) -> impl Iterator<Item = &Participant> {
        std::iter::once(&self.interviewer).chain(self.interviewees.iter())
    }

    pub fn participant(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants().find(|p| p.id() == id)
    }

    pub fn is_interviewer(&self, id: &ParticipantId) -> bool {
        self.interviewer.id() == id
    }

    pub fn interviewee(&self, id: &ParticipantId) -> Result<&Participant, SchedulingError> {
        if self.is_interviewer(id) {
            return Err(SchedulingError::NotAnInterviewee(id.clone()));
        }
        self.interviewees
            .iter()
            .find(|p| p.id() == id)
            .ok_or_else(|| SchedulingError::ParticipantNotFound(id.clone()))
    }

    pub fn find_interviewee_by_name(&self, name: &str) -> Option<&Participant> {
        self.interviewees.iter().find(|p| p.name_matches(name))
    }

    /// Interviewees neither scheduled nor cancelled.
    pub fn unscheduled_ids(&self) -> BTreeSet<ParticipantId> {
        self.interviewees
            .iter()
            .filter(|p| p.is_unscheduled())
            .map(|p| p.id().clone())
            .collect()
    }

    pub fn scheduled_interviewees(&self) -> impl Iterator<Item = &Participant> {
        self.interviewees
            .iter()
            .filter(|p| p.state() == ParticipantState::Scheduled)
    }

    pub fn all_interviewees_settled(&self) -> bool {
        self.interviewees.iter().all(|p| p.state().is_terminal())
    }

    /// Resolves an audience to a participant id. `Contact` is not a
    /// participant and resolves to the contact person's number, if any.
    pub fn resolve_audience(&self, audience: &Audience) -> Option<ParticipantId> {
        match audience {
            Audience::Participant(id) => Some(id.clone()),
            Audience::Interviewer => Some(self.interviewer.id().clone()),
            Audience::Contact => self.policy.contact().map(|c| c.number.clone()),
        }
    }

    /// One line per interviewee for the interviewer's final report.
    pub fn report_lines(&self) -> Vec<String> {
        self.interviewees
            .iter()
            .map(|p| match (p.state(), p.scheduled_slot()) {
                (ParticipantState::Scheduled, Some(slot)) => format!(
                    "{} => Scheduled at {}",
                    p.name(),
                    slot.start.to_report_string()
                ),
                (state, _) => format!("{} => {}", p.name(), state),
            })
            .collect()
    }

    // ───────────────────────────────────────────────────────────────
    // Lifecycle
    // ───────────────────────────────────────────────────────────────

    /// Promotes a queued conversation to active.
    pub fn activate(&mut self, now: Timestamp) -> Result<(), SchedulingError> {
        self.status = self.status.transition_to(ConversationStatus::Active)?;
        self.activated_at = Some(now);
        Ok(())
    }

    /// The interviewer greeting that opens negotiation.
    pub fn greeting(&self) -> SideEffect {
        let candidates = self
            .interviewees
            .iter()
            .map(|p| CandidateSummary {
                name: p.name().to_string(),
                job_title: p.job_title().map(str::to_string),
            })
            .collect();
        SideEffect::notify(
            Audience::Interviewer,
            MessageDirective::Greeting {
                candidates,
                meeting_duration_minutes: self.policy.meeting_duration_minutes(),
            },
        )
    }

    pub(crate) fn complete(&mut self, reason: CompletionReason, now: Timestamp) -> Result<SideEffect, SchedulingError> {
        self.status = self.status.transition_to(ConversationStatus::Completed)?;
        self.completion_reason = Some(reason);
        self.completed_at = Some(now);
        Ok(SideEffect::notify(
            Audience::Interviewer,
            MessageDirective::FinalReport {
                lines: self.report_lines(),
            },
        ))
    }

    pub(crate) fn ensure_active(&self) -> Result<(), SchedulingError> {
        if self.is_active() {
            Ok(())
        } else {
            Err(SchedulingError::ConversationClosed)
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Messages
    // ───────────────────────────────────────────────────────────────

    /// Logs an inbound message and stamps the sender's last response time.
    pub fn record_inbound(
        &mut self,
        from: &ParticipantId,
        text: impl Into<String>,
        at: Timestamp,
    ) -> Result<(), SchedulingError> {
        self.participant_mut(from)?.log(Sender::Participant, text, at);
        self.last_response_times.insert(from.clone(), at);
        Ok(())
    }

    /// Logs a message the system sent. Unknown recipients (the contact
    /// person) have no history and are ignored.
    pub fn record_outbound(&mut self, to: &ParticipantId, text: impl Into<String>, at: Timestamp) {
        if let Ok(p) = self.participant_mut(to) {
            p.log(Sender::System, text, at);
        }
    }

    pub fn record_event_id(
        &mut self,
        id: &ParticipantId,
        event_id: CalendarEventId,
    ) -> Result<(), SchedulingError> {
        self.interviewee_mut(id)?.set_event_id(event_id);
        Ok(())
    }

    // ───────────────────────────────────────────────────────────────
    // Timezones
    // ───────────────────────────────────────────────────────────────

    /// Applies the outcome of timezone inference for one participant.
    ///
    /// The interviewer never enters clarification; their timezone may also
    /// arrive later with extracted availability.
    pub fn resolve_timezone(
        &mut self,
        id: &ParticipantId,
        timezone: Option<String>,
    ) -> Result<Vec<SideEffect>, SchedulingError> {
        if self.is_interviewer(id) {
            if let Some(tz) = timezone {
                self.interviewer.set_timezone(tz);
            }
            return Ok(Vec::new());
        }

        match timezone {
            Some(tz) => {
                self.interviewee_mut(id)?.set_timezone(tz);
                self.apply(id, ParticipantEvent::TimezoneResolved)
            }
            None => self.apply(id, ParticipantEvent::TimezoneUnresolved),
        }
    }

    // ───────────────────────────────────────────────────────────────
    // Interviewer availability
    // ───────────────────────────────────────────────────────────────

    /// Stages slots extracted from an interviewer message for confirmation.
    pub fn stage_availability(
        &mut self,
        slots: Vec<Slot>,
        timezone: Option<String>,
    ) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        if let Some(tz) = timezone {
            if self.interviewer.timezone().is_none() {
                self.interviewer.set_timezone(tz);
            }
        }
        let id = self.interviewer.id().clone();
        if slots.is_empty() {
            return self.apply(&id, ParticipantEvent::NothingExtracted);
        }
        let effects = self.apply(&id, ParticipantEvent::SlotsExtracted { slots: slots.clone() })?;
        self.interviewer.stage_slots(slots);
        Ok(effects)
    }

    /// Publishes the staged slots into the pool and opens it.
    pub fn confirm_staged_availability(&mut self) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let id = self.interviewer.id().clone();
        let staged = self.interviewer.staged_slots().to_vec();
        let count = staged.iter().filter(|s| !self.pool.knows(&s.key())).count();
        let effects = self.apply(&id, ParticipantEvent::SlotsConfirmed { count })?;
        self.interviewer.take_staged_slots();
        self.pool.publish(staged);
        self.pool_opened = true;
        Ok(effects)
    }

    /// Discards staged slots, staging `replacement` instead when non-empty.
    pub fn reject_staged_availability(
        &mut self,
        replacement: Vec<Slot>,
    ) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let id = self.interviewer.id().clone();
        let effects = self.apply(
            &id,
            ParticipantEvent::SlotsRejected {
                replacement: replacement.clone(),
            },
        )?;
        self.interviewer.stage_slots(replacement);
        Ok(effects)
    }

    /// Removes slots from the free pool. Held and booked slots are untouched.
    pub fn withdraw_availability(&mut self, slots: &[Slot]) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let keys: Vec<_> = slots.iter().map(Slot::key).collect();
        let count = self.pool.withdraw(&keys);
        Ok(vec![SideEffect::notify(
            Audience::Interviewer,
            MessageDirective::SlotsRemoved { count },
        )])
    }

    // ───────────────────────────────────────────────────────────────
    // Interviewer name prompts
    // ───────────────────────────────────────────────────────────────

    /// Asks the interviewer which interviewee a cancel/reschedule is for.
    pub fn open_target_prompt(&mut self, action: TargetAction) -> Result<Vec<SideEffect>, SchedulingError> {
        self.ensure_active()?;
        let resume = match self.interviewer.pending_action() {
            Some(pending) => pending.resume,
            None => self.interviewer.state(),
        };
        let id = self.interviewer.id().clone();
        let effects = self.apply(&id, ParticipantEvent::TargetPromptOpened { action })?;
        self.interviewer
            .set_pending_action(Some(PendingAction { action, resume }));
        Ok(effects)
    }

    /// Closes an open prompt, returning the interviewer to where they were.
    pub fn close_target_prompt(&mut self) -> Result<Option<PendingAction>, SchedulingError> {
        let Some(pending) = self.interviewer.pending_action() else {
            return Ok(None);
        };
        let id = self.interviewer.id().clone();
        self.apply(
            &id,
            ParticipantEvent::TargetPromptClosed {
                resume: pending.resume,
            },
        )?;
        self.interviewer.set_pending_action(None);
        Ok(Some(pending))
    }

    // ───────────────────────────────────────────────────────────────
    // Internals shared with the negotiation module
    // ───────────────────────────────────────────────────────────────

    /// Runs the pure transition function and applies its next state.
    pub(crate) fn apply(
        &mut self,
        id: &ParticipantId,
        event: ParticipantEvent,
    ) -> Result<Vec<SideEffect>, SchedulingError> {
        let participant = self.participant_mut(id)?;
        let Transition { next, effects } = transition(participant, &event)?;
        participant.enter(next)?;
        Ok(effects)
    }

    pub(crate) fn participant_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, SchedulingError> {
        if self.interviewer.id() == id {
            return Ok(&mut self.interviewer);
        }
        self.interviewees
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| SchedulingError::ParticipantNotFound(id.clone()))
    }

    pub(crate) fn interviewee_mut(&mut self, id: &ParticipantId) -> Result<&mut Participant, SchedulingError> {
        if self.is_interviewer(id) {
            return Err(SchedulingError::NotAnInterviewee(id.clone()));
        }
        self.interviewees
            .iter_mut()
            .find(|p| p.id() == id)
            .ok_or_else(|| SchedulingError::ParticipantNotFound(id.clone()))
    }

    pub(crate) fn pool_mut(&mut self) -> &mut SlotPool {
        &mut self.pool
    }

    pub(crate) fn interviewee_ids(&self) -> Vec<ParticipantId> {
        self.interviewees.iter().map(|p| p.id().clone()).collect()
    }

    pub(crate) fn count_more_slots_request(&mut self) -> u32 {
        self.more_slots_requests += 1;
        self.more_slots_requests
    }
}
