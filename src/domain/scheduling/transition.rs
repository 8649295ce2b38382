//! Pure participant transition function.
//!
//! `transition(participant, event)` decides the next state and the side
//! effects that should follow, without touching the participant or doing any
//! I/O. The conversation aggregate applies the result.

use crate::domain::foundation::ParticipantId;

use super::{
    Audience, MessageDirective, Participant, ParticipantState, Role, SchedulingError,
    SideEffect, Slot, TargetAction,
};

/// Something that happened to a participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParticipantEvent {
    TimezoneResolved,
    TimezoneUnresolved,
    SlotsExtracted { slots: Vec<Slot> },
    NothingExtracted,
    SlotsConfirmed { count: usize },
    SlotsRejected { replacement: Vec<Slot> },
    MoreSlotsRequested { attempt: u32, waiting: Vec<String> },
    SlotOffered { slot: Slot },
    OfferAccepted { slot: Slot },
    OfferDeclined { untried_remaining: bool },
    PoolExhausted,
    PoolReplenished,
    TargetPromptOpened { action: TargetAction },
    TargetPromptClosed { resume: ParticipantState },
    Cancelled,
    RescheduleRequested,
}

impl ParticipantEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::TimezoneResolved => "timezone_resolved",
            Self::TimezoneUnresolved => "timezone_unresolved",
            Self::SlotsExtracted { .. } => "slots_extracted",
            Self::NothingExtracted => "nothing_extracted",
            Self::SlotsConfirmed { .. } => "slots_confirmed",
            Self::SlotsRejected { .. } => "slots_rejected",
            Self::MoreSlotsRequested { .. } => "more_slots_requested",
            Self::SlotOffered { .. } => "slot_offered",
            Self::OfferAccepted { .. } => "offer_accepted",
            Self::OfferDeclined { .. } => "offer_declined",
            Self::PoolExhausted => "pool_exhausted",
            Self::PoolReplenished => "pool_replenished",
            Self::TargetPromptOpened { .. } => "target_prompt_opened",
            Self::TargetPromptClosed { .. } => "target_prompt_closed",
            Self::Cancelled => "cancelled",
            Self::RescheduleRequested => "reschedule_requested",
        }
    }
}

/// Outcome of a transition: the next state plus what should happen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: ParticipantState,
    pub effects: Vec<SideEffect>,
}

impl Transition {
    fn to(next: ParticipantState) -> Self {
        Self {
            next,
            effects: Vec::new(),
        }
    }

    fn with(mut self, effect: SideEffect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Decides how `participant` reacts to `event`.
///
/// Returns `InvalidTransition` when the event makes no sense for the
/// participant's role and state; the caller drops the event.
pub fn transition(
    participant: &Participant,
    event: &ParticipantEvent,
) -> Result<Transition, SchedulingError> {
    use ParticipantEvent as E;
    use ParticipantState as S;

    let id = participant.id();
    let state = participant.state();
    let invalid = || SchedulingError::InvalidTransition {
        state,
        event: event.name(),
    };

    let outcome = match (participant.role(), state, event) {
        // ── timezone resolution (interviewees) ───────────────────────
        (Role::Interviewee, S::TimezoneClarification | S::AwaitingAvailability, E::TimezoneResolved) => {
            Transition::to(S::AwaitingAvailability)
        }
        (Role::Interviewee, S::TimezoneClarification | S::AwaitingAvailability, E::TimezoneUnresolved) => {
            Transition::to(S::TimezoneClarification).with(notify(id, MessageDirective::RequestTimezone))
        }

        // ── interviewer availability ──────────────────────────────────
        (Role::Interviewer, s, E::SlotsExtracted { slots }) if accepts_availability(s) => {
            Transition::to(S::AwaitingSlotConfirmation).with(notify(
                id,
                MessageDirective::ConfirmExtractedSlots {
                    slots: slots.clone(),
                },
            ))
        }
        (Role::Interviewer, s, E::NothingExtracted) if accepts_availability(s) => {
            Transition::to(s).with(notify(id, MessageDirective::AvailabilityUnclear))
        }
        (Role::Interviewer, S::AwaitingSlotConfirmation, E::SlotsConfirmed { count }) => {
            Transition::to(S::ConversationActive)
                .with(notify(id, MessageDirective::SlotsConfirmed { count: *count }))
        }
        (Role::Interviewer, S::AwaitingSlotConfirmation, E::SlotsRejected { replacement }) => {
            if replacement.is_empty() {
                Transition::to(S::ConversationActive)
                    .with(notify(id, MessageDirective::AvailabilityUnclear))
            } else {
                Transition::to(S::AwaitingSlotConfirmation).with(notify(
                    id,
                    MessageDirective::ConfirmExtractedSlots {
                        slots: replacement.clone(),
                    },
                ))
            }
        }
        (Role::Interviewer, S::ConversationActive, E::MoreSlotsRequested { attempt, waiting }) => {
            Transition::to(S::AwaitingMoreSlotsFromInterviewer).with(notify(
                id,
                MessageDirective::RequestMoreAvailability {
                    attempt: *attempt,
                    waiting: waiting.clone(),
                },
            ))
        }
        (Role::Interviewer, _, E::TargetPromptOpened { action }) => {
            Transition::to(S::AwaitingCancellationIntervieweeName)
                .with(notify(id, MessageDirective::NameTargetPrompt { action: *action }))
        }
        (Role::Interviewer, S::AwaitingCancellationIntervieweeName, E::TargetPromptClosed { resume }) => {
            Transition::to(*resume)
        }

        // ── negotiation (interviewees) ────────────────────────────────
        (Role::Interviewee, S::AwaitingAvailability, E::SlotOffered { slot }) => {
            Transition::to(S::ConfirmationPending)
                .with(notify(id, MessageDirective::ProposeSlot { slot: *slot }))
        }
        (Role::Interviewee, S::ConfirmationPending, E::OfferAccepted { slot }) => {
            Transition::to(S::Scheduled)
                .with(SideEffect::CreateCalendarEvent {
                    participant: id.clone(),
                    slot: *slot,
                })
                .with(notify(id, MessageDirective::MeetingScheduled { slot: *slot }))
        }
        (Role::Interviewee, S::ConfirmationPending, E::OfferDeclined { untried_remaining }) => {
            if *untried_remaining {
                Transition::to(S::AwaitingAvailability)
            } else {
                Transition::to(S::NoSlotsAvailable)
                    .with(notify(id, MessageDirective::NoSlotsRemaining))
            }
        }
        (Role::Interviewee, S::AwaitingAvailability, E::PoolExhausted) => {
            Transition::to(S::NoSlotsAvailable).with(notify(id, MessageDirective::NoSlotsRemaining))
        }
        (Role::Interviewee, S::NoSlotsAvailable, E::PoolReplenished) => {
            Transition::to(S::AwaitingAvailability)
        }

        // ── cancellation and reschedule ───────────────────────────────
        (Role::Interviewee, s, E::Cancelled) if s != S::Cancelled => {
            let cancelled = MessageDirective::MeetingCancelled {
                interviewee: participant.name().to_string(),
            };
            with_event_deletion(Transition::to(S::Cancelled), participant)
                .with(notify(id, cancelled.clone()))
                .with(SideEffect::notify(Audience::Interviewer, cancelled))
        }
        (Role::Interviewee, S::Scheduled, E::RescheduleRequested) => {
            with_event_deletion(Transition::to(S::AwaitingAvailability), participant).with(notify(
                id,
                MessageDirective::RescheduleStarted {
                    interviewee: participant.name().to_string(),
                },
            ))
        }

        _ => return Err(invalid()),
    };

    Ok(outcome)
}

/// Interviewer states in which a message may carry new availability.
fn accepts_availability(state: ParticipantState) -> bool {
    use ParticipantState as S;
    matches!(
        state,
        S::AwaitingAvailability
            | S::AwaitingSlotConfirmation
            | S::AwaitingMoreSlotsFromInterviewer
            | S::ConversationActive
    )
}

fn notify(id: &ParticipantId, directive: MessageDirective) -> SideEffect {
    SideEffect::notify_participant(id, directive)
}

/// Calendar deletion always comes first so it can fail the whole step.
fn with_event_deletion(transition: Transition, participant: &Participant) -> Transition {
    match participant.event_id() {
        Some(event_id) => {
            let mut effects = vec![SideEffect::DeleteCalendarEvent {
                participant: participant.id().clone(),
                event_id: event_id.clone(),
            }];
            effects.extend(transition.effects);
            Transition {
                next: transition.next,
                effects,
            }
        }
        None => transition,
    }
}
