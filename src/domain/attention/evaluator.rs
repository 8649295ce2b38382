//! Pure stall detection over one conversation snapshot.

use chrono::Duration;

use crate::domain::foundation::Timestamp;
use crate::domain::scheduling::{
    Conversation, ConversationStatus, Participant, ParticipantState, Role,
};

use super::{AttentionFlag, FlagType};

/// Time limits the evaluator checks against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttentionThresholds {
    pub no_response: Duration,
    pub missed_meeting_window: Duration,
}

impl Default for AttentionThresholds {
    fn default() -> Self {
        Self {
            no_response: Duration::hours(24),
            missed_meeting_window: Duration::minutes(60),
        }
    }
}

/// Returns the flags `conversation` should carry at `now` that are not
/// already among `open` (unresolved flags for this conversation).
///
/// Active conversations are checked for silence, exhausted interviewees and
/// missed meetings. Completed ones still hold booked interviews, so they are
/// checked for missed meetings only. Queued ones are never checked.
pub fn evaluate(
    conversation: &Conversation,
    now: Timestamp,
    thresholds: &AttentionThresholds,
    open: &[AttentionFlag],
) -> Vec<AttentionFlag> {
    let negotiating = match conversation.status() {
        ConversationStatus::Active => true,
        ConversationStatus::Completed => false,
        ConversationStatus::Queued => return Vec::new(),
    };

    let silence_since = conversation
        .activated_at()
        .unwrap_or_else(|| conversation.created_at());

    let mut raised = Vec::new();
    for participant in conversation.participants() {
        let mut candidates = Vec::new();

        if negotiating && awaits_reply(participant) {
            let last = conversation
                .last_response_of(participant.id())
                .unwrap_or(silence_since);
            if now.duration_since(&last) > thresholds.no_response {
                candidates.push(FlagType::NoResponse);
            }
        }

        if participant.state() == ParticipantState::Scheduled {
            if let Some(slot) = participant.scheduled_slot() {
                let window_end = slot.start.plus(thresholds.missed_meeting_window);
                if now.is_after(&slot.start) && !now.is_after(&window_end) {
                    candidates.push(FlagType::MissedScheduledMeeting);
                }
            }
        }

        if negotiating && participant.state() == ParticipantState::NoSlotsAvailable {
            candidates.push(FlagType::NoAvailableSlots);
        }

        for flag_type in candidates {
            let already_open = open
                .iter()
                .any(|f| !f.is_resolved() && f.concerns(participant.id(), flag_type));
            if !already_open {
                raised.push(AttentionFlag::raise(
                    conversation.id(),
                    participant.id().clone(),
                    flag_type,
                    now,
                ));
            }
        }
    }
    raised
}

/// Whether the engine is blocked on an answer from this participant.
///
/// Interviewees waiting on the pool or on the interviewer were never asked
/// anything, so their silence is not a stall.
fn awaits_reply(participant: &Participant) -> bool {
    use ParticipantState as S;
    match participant.role() {
        Role::Interviewer => participant.state() != S::ConversationActive,
        Role::Interviewee => matches!(
            participant.state(),
            S::ConfirmationPending | S::TimezoneClarification
        ),
    }
}
