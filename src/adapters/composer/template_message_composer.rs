//! Template Message Composer
//!
//! Deterministic English wording for every directive. Times are rendered in
//! UTC with the recipient's zone named alongside, which keeps output stable
//! across machines.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::domain::scheduling::{MessageDirective, Role, Slot, TargetAction};
use crate::ports::{ComposeContext, MessageComposer, ServiceError};

/// NLG collaborator backed by fixed templates.
#[derive(Debug, Clone, Default)]
pub struct TemplateMessageComposer {
    failures: Arc<Mutex<VecDeque<ServiceError>>>,
}

impl TemplateMessageComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails the next compose call.
    pub fn with_failure(self, error: ServiceError) -> Self {
        self.fail_next(error);
        self
    }

    pub fn fail_next(&self, error: ServiceError) {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push_back(error);
    }

    fn take_failure(&self) -> Option<ServiceError> {
        self.failures
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
    }
}

fn slot_text(slot: &Slot, timezone: Option<&str>) -> String {
    let base = format!(
        "{} to {}",
        slot.start.to_report_string(),
        slot.end.as_datetime().format("%H:%M UTC")
    );
    match timezone {
        Some(tz) if tz != "UTC" => format!("{} (your zone: {})", base, tz),
        _ => base,
    }
}

fn action_word(action: TargetAction) -> &'static str {
    match action {
        TargetAction::Cancel => "cancel",
        TargetAction::Reschedule => "reschedule",
    }
}

/// Renders `directive` for the recipient in `ctx`.
pub fn render(ctx: &ComposeContext, directive: &MessageDirective) -> String {
    let name = &ctx.recipient_name;
    let tz = ctx.timezone.as_deref();

    match directive {
        MessageDirective::Greeting {
            candidates,
            meeting_duration_minutes,
        } => {
            let company = ctx
                .company_details
                .as_deref()
                .map(|c| format!(" on behalf of {}", c))
                .unwrap_or_default();
            let list = candidates
                .iter()
                .map(|c| match &c.job_title {
                    Some(title) => format!("- {} ({})", c.name, title),
                    None => format!("- {}", c.name),
                })
                .collect::<Vec<_>>()
                .join("\n");
            format!(
                "Hi {}, I'm scheduling interviews{}. Candidates:\n{}\nEach interview is {} minutes. When are you available?",
                name, company, list, meeting_duration_minutes
            )
        }
        MessageDirective::RequestTimezone => format!(
            "Hi {}, which city or timezone are you in? I'll use it to suggest interview times.",
            name
        ),
        MessageDirective::ConfirmExtractedSlots { slots } => {
            let list = slots
                .iter()
                .map(|s| format!("- {}", slot_text(s, tz)))
                .collect::<Vec<_>>()
                .join("\n");
            format!("I understood these slots:\n{}\nIs that correct?", list)
        }
        MessageDirective::SlotsConfirmed { count } => {
            format!("Thanks, {} new slot(s) added. I'll reach out to the candidates.", count)
        }
        MessageDirective::AvailabilityUnclear => {
            "Sorry, I couldn't read any times from that. Could you list your availability?".to_string()
        }
        MessageDirective::SlotsRemoved { count } => format!("Removed {} slot(s).", count),
        MessageDirective::ProposeSlot { slot } => format!(
            "Hi {}, would {} work for your interview?",
            name,
            slot_text(slot, tz)
        ),
        MessageDirective::MeetingScheduled { slot } => format!(
            "Great, your interview is booked for {}.",
            slot_text(slot, tz)
        ),
        MessageDirective::NoSlotsRemaining => {
            "Sorry, there are no more open times right now. I'll be in touch when more open up."
                .to_string()
        }
        MessageDirective::RequestMoreAvailability { attempt, waiting } => format!(
            "{} still need a time. Could you share more availability? (request {})",
            waiting.join(", "),
            attempt
        ),
        MessageDirective::NameTargetPrompt { action } => format!(
            "Which candidate would you like to {}? Please reply with their name.",
            action_word(*action)
        ),
        MessageDirective::UnknownInterviewee { name: unknown } => format!(
            "I couldn't find a candidate called \"{}\". Please reply with one of the candidate names.",
            unknown
        ),
        MessageDirective::MeetingCancelled { interviewee } => {
            if ctx.role == Some(Role::Interviewee) {
                "Your interview has been cancelled.".to_string()
            } else {
                format!("The interview with {} has been cancelled.", interviewee)
            }
        }
        MessageDirective::NothingToCancel => "There is nothing to cancel.".to_string(),
        MessageDirective::NothingToReschedule => "There is nothing to reschedule.".to_string(),
        MessageDirective::RescheduleStarted { interviewee } => format!(
            "Rescheduling the interview with {}. I'll propose a new time shortly.",
            interviewee
        ),
        MessageDirective::AnswerQuery { question } => format!(
            "Thanks for asking about \"{}\". Each interview is {} minutes; reply here any time to change your plans.",
            question.trim(),
            ctx.meeting_duration_minutes
        ),
        MessageDirective::StatusUpdate { state, scheduled } => match scheduled {
            Some(slot) => format!("Your interview is booked for {}.", slot_text(slot, tz)),
            None => format!("Your scheduling status is {}. I'll be in touch.", state),
        },
        MessageDirective::FinalReport { lines } => {
            format!("Scheduling is complete:\n{}", lines.join("\n"))
        }
        MessageDirective::AttentionAlert { raised } => format!(
            "Hi {}, a scheduling conversation needs attention: {}.",
            name,
            raised
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        ),
        MessageDirective::Apology => {
            "Sorry, something went wrong on our side. Please try again in a moment.".to_string()
        }
    }
}

#[async_trait]
impl MessageComposer for TemplateMessageComposer {
    async fn compose(
        &self,
        context: &ComposeContext,
        directive: &MessageDirective,
    ) -> Result<String, ServiceError> {
        if let Some(error) = self.take_failure() {
            return Err(error);
        }
        Ok(render(context, directive))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::attention::FlagType;
    use crate::domain::foundation::Timestamp;
    use crate::domain::scheduling::CandidateSummary;
    use chrono::{TimeZone, Utc};

    fn ctx(role: Option<Role>) -> ComposeContext {
        ComposeContext {
            recipient_name: "Grace".to_string(),
            role,
            timezone: None,
            meeting_duration_minutes: 30,
            company_details: Some("Acme".to_string()),
        }
    }

    fn slot() -> Slot {
        let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
        Slot::new(start, start.plus_minutes(30)).unwrap()
    }

    #[test]
    fn greeting_lists_candidates_with_titles() {
        let text = render(
            &ctx(Some(Role::Interviewer)),
            &MessageDirective::Greeting {
                candidates: vec![
                    CandidateSummary {
                        name: "Ada".into(),
                        job_title: Some("Engineer".into()),
                    },
                    CandidateSummary {
                        name: "Linus".into(),
                        job_title: None,
                    },
                ],
                meeting_duration_minutes: 30,
            },
        );
        assert!(text.contains("on behalf of Acme"));
        assert!(text.contains("- Ada (Engineer)"));
        assert!(text.contains("- Linus\n"));
    }

    #[test]
    fn slots_render_in_report_format() {
        let text = render(&ctx(None), &MessageDirective::ProposeSlot { slot: slot() });
        assert!(text.contains("2026-03-02 09:00 UTC to 09:30 UTC"));
    }

    #[test]
    fn cancellation_wording_depends_on_role() {
        let directive = MessageDirective::MeetingCancelled {
            interviewee: "Ada".into(),
        };
        assert_eq!(
            render(&ctx(Some(Role::Interviewee)), &directive),
            "Your interview has been cancelled."
        );
        assert!(render(&ctx(Some(Role::Interviewer)), &directive).contains("with Ada"));
    }

    #[test]
    fn alert_names_flag_types() {
        let text = render(
            &ctx(None),
            &MessageDirective::AttentionAlert {
                raised: vec![FlagType::NoResponse, FlagType::NoAvailableSlots],
            },
        );
        assert!(text.contains("NO_RESPONSE, NO_AVAILABLE_SLOTS"));
    }

    #[tokio::test]
    async fn injected_failure_applies_once() {
        let composer = TemplateMessageComposer::new().with_failure(ServiceError::unavailable("down"));
        let c = ctx(None);
        assert!(composer.compose(&c, &MessageDirective::Apology).await.is_err());
        assert!(composer.compose(&c, &MessageDirective::Apology).await.is_ok());
    }
}
