//! Executes the side effects a conversation step produced.
//!
//! Two phases:
//!
//! 1. Calendar deletions. They fail closed: if one cannot be done after
//!    retries the whole step is abandoned and nothing is persisted. A
//!    deletion that reports "not found" counts as done.
//! 2. Notifications and calendar creations. Their failures are logged and
//!    reported but never undo the step; a participant already told
//!    "scheduled" stays scheduled even if the event could not be created.

use std::sync::Arc;

use crate::domain::foundation::{ParticipantId, Timestamp};
use crate::domain::scheduling::{Audience, Conversation, MessageDirective, SideEffect, Slot};
use crate::ports::{
    CalendarEventRequest, CalendarService, ComposeContext, MessageComposer, MessagingGateway,
};

use super::{OrchestratorError, RetryPolicy};

/// What happened in phase 2.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectReport {
    pub delivered: usize,
    pub undelivered: Vec<ParticipantId>,
    pub events_created: usize,
    pub event_failures: Vec<ParticipantId>,
}

impl EffectReport {
    pub fn is_clean(&self) -> bool {
        self.undelivered.is_empty() && self.event_failures.is_empty()
    }
}

/// Runs side effects against the external collaborators.
pub struct EffectExecutor {
    composer: Arc<dyn MessageComposer>,
    gateway: Arc<dyn MessagingGateway>,
    calendar: Arc<dyn CalendarService>,
    retry: RetryPolicy,
}

impl EffectExecutor {
    pub fn new(
        composer: Arc<dyn MessageComposer>,
        gateway: Arc<dyn MessagingGateway>,
        calendar: Arc<dyn CalendarService>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            composer,
            gateway,
            calendar,
            retry,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Phase 1: every `DeleteCalendarEvent` in `effects`, in order.
    ///
    /// # Errors
    ///
    /// `External` on the first deletion that still fails after retries.
    pub async fn run_deletions(
        &self,
        conversation: &Conversation,
        effects: &[SideEffect],
    ) -> Result<(), OrchestratorError> {
        for effect in effects.iter().filter(|e| e.is_fail_closed()) {
            let SideEffect::DeleteCalendarEvent {
                participant,
                event_id,
            } = effect
            else {
                continue;
            };

            let result = self
                .retry
                .run("calendar.delete_event", || self.calendar.delete_event(event_id))
                .await;

            match result {
                Ok(()) => {
                    tracing::info!(
                        conversation_id = %conversation.id(),
                        participant = %participant,
                        event_id = %event_id,
                        "calendar event deleted"
                    );
                }
                Err(e) if e.is_not_found() => {
                    tracing::debug!(
                        conversation_id = %conversation.id(),
                        event_id = %event_id,
                        "calendar event already gone"
                    );
                }
                Err(e) => {
                    tracing::error!(
                        conversation_id = %conversation.id(),
                        participant = %participant,
                        event_id = %event_id,
                        error = %e,
                        "calendar deletion failed, abandoning step"
                    );
                    return Err(OrchestratorError::external("calendar.delete_event", e));
                }
            }
        }
        Ok(())
    }

    /// Phase 2: notifications and calendar creations, in order.
    ///
    /// Records outbound history and created event ids on `conversation`.
    pub async fn run_remaining(
        &self,
        conversation: &mut Conversation,
        effects: Vec<SideEffect>,
        now: Timestamp,
    ) -> EffectReport {
        let mut report = EffectReport::default();

        for effect in effects {
            match effect {
                SideEffect::DeleteCalendarEvent { .. } => {}
                SideEffect::Notify {
                    audience,
                    directive,
                } => {
                    let Some(to) = conversation.resolve_audience(&audience) else {
                        tracing::debug!(
                            conversation_id = %conversation.id(),
                            directive = directive.name(),
                            "no recipient for audience, skipping"
                        );
                        continue;
                    };
                    match self.deliver(conversation, &to, &directive).await {
                        Ok(text) => {
                            conversation.record_outbound(&to, text, now);
                            report.delivered += 1;
                        }
                        Err(e) => {
                            tracing::error!(
                                conversation_id = %conversation.id(),
                                participant = %to,
                                directive = directive.name(),
                                error = %e,
                                "message not delivered"
                            );
                            report.undelivered.push(to);
                        }
                    }
                }
                SideEffect::CreateCalendarEvent { participant, slot } => {
                    match self.create_event(conversation, &participant, slot).await {
                        Ok(()) => report.events_created += 1,
                        Err(e) => {
                            tracing::error!(
                                conversation_id = %conversation.id(),
                                participant = %participant,
                                error = %e,
                                "calendar event not created; participant stays scheduled"
                            );
                            report.event_failures.push(participant);
                        }
                    }
                }
            }
        }

        report
    }

    /// Composes and sends one directive outside a conversation step.
    ///
    /// Used for apologies and operator alerts. Nothing is recorded.
    pub async fn notify(
        &self,
        conversation: &Conversation,
        audience: &Audience,
        directive: &MessageDirective,
    ) -> Result<Option<ParticipantId>, OrchestratorError> {
        let Some(to) = conversation.resolve_audience(audience) else {
            return Ok(None);
        };
        self.deliver(conversation, &to, directive).await?;
        Ok(Some(to))
    }

    async fn deliver(
        &self,
        conversation: &Conversation,
        to: &ParticipantId,
        directive: &MessageDirective,
    ) -> Result<String, OrchestratorError> {
        let context = compose_context(conversation, to);
        let text = self
            .retry
            .run("composer.compose", || self.composer.compose(&context, directive))
            .await
            .map_err(|e| OrchestratorError::external("composer.compose", e))?;

        self.retry
            .run("gateway.send", || self.gateway.send(to, &text))
            .await
            .map_err(|e| OrchestratorError::external("gateway.send", e))?;

        tracing::debug!(
            conversation_id = %conversation.id(),
            participant = %to,
            directive = directive.name(),
            "message delivered"
        );
        Ok(text)
    }

    async fn create_event(
        &self,
        conversation: &mut Conversation,
        participant: &ParticipantId,
        slot: Slot,
    ) -> Result<(), OrchestratorError> {
        let interviewer = conversation.interviewer();
        let interviewee = conversation.interviewee(participant)?;
        let request = CalendarEventRequest {
            conversation_id: conversation.id(),
            participant_id: participant.clone(),
            title: format!("Interview: {} with {}", interviewee.name(), interviewer.name()),
            slot,
            attendees: [interviewer.email(), interviewee.email()]
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect(),
            timezone: interviewee.timezone().map(str::to_string),
        };

        let event_id = self
            .retry
            .run("calendar.create_event", || self.calendar.create_event(&request))
            .await
            .map_err(|e| OrchestratorError::external("calendar.create_event", e))?;

        tracing::info!(
            conversation_id = %conversation.id(),
            participant = %participant,
            event_id = %event_id,
            "calendar event created"
        );
        conversation.record_event_id(participant, event_id)?;
        Ok(())
    }
}

/// Composer context for whoever `to` is: a participant or the contact.
fn compose_context(conversation: &Conversation, to: &ParticipantId) -> ComposeContext {
    let policy = conversation.policy();
    let (recipient_name, role, timezone) = match conversation.participant(to) {
        Some(p) => (
            p.name().to_string(),
            Some(p.role()),
            p.timezone().map(str::to_string),
        ),
        None => (
            policy
                .contact()
                .filter(|c| &c.number == to)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
            None,
            None,
        ),
    };
    ComposeContext {
        recipient_name,
        role,
        timezone,
        meeting_duration_minutes: policy.meeting_duration_minutes(),
        company_details: policy.company_details().map(str::to_string),
    }
}
