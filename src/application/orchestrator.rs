//! ConversationOrchestrator - drives conversations from inbound events.
//!
//! Every event runs the same cycle under the conversation's lock:
//!
//! 1. Load the stored conversation
//! 2. Ask the NLU what the message means
//! 3. Apply the matching domain operation, then `advance`
//! 4. Run calendar deletions (fail closed), persist, then run the rest
//!    of the side effects and persist what they recorded
//!
//! When a step completes the conversation, the interviewer's queue is
//! advanced after the conversation lock is released.

use std::sync::Arc;

use crate::domain::attention::FlagType;
use crate::domain::foundation::{ConversationId, ParticipantId, Timestamp};
use crate::domain::scheduling::{
    Audience, Conversation, ConversationStatus, MessageDirective, Participant, ParticipantState,
    Role, SideEffect, TargetAction,
};
use crate::ports::{
    AttentionFlagRepository, ConversationRepository, Intent, LanguageUnderstanding, SlotExtraction,
};

use super::{
    Admission, ConversationLocks, EffectExecutor, EffectReport, InterviewerQueue,
    OrchestratorError, RetryPolicy,
};

/// Negotiation settings shared by all conversations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    /// "Need more slots" requests before a stuck conversation is closed.
    pub max_more_slot_requests: u32,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_more_slot_requests: 2,
        }
    }
}

/// Result of `start`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartResult {
    pub conversation_id: ConversationId,
    pub admission: Admission,
}

/// Result of handling one inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageOutcome {
    pub conversation_id: ConversationId,
    pub participant: ParticipantId,
    pub intent: Intent,
    /// Sender's state after the step.
    pub state: ParticipantState,
    /// True if this message completed the conversation.
    pub completed: bool,
    pub effects: EffectReport,
}

/// Drives conversations: intake, inbound messages, queue promotion, deletion.
pub struct ConversationOrchestrator {
    conversations: Arc<dyn ConversationRepository>,
    flags: Arc<dyn AttentionFlagRepository>,
    nlu: Arc<dyn LanguageUnderstanding>,
    effects: Arc<EffectExecutor>,
    locks: Arc<ConversationLocks>,
    queue: InterviewerQueue,
    config: OrchestratorConfig,
}

impl ConversationOrchestrator {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        flags: Arc<dyn AttentionFlagRepository>,
        nlu: Arc<dyn LanguageUnderstanding>,
        effects: Arc<EffectExecutor>,
        locks: Arc<ConversationLocks>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            queue: InterviewerQueue::new(conversations.clone()),
            conversations,
            flags,
            nlu,
            effects,
            locks,
            config,
        }
    }

    pub fn queue(&self) -> &InterviewerQueue {
        &self.queue
    }

    fn retry(&self) -> RetryPolicy {
        self.effects.retry_policy()
    }

    // ───────────────────────────────────────────────────────────────
    // Intake and queue
    // ───────────────────────────────────────────────────────────────

    /// Stores a new conversation and starts it, or queues it behind the
    /// interviewer's active and older queued ones.
    ///
    /// A queued conversation left without an active one (a promotion that
    /// failed or has not run yet) is started first, so arrival order holds.
    pub async fn start(&self, conversation: Conversation) -> Result<StartResult, OrchestratorError> {
        let interviewer = conversation.interviewer().id().clone();
        let id = conversation.id();

        let _queue = self.queue.lock(&interviewer).await;
        self.promote_locked(&interviewer).await?;
        let admission = self.queue.admit(&interviewer).await?;
        self.conversations.insert(&conversation).await?;

        match admission {
            Admission::Activate => {
                self.initiate(id).await?;
                tracing::info!(conversation_id = %id, interviewer = %interviewer, "conversation started");
            }
            Admission::Queued { ahead } => {
                tracing::info!(
                    conversation_id = %id,
                    interviewer = %interviewer,
                    ahead,
                    "interviewer busy, conversation queued"
                );
            }
        }

        Ok(StartResult {
            conversation_id: id,
            admission,
        })
    }

    /// Starts the interviewer's oldest queued conversation if they are free.
    pub async fn promote_next(
        &self,
        interviewer: &ParticipantId,
    ) -> Result<Option<ConversationId>, OrchestratorError> {
        let _queue = self.queue.lock(interviewer).await;
        self.promote_locked(interviewer).await
    }

    /// Caller holds the interviewer's queue lock.
    async fn promote_locked(
        &self,
        interviewer: &ParticipantId,
    ) -> Result<Option<ConversationId>, OrchestratorError> {
        let mut skipped = Vec::new();
        loop {
            let Some(next) = self.queue.next_to_promote(interviewer, &skipped).await? else {
                return Ok(None);
            };
            match self.initiate(next.id()).await {
                Ok(_) => {
                    tracing::info!(
                        conversation_id = %next.id(),
                        interviewer = %interviewer,
                        "queued conversation promoted"
                    );
                    return Ok(Some(next.id()));
                }
                Err(OrchestratorError::DataIntegrity(reason)) => {
                    tracing::warn!(conversation_id = %next.id(), reason, "skipping queued conversation");
                    skipped.push(next.id());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Activates a queued conversation: timezones first, then the greeting.
    async fn initiate(&self, id: ConversationId) -> Result<EffectReport, OrchestratorError> {
        let _guard = self.locks.acquire(&id).await;
        let mut conv = self.load(&id).await?;
        let now = Timestamp::now();

        conv.activate(now)?;
        let mut effects = vec![conv.greeting()];

        let ids: Vec<ParticipantId> = conv.participants().map(|p| p.id().clone()).collect();
        for pid in ids {
            let timezone = self.infer_timezone(pid.as_str()).await.unwrap_or_else(|e| {
                tracing::warn!(
                    conversation_id = %id,
                    participant = %pid,
                    error = %e,
                    "timezone inference failed, asking the participant"
                );
                None
            });
            effects.extend(conv.resolve_timezone(&pid, timezone)?);
        }

        effects.extend(conv.advance(self.config.max_more_slot_requests, now)?);
        self.commit(&mut conv, effects, now).await
    }

    // ───────────────────────────────────────────────────────────────
    // Inbound messages
    // ───────────────────────────────────────────────────────────────

    /// Handles a message from `from` (raw number, any transport prefix).
    ///
    /// # Errors
    ///
    /// - `Validation` if `from` is not a usable number
    /// - `DataIntegrity` if the sender has no active conversation, or the
    ///   message does not fit the sender's state (the event is dropped)
    /// - `External` if a collaborator failed after retries; nothing was
    ///   persisted and the sender got an apology
    /// - `Storage` if the repository failed
    pub async fn handle_message(
        &self,
        from: &str,
        text: &str,
    ) -> Result<MessageOutcome, OrchestratorError> {
        let sender = ParticipantId::from_phone(from)?;
        let Some(located) = self.conversations.find_active_by_participant(&sender).await? else {
            tracing::warn!(participant = %sender, "message from number without an active conversation dropped");
            return Err(OrchestratorError::no_active_conversation(&sender));
        };
        let id = located.id();
        let interviewer = located.interviewer().id().clone();

        let result = {
            let _guard = self.locks.acquire(&id).await;
            self.handle_locked(id, &sender, text).await
        };

        match result {
            Ok(outcome) => {
                if outcome.completed {
                    if let Err(e) = self.promote_next(&interviewer).await {
                        tracing::error!(interviewer = %interviewer, error = %e, "queue promotion failed");
                    }
                }
                Ok(outcome)
            }
            Err(e) => {
                tracing::warn!(conversation_id = %id, participant = %sender, error = %e, "message dropped");
                if matches!(e, OrchestratorError::External { .. } | OrchestratorError::Storage(_)) {
                    self.apologize(&located, &sender).await;
                }
                Err(e)
            }
        }
    }

    async fn handle_locked(
        &self,
        id: ConversationId,
        sender: &ParticipantId,
        text: &str,
    ) -> Result<MessageOutcome, OrchestratorError> {
        let mut conv = self.load(&id).await?;
        if !conv.is_active() {
            return Err(OrchestratorError::DataIntegrity(format!(
                "conversation {} is no longer active",
                id
            )));
        }

        let now = Timestamp::now();
        conv.record_inbound(sender, text, now)?;
        let me = conv
            .participant(sender)
            .cloned()
            .ok_or_else(|| OrchestratorError::no_active_conversation(sender))?;

        let (intent, mut effects) = match me.role() {
            Role::Interviewer => self.interviewer_turn(&mut conv, &me, text).await?,
            Role::Interviewee => self.interviewee_turn(&mut conv, &me, text).await?,
        };
        effects.extend(conv.advance(self.config.max_more_slot_requests, now)?);

        let report = self.commit(&mut conv, effects, now).await?;

        match self
            .flags
            .resolve_matching(&id, sender, FlagType::NoResponse, now)
            .await
        {
            Ok(0) => {}
            Ok(n) => tracing::debug!(conversation_id = %id, participant = %sender, resolved = n, "no-response flags resolved"),
            Err(e) => tracing::warn!(conversation_id = %id, error = %e, "could not resolve no-response flags"),
        }

        let state = conv
            .participant(sender)
            .map(Participant::state)
            .unwrap_or_default();
        let completed = conv.status() == ConversationStatus::Completed;
        tracing::info!(
            conversation_id = %id,
            participant = %sender,
            intent = ?intent,
            state = %state,
            completed,
            "message handled"
        );

        Ok(MessageOutcome {
            conversation_id: id,
            participant: sender.clone(),
            intent,
            state,
            completed,
            effects: report,
        })
    }

    async fn interviewer_turn(
        &self,
        conv: &mut Conversation,
        me: &Participant,
        text: &str,
    ) -> Result<(Intent, Vec<SideEffect>), OrchestratorError> {
        // A pending name prompt reads the whole message as a name.
        if me.state() == ParticipantState::AwaitingCancellationIntervieweeName {
            return Ok((Intent::None, resolve_named_target(conv, text)?));
        }

        let intent = self.detect_intent(me, text).await?;
        let effects = match intent {
            Intent::CancellationRequested => {
                if conv
                    .interviewees()
                    .iter()
                    .all(|p| p.state() == ParticipantState::Cancelled)
                {
                    vec![to_interviewer(MessageDirective::NothingToCancel)]
                } else {
                    conv.open_target_prompt(TargetAction::Cancel)?
                }
            }
            Intent::RescheduleRequested => {
                let scheduled: Vec<ParticipantId> =
                    conv.scheduled_interviewees().map(|p| p.id().clone()).collect();
                match scheduled.as_slice() {
                    [] => vec![to_interviewer(MessageDirective::NothingToReschedule)],
                    [only] => reschedule_for_interviewer(conv, only)?,
                    _ => conv.open_target_prompt(TargetAction::Reschedule)?,
                }
            }
            Intent::Query | Intent::MeetingDurationChangeRequested => {
                vec![to_interviewer(MessageDirective::AnswerQuery {
                    question: text.to_string(),
                })]
            }
            Intent::SlotRemoveRequested => {
                let extraction = self.extract_slots(conv, me, text).await?;
                conv.withdraw_availability(&extraction.slots)?
            }
            Intent::SlotAddRequested | Intent::SlotUpdateRequested => {
                let extraction = self.extract_slots(conv, me, text).await?;
                conv.stage_availability(extraction.slots, extraction.timezone)?
            }
            Intent::None if me.state() == ParticipantState::AwaitingSlotConfirmation => {
                if self.detect_confirmation(me, text).await? {
                    conv.confirm_staged_availability()?
                } else {
                    let extraction = self.extract_slots(conv, me, text).await?;
                    conv.reject_staged_availability(extraction.slots)?
                }
            }
            Intent::None => {
                let extraction = self.extract_slots(conv, me, text).await?;
                conv.stage_availability(extraction.slots, extraction.timezone)?
            }
        };
        Ok((intent, effects))
    }

    async fn interviewee_turn(
        &self,
        conv: &mut Conversation,
        me: &Participant,
        text: &str,
    ) -> Result<(Intent, Vec<SideEffect>), OrchestratorError> {
        let id = me.id();
        let intent = self.detect_intent(me, text).await?;
        let reply = |directive| vec![SideEffect::notify_participant(id, directive)];

        let effects = match (intent, me.state()) {
            (Intent::CancellationRequested, ParticipantState::Cancelled) => {
                reply(MessageDirective::NothingToCancel)
            }
            (Intent::CancellationRequested, _) => conv.cancel(id)?,
            (Intent::RescheduleRequested, ParticipantState::Scheduled) => conv.reschedule(id)?,
            (Intent::RescheduleRequested, _) => reply(MessageDirective::NothingToReschedule),
            (Intent::Query | Intent::MeetingDurationChangeRequested, _) => {
                reply(MessageDirective::AnswerQuery {
                    question: text.to_string(),
                })
            }
            (_, ParticipantState::TimezoneClarification) => {
                let timezone = self.infer_timezone(text).await?;
                conv.resolve_timezone(id, timezone)?
            }
            (_, ParticipantState::ConfirmationPending) => {
                if self.detect_confirmation(me, text).await? {
                    conv.accept(id)?
                } else {
                    conv.decline(id)?
                }
            }
            (_, state) => reply(MessageDirective::StatusUpdate {
                state,
                scheduled: me.scheduled_slot(),
            }),
        };
        Ok((intent, effects))
    }

    // ───────────────────────────────────────────────────────────────
    // Admin
    // ───────────────────────────────────────────────────────────────

    /// Deletes a conversation and its flags. If it was active, the
    /// interviewer's next queued conversation starts.
    ///
    /// Returns false if there was nothing to delete.
    pub async fn delete(&self, id: ConversationId) -> Result<bool, OrchestratorError> {
        let removed = {
            let _guard = self.locks.acquire(&id).await;
            let Some(conv) = self.conversations.find_by_id(&id).await? else {
                return Ok(false);
            };
            self.conversations.delete(&id).await?;
            let flags = self.flags.delete_for_conversation(&id).await?;
            tracing::info!(conversation_id = %id, flags, "conversation deleted");
            conv
        };
        self.locks.forget(&id);

        if removed.is_active() {
            self.promote_next(removed.interviewer().id()).await?;
        }
        Ok(true)
    }

    // ───────────────────────────────────────────────────────────────
    // Helpers
    // ───────────────────────────────────────────────────────────────

    async fn load(&self, id: &ConversationId) -> Result<Conversation, OrchestratorError> {
        self.conversations
            .find_by_id(id)
            .await?
            .ok_or_else(|| OrchestratorError::conversation_not_found(*id))
    }

    /// Deletions, persist, remaining effects, persist what they recorded.
    async fn commit(
        &self,
        conv: &mut Conversation,
        effects: Vec<SideEffect>,
        now: Timestamp,
    ) -> Result<EffectReport, OrchestratorError> {
        self.effects.run_deletions(conv, &effects).await?;
        self.conversations.save(conv).await?;
        let report = self.effects.run_remaining(conv, effects, now).await;
        self.conversations.save(conv).await?;
        Ok(report)
    }

    async fn apologize(&self, conv: &Conversation, to: &ParticipantId) {
        let audience = Audience::Participant(to.clone());
        if let Err(e) = self
            .effects
            .notify(conv, &audience, &MessageDirective::Apology)
            .await
        {
            tracing::error!(conversation_id = %conv.id(), participant = %to, error = %e, "apology not delivered");
        }
    }

    async fn detect_intent(&self, me: &Participant, text: &str) -> Result<Intent, OrchestratorError> {
        self.retry()
            .run("nlu.detect_intent", || self.nlu.detect_intent(me, text))
            .await
            .map_err(|e| OrchestratorError::external("nlu.detect_intent", e))
    }

    async fn detect_confirmation(&self, me: &Participant, text: &str) -> Result<bool, OrchestratorError> {
        self.retry()
            .run("nlu.detect_confirmation", || self.nlu.detect_confirmation(me, text))
            .await
            .map_err(|e| OrchestratorError::external("nlu.detect_confirmation", e))
    }

    async fn extract_slots(
        &self,
        conv: &Conversation,
        me: &Participant,
        text: &str,
    ) -> Result<SlotExtraction, OrchestratorError> {
        let duration = conv.policy().meeting_duration_minutes();
        self.retry()
            .run("nlu.extract_slots", || self.nlu.extract_slots(me, text, duration))
            .await
            .map_err(|e| OrchestratorError::external("nlu.extract_slots", e))
    }

    async fn infer_timezone(&self, hint: &str) -> Result<Option<String>, OrchestratorError> {
        self.retry()
            .run("nlu.infer_timezone", || self.nlu.infer_timezone(hint))
            .await
            .map_err(|e| OrchestratorError::external("nlu.infer_timezone", e))
    }
}

fn to_interviewer(directive: MessageDirective) -> SideEffect {
    SideEffect::notify(Audience::Interviewer, directive)
}

/// Reschedules `id` and tells the interviewer it happened.
fn reschedule_for_interviewer(
    conv: &mut Conversation,
    id: &ParticipantId,
) -> Result<Vec<SideEffect>, OrchestratorError> {
    let name = conv.interviewee(id)?.name().to_string();
    let mut effects = conv.reschedule(id)?;
    effects.push(to_interviewer(MessageDirective::RescheduleStarted { interviewee: name }));
    Ok(effects)
}

/// Applies the pending cancel/reschedule to the interviewee named in `text`.
/// Unknown names re-prompt and leave the prompt open.
fn resolve_named_target(
    conv: &mut Conversation,
    text: &str,
) -> Result<Vec<SideEffect>, OrchestratorError> {
    let name = text.trim();
    let Some((target, state)) = conv
        .find_interviewee_by_name(name)
        .map(|p| (p.id().clone(), p.state()))
    else {
        return Ok(vec![to_interviewer(MessageDirective::UnknownInterviewee {
            name: name.to_string(),
        })]);
    };

    let Some(pending) = conv.close_target_prompt()? else {
        return Ok(Vec::new());
    };

    let effects = match (pending.action, state) {
        (TargetAction::Cancel, ParticipantState::Cancelled) => {
            vec![to_interviewer(MessageDirective::NothingToCancel)]
        }
        (TargetAction::Cancel, _) => conv.cancel(&target)?,
        (TargetAction::Reschedule, ParticipantState::Scheduled) => {
            reschedule_for_interviewer(conv, &target)?
        }
        (TargetAction::Reschedule, _) => vec![to_interviewer(MessageDirective::NothingToReschedule)],
    };
    Ok(effects)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryAttentionFlagRepository, InMemoryConversationRepository, MockCalendarService,
        RecordingMessagingGateway, ScriptedLanguageUnderstanding, TemplateMessageComposer,
    };
    use crate::domain::attention::AttentionFlag;
    use crate::domain::scheduling::{SchedulingPolicy, Slot};
    use crate::ports::ServiceError;

    fn pid(n: &str) -> ParticipantId {
        ParticipantId::from_phone(n).unwrap()
    }

    fn slot_at(hours: i64) -> Slot {
        let start = Timestamp::now().plus_hours(hours);
        Slot::new(start, start.plus_minutes(60)).unwrap()
    }

    struct Rig {
        repo: Arc<InMemoryConversationRepository>,
        flags: Arc<InMemoryAttentionFlagRepository>,
        gateway: RecordingMessagingGateway,
        calendar: MockCalendarService,
        orchestrator: ConversationOrchestrator,
    }

    fn rig(nlu: ScriptedLanguageUnderstanding) -> Rig {
        let repo = Arc::new(InMemoryConversationRepository::new());
        let flags = Arc::new(InMemoryAttentionFlagRepository::new());
        let gateway = RecordingMessagingGateway::new();
        let calendar = MockCalendarService::new();
        let effects = Arc::new(EffectExecutor::new(
            Arc::new(TemplateMessageComposer::new()),
            Arc::new(gateway.clone()),
            Arc::new(calendar.clone()),
            RetryPolicy::immediate(),
        ));
        let orchestrator = ConversationOrchestrator::new(
            repo.clone(),
            flags.clone(),
            Arc::new(nlu.with_timezone("+", "UTC")),
            effects,
            Arc::new(ConversationLocks::new()),
            OrchestratorConfig::default(),
        );
        Rig {
            repo,
            flags,
            gateway,
            calendar,
            orchestrator,
        }
    }

    fn conversation(interviewees: &[(&str, &str)]) -> Conversation {
        Conversation::new(
            Participant::interviewer(pid("+900"), "Grace", None),
            interviewees
                .iter()
                .map(|(n, name)| Participant::interviewee(pid(n), *name, None, None))
                .collect(),
            SchedulingPolicy::new(60, None, None).unwrap(),
        )
        .unwrap()
    }

    async fn stored(rig: &Rig, id: ConversationId) -> Conversation {
        rig.repo.find_by_id(&id).await.unwrap().unwrap()
    }

    mod intake {
        use super::*;

        #[tokio::test]
        async fn start_greets_interviewer_and_resolves_timezones() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            let result = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap();

            assert_eq!(result.admission, Admission::Activate);
            let conv = stored(&rig, result.conversation_id).await;
            assert!(conv.is_active());
            assert_eq!(
                conv.interviewee(&pid("+100")).unwrap().timezone(),
                Some("UTC")
            );
            assert_eq!(rig.gateway.sent_to(&pid("+900")).len(), 1);
            assert!(rig.gateway.sent_to(&pid("+100")).is_empty());
        }

        #[tokio::test]
        async fn unknown_timezone_asks_the_interviewee() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            // Only numbers starting with "+" resolve; this one does not.
            let result = rig
                .orchestrator
                .start(conversation(&[("whatsapp:0044", "Ada")]))
                .await
                .unwrap();

            let conv = stored(&rig, result.conversation_id).await;
            assert_eq!(
                conv.interviewee(&pid("0044")).unwrap().state(),
                ParticipantState::TimezoneClarification
            );
            assert_eq!(rig.gateway.sent_to(&pid("0044")).len(), 1);
        }
    }

    mod messages {
        use super::*;

        async fn negotiating(rig: &Rig) -> ConversationId {
            let id = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap()
                .conversation_id;
            rig.orchestrator.handle_message("+900", "tomorrow 10").await.unwrap();
            rig.orchestrator.handle_message("+900", "yes").await.unwrap();
            id
        }

        #[tokio::test]
        async fn unknown_sender_is_rejected() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            let err = rig.orchestrator.handle_message("+555", "hello").await.unwrap_err();
            assert!(matches!(err, OrchestratorError::DataIntegrity(_)));
        }

        #[tokio::test]
        async fn confirmed_slots_are_offered() {
            let slot = slot_at(24);
            let rig = rig(ScriptedLanguageUnderstanding::new().with_slots("tomorrow 10", vec![slot], None));
            let id = negotiating(&rig).await;

            let conv = stored(&rig, id).await;
            let ada = conv.interviewee(&pid("+100")).unwrap();
            assert_eq!(ada.state(), ParticipantState::ConfirmationPending);
            assert_eq!(ada.proposed_slot(), Some(slot));
            assert_eq!(rig.gateway.sent_to(&pid("+100")).len(), 1);
        }

        #[tokio::test]
        async fn acceptance_books_and_completes() {
            let slot = slot_at(24);
            let rig = rig(ScriptedLanguageUnderstanding::new().with_slots("tomorrow 10", vec![slot], None));
            let id = negotiating(&rig).await;

            let outcome = rig.orchestrator.handle_message("+100", "yes").await.unwrap();

            assert!(outcome.completed);
            assert_eq!(outcome.state, ParticipantState::Scheduled);
            assert_eq!(outcome.effects.events_created, 1);
            let conv = stored(&rig, id).await;
            assert_eq!(conv.status(), ConversationStatus::Completed);
            assert!(conv.interviewee(&pid("+100")).unwrap().event_id().is_some());
            let report = rig.gateway.sent_to(&pid("+900")).pop().unwrap();
            assert!(report.contains("Ada => Scheduled at"));
        }

        #[tokio::test]
        async fn response_resolves_no_response_flag() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            let id = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap()
                .conversation_id;
            rig.flags
                .insert(&AttentionFlag::raise(id, pid("+100"), FlagType::NoResponse, Timestamp::now()))
                .await
                .unwrap();

            rig.orchestrator.handle_message("+100", "hello?").await.unwrap();

            let flags = rig.flags.list_for_conversation(&id).await.unwrap();
            assert!(flags[0].is_resolved());
        }

        #[tokio::test]
        async fn nlu_outage_persists_nothing_and_apologizes() {
            let nlu = ScriptedLanguageUnderstanding::new();
            let rig = rig(nlu.clone());
            let id = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap()
                .conversation_id;
            let before = stored(&rig, id).await;
            for _ in 0..3 {
                nlu.fail_next(ServiceError::unavailable("model down"));
            }

            let err = rig.orchestrator.handle_message("+100", "hi").await.unwrap_err();

            assert!(err.is_external());
            assert_eq!(stored(&rig, id).await, before);
            let last = rig.gateway.sent_to(&pid("+100")).pop().unwrap();
            assert!(last.starts_with("Sorry, something went wrong"));
        }

        #[tokio::test]
        async fn idle_interviewee_gets_status() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            rig.orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap();

            let outcome = rig.orchestrator.handle_message("+100", "any news?").await.unwrap();
            assert_eq!(outcome.state, ParticipantState::AwaitingAvailability);
            let reply = rig.gateway.sent_to(&pid("+100")).pop().unwrap();
            assert!(reply.contains("AWAITING_AVAILABILITY"));
        }
    }

    mod cancellation {
        use super::*;

        async fn booked(rig: &Rig) -> ConversationId {
            let id = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada"), ("+101", "Linus")]))
                .await
                .unwrap()
                .conversation_id;
            rig.orchestrator.handle_message("+900", "slots").await.unwrap();
            rig.orchestrator.handle_message("+900", "yes").await.unwrap();
            rig.orchestrator.handle_message("+100", "yes").await.unwrap();
            id
        }

        fn nlu() -> ScriptedLanguageUnderstanding {
            ScriptedLanguageUnderstanding::new()
                .with_slots("slots", vec![slot_at(24), slot_at(26)], None)
                .with_intent("cancel one", Intent::CancellationRequested)
                .with_intent("move it", Intent::RescheduleRequested)
        }

        #[tokio::test]
        async fn interviewer_cancels_by_name() {
            let rig = rig(nlu());
            let id = booked(&rig).await;

            rig.orchestrator.handle_message("+900", "cancel one").await.unwrap();
            let conv = stored(&rig, id).await;
            assert_eq!(
                conv.interviewer().state(),
                ParticipantState::AwaitingCancellationIntervieweeName
            );

            rig.orchestrator.handle_message("+900", "Nobody").await.unwrap();
            let reprompt = rig.gateway.sent_to(&pid("+900")).pop().unwrap();
            assert!(reprompt.contains("\"Nobody\""));

            rig.orchestrator.handle_message("+900", "  ada ").await.unwrap();
            let conv = stored(&rig, id).await;
            let ada = conv.interviewee(&pid("+100")).unwrap();
            assert_eq!(ada.state(), ParticipantState::Cancelled);
            assert_eq!(ada.cancellation_count(), 1);
            assert_eq!(conv.interviewer().state(), ParticipantState::ConversationActive);
            assert_eq!(rig.calendar.deleted().len(), 1);
        }

        #[tokio::test]
        async fn single_scheduled_interviewee_is_rescheduled_directly() {
            let rig = rig(nlu());
            let id = booked(&rig).await;

            rig.orchestrator.handle_message("+900", "move it").await.unwrap();

            let conv = stored(&rig, id).await;
            let ada = conv.interviewee(&pid("+100")).unwrap();
            assert_eq!(ada.reschedule_count(), 1);
            assert!(ada.scheduled_slot().is_none());
            assert_eq!(rig.calendar.events().len(), 0);
        }

        #[tokio::test]
        async fn failed_deletion_leaves_booking_intact() {
            let rig = rig(nlu());
            let id = booked(&rig).await;
            let before = stored(&rig, id).await;
            for _ in 0..3 {
                rig.calendar.fail_next_delete(ServiceError::unavailable("calendar down"));
            }

            let err = rig.orchestrator.handle_message("+900", "move it").await.unwrap_err();

            assert!(err.is_external());
            assert_eq!(stored(&rig, id).await, before);
            assert_eq!(rig.calendar.events().len(), 1);
        }
    }

    mod deletion {
        use super::*;

        #[tokio::test]
        async fn deleting_active_conversation_promotes_queued() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            let first = rig
                .orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap();
            let second = rig
                .orchestrator
                .start(conversation(&[("+101", "Linus")]))
                .await
                .unwrap();
            assert_eq!(second.admission, Admission::Queued { ahead: 1 });

            assert!(rig.orchestrator.delete(first.conversation_id).await.unwrap());
            assert!(!rig.orchestrator.delete(first.conversation_id).await.unwrap());

            assert!(stored(&rig, second.conversation_id).await.is_active());
        }
    }

    mod queueing {
        use super::*;

        #[tokio::test]
        async fn stranded_queued_conversation_starts_before_newer_one() {
            let rig = rig(ScriptedLanguageUnderstanding::new());
            // Queued with nothing active, as after a failed promotion.
            let older = conversation(&[("+100", "Ada")]);
            rig.repo.insert(&older).await.unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;

            let newer = rig
                .orchestrator
                .start(conversation(&[("+101", "Linus")]))
                .await
                .unwrap();

            assert_eq!(newer.admission, Admission::Queued { ahead: 1 });
            assert!(stored(&rig, older.id()).await.is_active());
            assert_eq!(
                stored(&rig, newer.conversation_id).await.status(),
                ConversationStatus::Queued
            );
        }

        #[tokio::test]
        async fn completion_promotes_in_arrival_order() {
            let slot = slot_at(24);
            let rig = rig(ScriptedLanguageUnderstanding::new().with_slots("tomorrow 10", vec![slot], None));
            rig.orchestrator
                .start(conversation(&[("+100", "Ada")]))
                .await
                .unwrap();
            let second = rig
                .orchestrator
                .start(conversation(&[("+101", "Linus")]))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
            let third = rig
                .orchestrator
                .start(conversation(&[("+102", "Barbara")]))
                .await
                .unwrap();
            assert_eq!(third.admission, Admission::Queued { ahead: 2 });

            rig.orchestrator.handle_message("+900", "tomorrow 10").await.unwrap();
            rig.orchestrator.handle_message("+900", "yes").await.unwrap();
            let outcome = rig.orchestrator.handle_message("+100", "yes").await.unwrap();

            assert!(outcome.completed);
            assert!(stored(&rig, second.conversation_id).await.is_active());
            assert_eq!(
                stored(&rig, third.conversation_id).await.status(),
                ConversationStatus::Queued
            );
        }
    }
}
