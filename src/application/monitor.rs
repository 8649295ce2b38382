//! AttentionMonitor - periodic stall detection.
//!
//! Every sweep evaluates each active conversation against the attention
//! thresholds, stores newly raised flags, and sends the conversation's
//! contact person one alert listing what was raised. Completed conversations
//! are visited only while one of their booked meetings is in its
//! missed-meeting window.
//!
//! ## Configuration
//!
//! | Setting | Default | Description |
//! |---------|---------|-------------|
//! | `interval` | 5 min | Time between sweeps |
//! | `thresholds.no_response` | 24 h | Silence before `NO_RESPONSE` |
//! | `thresholds.missed_meeting_window` | 60 min | Window after a meeting start |
//!
//! ## Graceful Shutdown
//!
//! The monitor listens on a watch channel and exits after the current sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time;

use crate::domain::attention::{evaluate, AttentionFlag, AttentionThresholds, FlagType};
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::scheduling::{Audience, Conversation, ConversationStatus, MessageDirective};
use crate::ports::{AttentionFlagRepository, ConversationRepository};

use super::{ConversationLocks, EffectExecutor, OrchestratorError};

#[derive(Debug, Clone)]
pub struct AttentionMonitorConfig {
    pub interval: Duration,
    pub thresholds: AttentionThresholds,
}

impl Default for AttentionMonitorConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            thresholds: AttentionThresholds::default(),
        }
    }
}

/// What one sweep did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evaluated: usize,
    pub raised: usize,
    pub alerts_sent: usize,
}

/// Background sweeper raising attention flags.
pub struct AttentionMonitor {
    conversations: Arc<dyn ConversationRepository>,
    flags: Arc<dyn AttentionFlagRepository>,
    locks: Arc<ConversationLocks>,
    effects: Arc<EffectExecutor>,
    config: AttentionMonitorConfig,
}

impl AttentionMonitor {
    pub fn new(
        conversations: Arc<dyn ConversationRepository>,
        flags: Arc<dyn AttentionFlagRepository>,
        locks: Arc<ConversationLocks>,
        effects: Arc<EffectExecutor>,
        config: AttentionMonitorConfig,
    ) -> Self {
        Self {
            conversations,
            flags,
            locks,
            effects,
            config,
        }
    }

    /// Sweeps on every interval tick until `shutdown` turns true.
    ///
    /// A failed sweep is logged and the loop carries on.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut interval = time::interval(self.config.interval);
        tracing::info!(interval_secs = self.config.interval.as_secs(), "attention monitor started");

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        tracing::info!("attention monitor stopped");
                        return;
                    }
                }

                _ = interval.tick() => {
                    if let Err(e) = self.poll_once().await {
                        tracing::error!(error = %e, "attention sweep failed");
                    }
                }
            }
        }
    }

    /// Runs exactly one sweep at the current time.
    pub async fn poll_once(&self) -> Result<SweepReport, OrchestratorError> {
        self.sweep_once(Timestamp::now()).await
    }

    /// Evaluates every active conversation, and every completed one with a
    /// meeting in its window, as of `now`.
    ///
    /// A conversation that fails is logged and skipped.
    pub async fn sweep_once(&self, now: Timestamp) -> Result<SweepReport, OrchestratorError> {
        let mut due: Vec<ConversationId> = self
            .conversations
            .list_by_status(ConversationStatus::Active)
            .await?
            .iter()
            .map(Conversation::id)
            .collect();
        due.extend(
            self.conversations
                .list_by_status(ConversationStatus::Completed)
                .await?
                .iter()
                .filter(|c| !evaluate(c, now, &self.config.thresholds, &[]).is_empty())
                .map(Conversation::id),
        );

        let mut report = SweepReport::default();
        for id in due {
            match self.sweep_conversation(id, now).await {
                Ok((raised, alerted)) => {
                    report.evaluated += 1;
                    report.raised += raised;
                    report.alerts_sent += usize::from(alerted);
                }
                Err(e) => {
                    tracing::warn!(conversation_id = %id, error = %e, "attention check skipped");
                }
            }
        }

        if report.raised > 0 {
            tracing::info!(
                evaluated = report.evaluated,
                raised = report.raised,
                alerts = report.alerts_sent,
                "attention sweep raised flags"
            );
        } else {
            tracing::debug!(evaluated = report.evaluated, "attention sweep clean");
        }
        Ok(report)
    }

    async fn sweep_conversation(
        &self,
        id: ConversationId,
        now: Timestamp,
    ) -> Result<(usize, bool), OrchestratorError> {
        let _guard = self.locks.acquire(&id).await;
        // Re-read under the lock: it may have completed or vanished.
        let Some(conv) = self.conversations.find_by_id(&id).await? else {
            return Ok((0, false));
        };

        let open: Vec<AttentionFlag> = self
            .flags
            .list_for_conversation(&id)
            .await?
            .into_iter()
            .filter(|f| !f.is_resolved())
            .collect();
        let raised = evaluate(&conv, now, &self.config.thresholds, &open);
        if raised.is_empty() {
            return Ok((0, false));
        }

        for flag in &raised {
            self.flags.insert(flag).await?;
            tracing::warn!(
                conversation_id = %id,
                participant = %flag.participant_id(),
                flag = %flag.flag_type(),
                "attention flag raised"
            );
        }

        let mut kinds: Vec<FlagType> = raised.iter().map(AttentionFlag::flag_type).collect();
        kinds.sort();
        kinds.dedup();

        let alerted = match self
            .effects
            .notify(&conv, &Audience::Contact, &MessageDirective::AttentionAlert { raised: kinds })
            .await
        {
            Ok(to) => to.is_some(),
            Err(e) => {
                tracing::error!(conversation_id = %id, error = %e, "attention alert not delivered");
                false
            }
        };

        Ok((raised.len(), alerted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{
        InMemoryAttentionFlagRepository, InMemoryConversationRepository, MockCalendarService,
        RecordingMessagingGateway, TemplateMessageComposer,
    };
    use crate::application::RetryPolicy;
    use crate::domain::foundation::ParticipantId;
    use crate::domain::scheduling::{ContactPerson, Participant, SchedulingPolicy, Slot};

    fn pid(n: &str) -> ParticipantId {
        ParticipantId::from_phone(n).unwrap()
    }

    struct Rig {
        repo: Arc<InMemoryConversationRepository>,
        flags: Arc<InMemoryAttentionFlagRepository>,
        gateway: RecordingMessagingGateway,
        monitor: AttentionMonitor,
    }

    fn rig() -> Rig {
        let repo = Arc::new(InMemoryConversationRepository::new());
        let flags = Arc::new(InMemoryAttentionFlagRepository::new());
        let gateway = RecordingMessagingGateway::new();
        let effects = Arc::new(EffectExecutor::new(
            Arc::new(TemplateMessageComposer::new()),
            Arc::new(gateway.clone()),
            Arc::new(MockCalendarService::new()),
            RetryPolicy::immediate(),
        ));
        let monitor = AttentionMonitor::new(
            repo.clone(),
            flags.clone(),
            Arc::new(ConversationLocks::new()),
            effects,
            AttentionMonitorConfig::default(),
        );
        Rig {
            repo,
            flags,
            gateway,
            monitor,
        }
    }

    fn new_conversation(contact: bool) -> Conversation {
        let contact = contact.then(|| ContactPerson {
            name: "Ops".into(),
            number: pid("+700"),
            email: None,
        });
        Conversation::new(
            Participant::interviewer(pid("+900"), "Grace", None),
            vec![Participant::interviewee(pid("+100"), "Ada", None, None)],
            SchedulingPolicy::new(30, contact, None).unwrap(),
        )
        .unwrap()
    }

    async fn active_conversation(rig: &Rig, contact: bool) -> ConversationId {
        let mut conv = new_conversation(contact);
        conv.activate(Timestamp::now()).unwrap();
        rig.repo.insert(&conv).await.unwrap();
        conv.id()
    }

    #[tokio::test]
    async fn fresh_conversation_raises_nothing() {
        let rig = rig();
        active_conversation(&rig, true).await;

        let report = rig.monitor.poll_once().await.unwrap();

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.raised, 0);
        assert!(rig.gateway.sent().is_empty());
    }

    #[tokio::test]
    async fn silence_raises_flags_and_one_alert() {
        let rig = rig();
        let id = active_conversation(&rig, true).await;
        let later = Timestamp::now().plus_hours(25);

        let report = rig.monitor.sweep_once(later).await.unwrap();

        // Only the interviewer was asked for something.
        assert_eq!(report.raised, 1);
        assert_eq!(report.alerts_sent, 1);
        assert_eq!(rig.flags.list_for_conversation(&id).await.unwrap().len(), 1);
        let alerts = rig.gateway.sent_to(&pid("+700"));
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("NO_RESPONSE"));
    }

    #[tokio::test]
    async fn open_flags_are_not_raised_twice() {
        let rig = rig();
        active_conversation(&rig, true).await;
        let later = Timestamp::now().plus_hours(25);

        rig.monitor.sweep_once(later).await.unwrap();
        let second = rig.monitor.sweep_once(later.plus_hours(1)).await.unwrap();

        assert_eq!(second.raised, 0);
        assert_eq!(rig.gateway.sent_to(&pid("+700")).len(), 1);
    }

    #[tokio::test]
    async fn no_contact_still_stores_flags() {
        let rig = rig();
        let id = active_conversation(&rig, false).await;

        let report = rig
            .monitor
            .sweep_once(Timestamp::now().plus_hours(25))
            .await
            .unwrap();

        assert_eq!(report.alerts_sent, 0);
        assert_eq!(rig.flags.list_for_conversation(&id).await.unwrap().len(), 1);
        assert!(rig.gateway.sent().is_empty());
    }

    /// Ada booked at `meeting`; every interviewee settled, so completed.
    async fn completed_conversation(rig: &Rig, meeting: Timestamp) -> ConversationId {
        let now = Timestamp::now();
        let mut conv = new_conversation(true);
        conv.activate(now).unwrap();
        conv.resolve_timezone(&pid("+100"), Some("UTC".into())).unwrap();
        let slot = Slot::new(meeting, meeting.plus_minutes(30)).unwrap();
        conv.stage_availability(vec![slot], None).unwrap();
        conv.confirm_staged_availability().unwrap();
        conv.advance(2, now).unwrap();
        conv.accept(&pid("+100")).unwrap();
        conv.advance(2, now).unwrap();
        assert_eq!(conv.status(), ConversationStatus::Completed);
        rig.repo.insert(&conv).await.unwrap();
        conv.id()
    }

    #[tokio::test]
    async fn completed_conversation_raises_missed_meeting() {
        let rig = rig();
        let meeting = Timestamp::now().plus_hours(48);
        let id = completed_conversation(&rig, meeting).await;

        let report = rig.monitor.sweep_once(meeting.plus_minutes(30)).await.unwrap();

        assert_eq!(report.evaluated, 1);
        assert_eq!(report.raised, 1);
        let flags = rig.flags.list_for_conversation(&id).await.unwrap();
        assert_eq!(flags.len(), 1);
        assert_eq!(flags[0].flag_type(), FlagType::MissedScheduledMeeting);
        assert_eq!(flags[0].participant_id(), &pid("+100"));
        assert_eq!(rig.gateway.sent_to(&pid("+700")).len(), 1);
    }

    #[tokio::test]
    async fn completed_conversation_outside_window_is_not_visited() {
        let rig = rig();
        let meeting = Timestamp::now().plus_hours(48);
        completed_conversation(&rig, meeting).await;

        let before = rig.monitor.sweep_once(meeting.minus_hours(1)).await.unwrap();
        let after = rig.monitor.sweep_once(meeting.plus_hours(2)).await.unwrap();

        assert_eq!(before, SweepReport::default());
        assert_eq!(after, SweepReport::default());
    }

    #[tokio::test]
    async fn run_stops_on_shutdown() {
        let rig = rig();
        let (tx, rx) = watch::channel(false);
        let monitor = rig.monitor;

        let handle = tokio::spawn(async move { monitor.run(rx).await });
        tx.send(true).unwrap();

        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
