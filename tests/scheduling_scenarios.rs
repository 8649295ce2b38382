//! End-to-end negotiation scenarios.
//!
//! Each test drives the orchestrator the way the chat channel would:
//! raw numbers and free text in, composed messages and calendar events out.
//! The NLU is scripted per message, so the texts below only need to be
//! distinct, not meaningful.

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};

use interview_scheduler::adapters::{
    InMemoryAttentionFlagRepository, InMemoryConversationRepository, MockCalendarService,
    RecordingMessagingGateway, ScriptedLanguageUnderstanding, TemplateMessageComposer,
};
use interview_scheduler::application::{
    Admission, ConversationLocks, ConversationOrchestrator, EffectExecutor, OrchestratorConfig,
    ParticipantDetails, RetryPolicy, StartConversationCommand, StartConversationHandler,
};
use interview_scheduler::domain::foundation::{ConversationId, ParticipantId, Timestamp};
use interview_scheduler::domain::scheduling::{
    CompletionReason, Conversation, ConversationStatus, ParticipantState, Slot,
};
use interview_scheduler::ports::ConversationRepository;

// =============================================================================
// Test Infrastructure
// =============================================================================

const GRACE: &str = "whatsapp:+4400900";
const ADA: &str = "+4400100";
const LINUS: &str = "+4400101";

fn pid(n: &str) -> ParticipantId {
    ParticipantId::from_phone(n).unwrap()
}

/// 60-minute slot on 2030-05-06 starting at `hour` UTC.
fn slot(hour: u32) -> Slot {
    let start = Timestamp::from_datetime(Utc.with_ymd_and_hms(2030, 5, 6, hour, 0, 0).unwrap());
    Slot::new(start, start.plus_minutes(60)).unwrap()
}

struct World {
    repo: Arc<InMemoryConversationRepository>,
    gateway: RecordingMessagingGateway,
    calendar: MockCalendarService,
    orchestrator: Arc<ConversationOrchestrator>,
    start: StartConversationHandler,
}

impl World {
    fn new(nlu: ScriptedLanguageUnderstanding) -> Self {
        let repo = Arc::new(InMemoryConversationRepository::new());
        let gateway = RecordingMessagingGateway::new();
        let calendar = MockCalendarService::new();
        let effects = Arc::new(EffectExecutor::new(
            Arc::new(TemplateMessageComposer::new()),
            Arc::new(gateway.clone()),
            Arc::new(calendar.clone()),
            RetryPolicy::immediate(),
        ));
        let orchestrator = Arc::new(ConversationOrchestrator::new(
            repo.clone(),
            Arc::new(InMemoryAttentionFlagRepository::new()),
            Arc::new(nlu.with_timezone("+44", "Europe/London")),
            effects,
            Arc::new(ConversationLocks::new()),
            OrchestratorConfig::default(),
        ));
        Self {
            repo,
            gateway,
            calendar,
            start: StartConversationHandler::new(orchestrator.clone()),
            orchestrator,
        }
    }

    async fn start_with(&self, interviewees: &[(&str, &str)]) -> (ConversationId, Admission) {
        let cmd = StartConversationCommand {
            interviewer: ParticipantDetails {
                name: "Grace".into(),
                number: GRACE.into(),
                email: Some("grace@example.com".into()),
                job_title: None,
            },
            interviewees: interviewees
                .iter()
                .map(|(name, number)| ParticipantDetails {
                    name: name.to_string(),
                    number: number.to_string(),
                    email: None,
                    job_title: Some("Engineer".into()),
                })
                .collect(),
            meeting_duration_minutes: 60,
            contact: None,
            company_details: None,
        };
        let started = self.start.handle(cmd).await.unwrap();
        (started.conversation_id, started.admission)
    }

    async fn say(&self, from: &str, text: &str) {
        self.orchestrator.handle_message(from, text).await.unwrap();
    }

    async fn conversation(&self, id: ConversationId) -> Conversation {
        self.repo.find_by_id(&id).await.unwrap().unwrap()
    }

    fn last_to(&self, number: &str) -> String {
        self.gateway.sent_to(&pid(number)).pop().unwrap_or_default()
    }
}

fn state_of(conv: &Conversation, number: &str) -> ParticipantState {
    conv.participant(&pid(number)).unwrap().state()
}

// =============================================================================
// Scenarios
// =============================================================================

#[tokio::test]
async fn two_slots_two_interviewees_both_booked() {
    let world = World::new(
        ScriptedLanguageUnderstanding::new().with_slots("mon 10 to 12", vec![slot(10), slot(11)], None),
    );
    let (id, admission) = world.start_with(&[("Ada", ADA), ("Linus", LINUS)]).await;
    assert_eq!(admission, Admission::Activate);

    world.say(GRACE, "Mon 10 to 12").await;
    assert_eq!(
        state_of(&world.conversation(id).await, GRACE),
        ParticipantState::AwaitingSlotConfirmation
    );
    world.say(GRACE, "yes").await;

    let conv = world.conversation(id).await;
    assert_eq!(state_of(&conv, ADA), ParticipantState::ConfirmationPending);
    assert_eq!(state_of(&conv, LINUS), ParticipantState::ConfirmationPending);
    // Earliest slot to the first interviewee, the next one to the second.
    assert_eq!(conv.participant(&pid(ADA)).unwrap().proposed_slot(), Some(slot(10)));
    assert_eq!(conv.participant(&pid(LINUS)).unwrap().proposed_slot(), Some(slot(11)));

    world.say(ADA, "yes").await;
    world.say(LINUS, "sounds good").await;

    let conv = world.conversation(id).await;
    assert_eq!(conv.status(), ConversationStatus::Completed);
    assert_eq!(conv.completion_reason(), Some(CompletionReason::AllSettled));
    assert_eq!(state_of(&conv, ADA), ParticipantState::Scheduled);
    assert_eq!(state_of(&conv, LINUS), ParticipantState::Scheduled);
    assert!(conv.pool().available().is_empty());
    assert!(conv.pool().reserved().is_empty());
    assert_eq!(world.calendar.events().len(), 2);
    assert!(conv.interviewees().iter().all(|p| p.event_id().is_some()));

    let report = world.last_to(GRACE);
    assert!(report.contains("Ada => Scheduled at 2030-05-06 10:00 UTC"));
    assert!(report.contains("Linus => Scheduled at 2030-05-06 11:00 UTC"));
}

#[tokio::test]
async fn second_interviewee_waits_then_takes_new_slot() {
    let world = World::new(
        ScriptedLanguageUnderstanding::new()
            .with_slots("mon 10", vec![slot(10)], None)
            .with_slots("mon 14", vec![slot(14)], None),
    );
    let (id, _) = world.start_with(&[("Ada", ADA), ("Linus", LINUS)]).await;

    world.say(GRACE, "mon 10").await;
    world.say(GRACE, "yes").await;
    let conv = world.conversation(id).await;
    assert_eq!(state_of(&conv, ADA), ParticipantState::ConfirmationPending);
    assert_eq!(state_of(&conv, LINUS), ParticipantState::NoSlotsAvailable);

    world.say(ADA, "yes").await;
    let conv = world.conversation(id).await;
    assert!(conv.pool().available().is_empty());
    assert_eq!(conv.pool().scheduled(), &[slot(10)]);
    // Linus is stuck and nobody holds an offer: the interviewer is asked.
    assert_eq!(conv.more_slots_requests(), 1);
    assert_eq!(
        state_of(&conv, GRACE),
        ParticipantState::AwaitingMoreSlotsFromInterviewer
    );

    world.say(GRACE, "mon 14").await;
    world.say(GRACE, "yes").await;

    let conv = world.conversation(id).await;
    let linus = conv.participant(&pid(LINUS)).unwrap();
    assert_eq!(linus.state(), ParticipantState::ConfirmationPending);
    assert_eq!(linus.proposed_slot(), Some(slot(14)));
    assert!(conv.is_active());
}

#[tokio::test]
async fn sole_decline_drops_slot_and_escalates() {
    let world = World::new(ScriptedLanguageUnderstanding::new().with_slots("mon 10", vec![slot(10)], None));
    let (id, _) = world.start_with(&[("Ada", ADA)]).await;

    world.say(GRACE, "mon 10").await;
    world.say(GRACE, "yes").await;
    world.say(ADA, "no, that does not work").await;

    let conv = world.conversation(id).await;
    let ada = conv.participant(&pid(ADA)).unwrap();
    assert_eq!(ada.state(), ParticipantState::NoSlotsAvailable);
    assert!(ada.has_been_offered(&slot(10).key()));
    assert!(conv
        .pool()
        .denials_for(&slot(10).key())
        .is_some_and(|d| d.contains(&pid(ADA))));
    assert!(conv.pool().available().is_empty());
    assert_eq!(conv.more_slots_requests(), 1);
    assert!(world.last_to(GRACE).contains("Ada"));
}

#[tokio::test]
async fn exhausted_escalation_force_completes() {
    let world = World::new(
        ScriptedLanguageUnderstanding::new()
            .with_slots("mon 10", vec![slot(10)], None)
            .with_slots("mon 12", vec![slot(12)], None)
            .with_slots("mon 14", vec![slot(14)], None),
    );
    let (id, _) = world.start_with(&[("Ada", ADA)]).await;

    for availability in ["mon 10", "mon 12", "mon 14"] {
        world.say(GRACE, availability).await;
        world.say(GRACE, "yes").await;
        world.say(ADA, "no").await;
    }

    let conv = world.conversation(id).await;
    assert_eq!(conv.more_slots_requests(), 2);
    assert_eq!(conv.status(), ConversationStatus::Completed);
    assert_eq!(conv.completion_reason(), Some(CompletionReason::EscalationExhausted));
    assert!(world
        .last_to(GRACE)
        .contains("Ada => NO_SLOTS_AVAILABLE"));
    assert!(world.calendar.events().is_empty());
}

#[tokio::test]
async fn busy_interviewer_queues_until_completion() {
    let world = World::new(ScriptedLanguageUnderstanding::new().with_slots("mon 10", vec![slot(10)], None));
    let (first, _) = world.start_with(&[("Ada", ADA)]).await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let (second, admission) = world.start_with(&[("Linus", LINUS)]).await;

    assert_eq!(admission, Admission::Queued { ahead: 1 });
    let queued = world.conversation(second).await;
    assert_eq!(queued.status(), ConversationStatus::Queued);
    assert!(world.gateway.sent_to(&pid(LINUS)).is_empty());
    // Only the first greeting went out.
    assert_eq!(world.gateway.sent_to(&pid(GRACE)).len(), 1);

    // Linus has no active conversation yet.
    assert!(world.orchestrator.handle_message(LINUS, "hello?").await.is_err());

    world.say(GRACE, "mon 10").await;
    world.say(GRACE, "yes").await;
    world.say(ADA, "yes").await;

    assert_eq!(world.conversation(first).await.status(), ConversationStatus::Completed);
    let promoted = world.conversation(second).await;
    assert_eq!(promoted.status(), ConversationStatus::Active);
    assert!(world.last_to(GRACE).contains("Linus"));
}

// =============================================================================
// Supplementary flows
// =============================================================================

#[tokio::test]
async fn unknown_timezone_is_clarified_before_offers() {
    let world = World::new(
        ScriptedLanguageUnderstanding::new()
            .with_slots("mon 10", vec![slot(10)], None)
            .with_timezone("lisbon", "Europe/Lisbon"),
    );
    let (id, _) = world.start_with(&[("Ada", "+351100")]).await;

    let conv = world.conversation(id).await;
    assert_eq!(state_of(&conv, "+351100"), ParticipantState::TimezoneClarification);

    world.say(GRACE, "mon 10").await;
    world.say(GRACE, "yes").await;
    // No offer while the zone is unknown.
    assert!(world.conversation(id).await.pool().reserved().is_empty());

    world.say("+351100", "Lisbon").await;
    let conv = world.conversation(id).await;
    let ada = conv.participant(&pid("+351100")).unwrap();
    assert_eq!(ada.timezone(), Some("Europe/Lisbon"));
    assert_eq!(ada.state(), ParticipantState::ConfirmationPending);
    assert!(world.last_to("+351100").contains("Europe/Lisbon"));
}

#[tokio::test]
async fn rejected_extraction_is_replaced() {
    let world = World::new(
        ScriptedLanguageUnderstanding::new()
            .with_slots("mon 10", vec![slot(10)], None)
            .with_slots("no, mon 15 instead", vec![slot(15)], None),
    );
    let (id, _) = world.start_with(&[("Ada", ADA)]).await;

    world.say(GRACE, "mon 10").await;
    world.say(GRACE, "no, mon 15 instead").await;
    let conv = world.conversation(id).await;
    assert_eq!(conv.interviewer().staged_slots(), &[slot(15)]);
    assert!(conv.pool().available().is_empty());

    world.say(GRACE, "yes").await;
    let conv = world.conversation(id).await;
    assert_eq!(conv.participant(&pid(ADA)).unwrap().proposed_slot(), Some(slot(15)));
}

#[tokio::test]
async fn interviewee_reschedule_reopens_negotiation() {
    use interview_scheduler::ports::Intent;

    let world = World::new(
        ScriptedLanguageUnderstanding::new()
            .with_slots("mon 10 to 12", vec![slot(10), slot(11)], None)
            .with_intent("can we move it?", Intent::RescheduleRequested),
    );
    let (id, _) = world.start_with(&[("Ada", ADA), ("Linus", LINUS)]).await;
    world.say(GRACE, "mon 10 to 12").await;
    world.say(GRACE, "yes").await;
    world.say(ADA, "yes").await;

    world.say(ADA, "can we move it?").await;

    let conv = world.conversation(id).await;
    let ada = conv.participant(&pid(ADA)).unwrap();
    assert_eq!(ada.reschedule_count(), 1);
    assert!(ada.event_id().is_none());
    assert_eq!(world.calendar.deleted().len(), 1);
    // The old slot stays booked and is never offered again.
    assert!(conv.pool().scheduled().contains(&slot(10)));
    assert!(!conv.pool().available().contains(&slot(10)));
}
