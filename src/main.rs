//! Local runner.
//!
//! Wires the engine to the scripted NLU, template composer, recording
//! gateway and mock calendar, runs the attention monitor in the
//! background, and reads events from stdin:
//!
//! - a JSON object starts a conversation
//! - `<number> <message>` delivers an inbound message
//! - `/active`, `/scheduled`, `/flags` print admin views
//!
//! With `storage.data_dir` set, conversations live under
//! `<data_dir>/conversations/` and flags in `<data_dir>/attention_flags.yaml`,
//! so both survive a restart. Otherwise everything is kept in memory.
//!
//! Stops on Ctrl-C or end of input.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use interview_scheduler::adapters::{
    FileAttentionFlagRepository, FileConversationRepository, InMemoryAttentionFlagRepository,
    InMemoryConversationRepository,
    MockCalendarService, RecordingMessagingGateway, ScriptedLanguageUnderstanding,
    TemplateMessageComposer,
};
use interview_scheduler::application::{
    AttentionMonitor, ConversationLocks, ConversationOrchestrator, EffectExecutor,
    ListConversationsHandler, ListConversationsQuery, ListFlagsHandler, ListFlagsQuery,
    ListScheduledInterviewsHandler, StartConversationCommand, StartConversationHandler,
};
use interview_scheduler::config::{AppConfig, TelemetryConfig};
use interview_scheduler::ports::{AttentionFlagRepository, ConversationRepository};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;
    init_tracing(&config.telemetry);

    let (conversations, flags): (Arc<dyn ConversationRepository>, Arc<dyn AttentionFlagRepository>) =
        match &config.storage.data_dir {
            Some(dir) => {
                tracing::info!(data_dir = %dir.display(), "using file storage");
                (
                    Arc::new(FileConversationRepository::new(dir.join("conversations"))),
                    Arc::new(FileAttentionFlagRepository::new(dir.join("attention_flags.yaml"))),
                )
            }
            None => {
                tracing::info!("using in-memory storage");
                (
                    Arc::new(InMemoryConversationRepository::new()),
                    Arc::new(InMemoryAttentionFlagRepository::new()),
                )
            }
        };
    let gateway = RecordingMessagingGateway::new();
    let effects = Arc::new(EffectExecutor::new(
        Arc::new(TemplateMessageComposer::new()),
        Arc::new(gateway.clone()),
        Arc::new(MockCalendarService::new()),
        config.retry.policy(),
    ));
    let locks = Arc::new(ConversationLocks::new());

    let orchestrator = Arc::new(ConversationOrchestrator::new(
        conversations.clone(),
        flags.clone(),
        Arc::new(ScriptedLanguageUnderstanding::new()),
        effects.clone(),
        locks.clone(),
        config.scheduling.orchestrator_config(),
    ));
    let monitor = AttentionMonitor::new(
        conversations.clone(),
        flags.clone(),
        locks,
        effects,
        config.monitor.monitor_config(),
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let monitor_task = tokio::spawn(async move { monitor.run(shutdown_rx).await });

    let start = StartConversationHandler::new(orchestrator.clone());
    let list_conversations = ListConversationsHandler::new(conversations.clone());
    let list_scheduled = ListScheduledInterviewsHandler::new(conversations);
    let list_flags = ListFlagsHandler::new(flags);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            line = lines.next_line() => match line? {
                Some(line) => line,
                None => break,
            },
        };
        let line = line.trim();
        let sent_before = gateway.sent().len();

        match line {
            "" => continue,
            "/active" => match list_conversations.handle(ListConversationsQuery::active()).await {
                Ok(found) => {
                    for conv in found {
                        println!("{} {}", conv.id(), conv.interviewer().name());
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            "/scheduled" => match list_scheduled.handle().await {
                Ok(found) => {
                    for i in found {
                        println!(
                            "{} with {} at {}",
                            i.interviewee,
                            i.interviewer,
                            i.slot.start.to_report_string()
                        );
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            "/flags" => match list_flags.handle(ListFlagsQuery::default()).await {
                Ok(found) => {
                    for flag in found {
                        println!(
                            "{} {} {} resolved={}",
                            flag.id(),
                            flag.participant_id(),
                            flag.flag_type(),
                            flag.is_resolved()
                        );
                    }
                }
                Err(e) => eprintln!("error: {e}"),
            },
            json if json.starts_with('{') => {
                match serde_json::from_str::<StartConversationCommand>(json) {
                    Ok(cmd) => match start.handle(cmd).await {
                        Ok(started) => println!("started {} ({:?})", started.conversation_id, started.admission),
                        Err(e) => eprintln!("error: {e}"),
                    },
                    Err(e) => eprintln!("invalid start request: {e}"),
                }
            }
            message => {
                let (from, text) = message.split_once(char::is_whitespace).unwrap_or((message, ""));
                if let Err(e) = orchestrator.handle_message(from, text.trim()).await {
                    eprintln!("error: {e}");
                }
            }
        }

        for sent in gateway.sent().into_iter().skip(sent_before) {
            println!("-> {}: {}", sent.to, sent.text);
        }
    }

    tracing::info!("shutting down");
    shutdown_tx.send(true)?;
    monitor_task.await?;
    Ok(())
}

fn init_tracing(telemetry: &TelemetryConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&telemetry.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if telemetry.json_logs() {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
