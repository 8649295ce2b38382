//! Recording Messaging Gateway
//!
//! Keeps every delivered message in memory instead of sending it. Local runs
//! log deliveries; tests read them back.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::foundation::ParticipantId;
use crate::ports::{MessagingGateway, ServiceError};

/// One message handed to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub to: ParticipantId,
    pub text: String,
}

#[derive(Debug, Default)]
struct Outbox {
    sent: Vec<SentMessage>,
    failures: VecDeque<ServiceError>,
    unreachable: HashSet<ParticipantId>,
    attempts: usize,
}

/// Messaging gateway that records instead of delivering.
#[derive(Debug, Clone, Default)]
pub struct RecordingMessagingGateway {
    outbox: Arc<Mutex<Outbox>>,
}

impl RecordingMessagingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn outbox(&self) -> std::sync::MutexGuard<'_, Outbox> {
        self.outbox.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Fails the next send attempt.
    pub fn with_failure(self, error: ServiceError) -> Self {
        self.fail_next(error);
        self
    }

    pub fn fail_next(&self, error: ServiceError) {
        self.outbox().failures.push_back(error);
    }

    /// Every send to `number` fails as unavailable until cleared.
    pub fn make_unreachable(&self, number: &ParticipantId) {
        self.outbox().unreachable.insert(number.clone());
    }

    pub fn make_reachable(&self, number: &ParticipantId) {
        self.outbox().unreachable.remove(number);
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.outbox().sent.clone()
    }

    pub fn sent_to(&self, number: &ParticipantId) -> Vec<String> {
        self.outbox()
            .sent
            .iter()
            .filter(|m| &m.to == number)
            .map(|m| m.text.clone())
            .collect()
    }

    /// Number of send calls, including failed ones.
    pub fn attempts(&self) -> usize {
        self.outbox().attempts
    }

    pub fn clear(&self) {
        self.outbox().sent.clear();
    }
}

#[async_trait]
impl MessagingGateway for RecordingMessagingGateway {
    async fn send(&self, to: &ParticipantId, text: &str) -> Result<(), ServiceError> {
        let mut outbox = self.outbox();
        outbox.attempts += 1;
        if let Some(error) = outbox.failures.pop_front() {
            return Err(error);
        }
        if outbox.unreachable.contains(to) {
            return Err(ServiceError::unavailable(format!("{} unreachable", to)));
        }
        tracing::debug!(to = %to, chars = text.len(), "message recorded");
        outbox.sent.push(SentMessage {
            to: to.clone(),
            text: text.to_string(),
        });
        Ok(())
    }
}
