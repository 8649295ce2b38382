//! Scripted Language Understanding for testing and local runs.
//!
//! Readings are keyed by message text, so a test states up front what each
//! message "means" and the orchestrator's call order does not matter.
//!
//! # Features
//!
//! - Per-message intent, slot extraction and confirmation
//! - Keyword fallback for plain yes/no replies
//! - Timezone table matched by exact hint or longest number prefix
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let nlu = ScriptedLanguageUnderstanding::new()
//!     .with_slots("Mon 9-11 works", vec![slot_a, slot_b], None)
//!     .with_intent("please cancel", Intent::CancellationRequested)
//!     .with_timezone("+1", "America/New_York");
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use crate::domain::scheduling::{Participant, Slot};
use crate::ports::{Intent, LanguageUnderstanding, ServiceError, SlotExtraction};

const AFFIRMATIVES: &[&str] = &[
    "yes",
    "y",
    "yes please",
    "yep",
    "yeah",
    "ok",
    "okay",
    "sure",
    "confirm",
    "confirmed",
    "sounds good",
    "works for me",
];

/// Which port method was called, for verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NluCall {
    DetectIntent { message: String },
    ExtractSlots { message: String, duration_minutes: u32 },
    DetectConfirmation { message: String },
    InferTimezone { hint: String },
}

#[derive(Debug, Default)]
struct Script {
    intents: HashMap<String, Intent>,
    extractions: HashMap<String, SlotExtraction>,
    confirmations: HashMap<String, bool>,
    timezones: HashMap<String, String>,
    failures: VecDeque<ServiceError>,
    calls: Vec<NluCall>,
}

/// NLU collaborator driven by a script instead of a model.
#[derive(Debug, Clone, Default)]
pub struct ScriptedLanguageUnderstanding {
    script: Arc<Mutex<Script>>,
}

fn key(message: &str) -> String {
    message.trim().to_lowercase()
}

impl ScriptedLanguageUnderstanding {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Classifies `message` as `intent`.
    pub fn with_intent(self, message: &str, intent: Intent) -> Self {
        self.script().intents.insert(key(message), intent);
        self
    }

    /// Makes `message` yield `slots` on extraction.
    pub fn with_slots(self, message: &str, slots: Vec<Slot>, timezone: Option<&str>) -> Self {
        self.script().extractions.insert(
            key(message),
            SlotExtraction {
                slots,
                timezone: timezone.map(str::to_string),
            },
        );
        self
    }

    /// Overrides the yes/no reading of `message`.
    pub fn with_confirmation(self, message: &str, confirmed: bool) -> Self {
        self.script().confirmations.insert(key(message), confirmed);
        self
    }

    /// Maps a city name or number prefix to an IANA zone.
    pub fn with_timezone(self, hint: &str, timezone: &str) -> Self {
        self.script()
            .timezones
            .insert(key(hint), timezone.to_string());
        self
    }

    /// Fails the next call, whichever method it is.
    pub fn with_failure(self, error: ServiceError) -> Self {
        self.script().failures.push_back(error);
        self
    }

    /// Queues a failure on a shared handle after construction.
    pub fn fail_next(&self, error: ServiceError) {
        self.script().failures.push_back(error);
    }

    pub fn calls(&self) -> Vec<NluCall> {
        self.script().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.script().calls.len()
    }

    fn record(&self, call: NluCall) -> Result<(), ServiceError> {
        let mut script = self.script();
        script.calls.push(call);
        match script.failures.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl LanguageUnderstanding for ScriptedLanguageUnderstanding {
    async fn detect_intent(
        &self,
        _participant: &Participant,
        message: &str,
    ) -> Result<Intent, ServiceError> {
        self.record(NluCall::DetectIntent {
            message: message.to_string(),
        })?;
        Ok(self
            .script()
            .intents
            .get(&key(message))
            .copied()
            .unwrap_or_default())
    }

    async fn extract_slots(
        &self,
        _participant: &Participant,
        message: &str,
        duration_minutes: u32,
    ) -> Result<SlotExtraction, ServiceError> {
        self.record(NluCall::ExtractSlots {
            message: message.to_string(),
            duration_minutes,
        })?;
        Ok(self
            .script()
            .extractions
            .get(&key(message))
            .cloned()
            .unwrap_or_default())
    }

    async fn detect_confirmation(
        &self,
        _participant: &Participant,
        message: &str,
    ) -> Result<bool, ServiceError> {
        self.record(NluCall::DetectConfirmation {
            message: message.to_string(),
        })?;
        let k = key(message);
        if let Some(confirmed) = self.script().confirmations.get(&k) {
            return Ok(*confirmed);
        }
        let trimmed = k.trim_end_matches(['.', '!']);
        Ok(AFFIRMATIVES.contains(&trimmed))
    }

    async fn infer_timezone(&self, hint: &str) -> Result<Option<String>, ServiceError> {
        self.record(NluCall::InferTimezone {
            hint: hint.to_string(),
        })?;
        let k = key(hint);
        let script = self.script();
        if let Some(tz) = script.timezones.get(&k) {
            return Ok(Some(tz.clone()));
        }
        // Longest matching number prefix wins: "+44" beats "+4".
        Ok(script
            .timezones
            .iter()
            .filter(|(prefix, _)| prefix.starts_with('+') && k.starts_with(prefix.as_str()))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(_, tz)| tz.clone()))
    }
}
