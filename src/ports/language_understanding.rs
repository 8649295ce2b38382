//! Language Understanding Port - structured reading of free-text messages.
//!
//! The scheduling core never parses text itself. Everything it needs from a
//! message (intent, slots, yes/no, timezone) comes through this port.
//! Ambiguous results are reported as the conservative default (intent
//! `None`, not confirmed, no timezone), never as errors.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::scheduling::{Participant, Slot};

use super::ServiceError;

/// What a participant's message is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Intent {
    CancellationRequested,
    Query,
    RescheduleRequested,
    SlotAddRequested,
    SlotRemoveRequested,
    SlotUpdateRequested,
    MeetingDurationChangeRequested,
    /// No special intent: the message continues the current negotiation step.
    #[default]
    None,
}

/// Slots found in a message, already split into meeting-sized chunks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotExtraction {
    pub slots: Vec<Slot>,
    /// IANA zone mentioned alongside the slots, if any.
    pub timezone: Option<String>,
}

/// Port for the NLU collaborator.
#[async_trait]
pub trait LanguageUnderstanding: Send + Sync {
    /// Classifies `message` in light of the participant's state and history.
    async fn detect_intent(
        &self,
        participant: &Participant,
        message: &str,
    ) -> Result<Intent, ServiceError>;

    /// Extracts candidate slots of `duration_minutes` from `message`.
    async fn extract_slots(
        &self,
        participant: &Participant,
        message: &str,
        duration_minutes: u32,
    ) -> Result<SlotExtraction, ServiceError>;

    /// Returns true only for a clear yes.
    async fn detect_confirmation(
        &self,
        participant: &Participant,
        message: &str,
    ) -> Result<bool, ServiceError>;

    /// Infers an IANA zone from a phone number or city name.
    ///
    /// `None` means unspecified.
    async fn infer_timezone(&self, hint: &str) -> Result<Option<String>, ServiceError>;
}
