//! Messaging Gateway Port - the chat transport.

use async_trait::async_trait;

use crate::domain::foundation::ParticipantId;

use super::ServiceError;

/// Port for delivering a text message to a phone number.
///
/// Sends are retried by the caller, so a delivery may happen twice; a
/// duplicate is preferable to a silent drop.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send(&self, to: &ParticipantId, text: &str) -> Result<(), ServiceError>;
}
