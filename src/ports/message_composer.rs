//! Message Composer Port - turns directives into prose.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::scheduling::{MessageDirective, Role};

use super::ServiceError;

/// What the composer knows about the recipient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposeContext {
    pub recipient_name: String,
    /// `None` for recipients outside the conversation (the contact person).
    pub role: Option<Role>,
    pub timezone: Option<String>,
    pub meeting_duration_minutes: u32,
    pub company_details: Option<String>,
}

/// Port for the NLG collaborator.
///
/// The core only ever supplies structured directives; wording is entirely
/// the composer's concern.
#[async_trait]
pub trait MessageComposer: Send + Sync {
    async fn compose(
        &self,
        context: &ComposeContext,
        directive: &MessageDirective,
    ) -> Result<String, ServiceError>;
}
