//! Conversation and flag storage settings

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct StorageConfig {
    /// Root for YAML storage: `conversations/` and `attention_flags.yaml`.
    /// In-memory when unset.
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    pub fn is_persistent(&self) -> bool {
        self.data_dir.is_some()
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        match &self.data_dir {
            Some(dir) if dir.as_os_str().is_empty() => Err(ValidationError::EmptyDataDir),
            _ => Ok(()),
        }
    }
}
