//! File-based Attention Flag Repository
//!
//! Keeps every flag in a single YAML document. Each change rewrites the
//! document through a temporary file and a rename, under a mutex so
//! concurrent read-modify-write cycles cannot lose each other's flags.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::attention::{AttentionFlag, FlagType};
use crate::domain::foundation::{ConversationId, FlagId, ParticipantId, Timestamp};
use crate::ports::{AttentionFlagRepository, RepositoryError};

/// File-based storage for attention flags
#[derive(Debug, Clone)]
pub struct FileAttentionFlagRepository {
    path: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileAttentionFlagRepository {
    /// Create a repository backed by the document at `path`
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileAttentionFlagRepository::new("./data/attention_flags.yaml");
    /// ```
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    async fn load(&self) -> Result<Vec<AttentionFlag>, RepositoryError> {
        let yaml = match fs::read_to_string(&self.path).await {
            Ok(yaml) => yaml,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };
        serde_yaml::from_str(&yaml).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn store(&self, flags: &[AttentionFlag]) -> Result<(), RepositoryError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| RepositoryError::Io(e.to_string()))?;
        }
        let yaml =
            serde_yaml::to_string(flags).map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let tmp = self.path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))
    }
}

#[async_trait]
impl AttentionFlagRepository for FileAttentionFlagRepository {
    async fn insert(&self, flag: &AttentionFlag) -> Result<(), RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await?;
        flags.push(flag.clone());
        self.store(&flags).await
    }

    async fn list_all(&self) -> Result<Vec<AttentionFlag>, RepositoryError> {
        self.load().await
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<AttentionFlag>, RepositoryError> {
        let mut flags = self.load().await?;
        flags.retain(|f| f.conversation_id() == *conversation_id);
        Ok(flags)
    }

    async fn resolve(&self, id: &FlagId, at: Timestamp) -> Result<bool, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await?;
        let flag = flags
            .iter_mut()
            .find(|f| f.id() == *id)
            .ok_or(RepositoryError::FlagNotFound(*id))?;
        if !flag.resolve(at) {
            return Ok(false);
        }
        self.store(&flags).await?;
        Ok(true)
    }

    async fn resolve_matching(
        &self,
        conversation_id: &ConversationId,
        participant: &ParticipantId,
        flag_type: FlagType,
        at: Timestamp,
    ) -> Result<usize, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await?;
        let resolved = flags
            .iter_mut()
            .filter(|f| f.conversation_id() == *conversation_id && f.concerns(participant, flag_type))
            .map(|f| f.resolve(at))
            .filter(|changed| *changed)
            .count();
        if resolved > 0 {
            self.store(&flags).await?;
        }
        Ok(resolved)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, RepositoryError> {
        let _guard = self.write_lock.lock().await;
        let mut flags = self.load().await?;
        let before = flags.len();
        flags.retain(|f| f.conversation_id() != *conversation_id);
        let removed = before - flags.len();
        if removed > 0 {
            self.store(&flags).await?;
        }
        Ok(removed)
    }
}
