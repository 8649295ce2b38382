//! File-based Conversation Repository
//!
//! Stores each conversation as one YAML document named after its id.
//! Writes go through a temporary file and a rename so a reader never sees a
//! half-written document.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::foundation::{ConversationId, ParticipantId};
use crate::domain::scheduling::{Conversation, ConversationStatus};
use crate::ports::{ConversationRepository, RepositoryError};

/// File-based storage for conversations
#[derive(Debug, Clone)]
pub struct FileConversationRepository {
    base_path: PathBuf,
}

impl FileConversationRepository {
    /// Create a repository rooted at `base_path`
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileConversationRepository::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn document_path(&self, id: &ConversationId) -> PathBuf {
        self.base_path.join(format!("{}.yaml", id))
    }

    async fn ensure_dir(&self) -> Result<(), RepositoryError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))
    }

    async fn write_document(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        self.ensure_dir().await?;

        let yaml = serde_yaml::to_string(conversation)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let path = self.document_path(&conversation.id());
        let tmp = path.with_extension("yaml.tmp");
        fs::write(&tmp, yaml)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        fs::rename(&tmp, &path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))
    }

    async fn read_document(&self, path: &Path) -> Result<Conversation, RepositoryError> {
        let yaml = fs::read_to_string(path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        serde_yaml::from_str(&yaml).map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    /// Loads every stored conversation, oldest first.
    async fn load_all(&self) -> Result<Vec<Conversation>, RepositoryError> {
        let mut entries = match fs::read_dir(&self.base_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };

        let mut all = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            all.push(self.read_document(&path).await?);
        }
        all.sort_by_key(|c| (c.created_at(), c.id()));
        Ok(all)
    }

    async fn exists(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
        fs::try_exists(self.document_path(id))
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))
    }
}

#[async_trait]
impl ConversationRepository for FileConversationRepository {
    async fn insert(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        if self.exists(&conversation.id()).await? {
            return Err(RepositoryError::AlreadyExists(conversation.id()));
        }
        self.write_document(conversation).await
    }

    async fn save(&self, conversation: &Conversation) -> Result<(), RepositoryError> {
        if !self.exists(&conversation.id()).await? {
            return Err(RepositoryError::NotFound(conversation.id()));
        }
        self.write_document(conversation).await
    }

    async fn find_by_id(&self, id: &ConversationId) -> Result<Option<Conversation>, RepositoryError> {
        let path = self.document_path(id);
        if !self.exists(id).await? {
            return Ok(None);
        }
        self.read_document(&path).await.map(Some)
    }

    async fn find_active_by_participant(
        &self,
        participant: &ParticipantId,
    ) -> Result<Option<Conversation>, RepositoryError> {
        Ok(self
            .load_all()
            .await?
            .into_iter()
            .find(|c| c.is_active() && c.participant(participant).is_some()))
    }

    async fn list_by_status(
        &self,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut all = self.load_all().await?;
        all.retain(|c| c.status() == status);
        Ok(all)
    }

    async fn list_for_interviewer(
        &self,
        interviewer: &ParticipantId,
        status: ConversationStatus,
    ) -> Result<Vec<Conversation>, RepositoryError> {
        let mut all = self.load_all().await?;
        all.retain(|c| c.status() == status && c.interviewer().id() == interviewer);
        Ok(all)
    }

    async fn delete(&self, id: &ConversationId) -> Result<bool, RepositoryError> {
        match fs::remove_file(self.document_path(id)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(RepositoryError::Io(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;
    use crate::domain::scheduling::{Participant, SchedulingPolicy, Slot};
    use tempfile::TempDir;

    fn pid(n: &str) -> ParticipantId {
        ParticipantId::from_phone(n).unwrap()
    }

    fn conversation() -> Conversation {
        Conversation::new(
            Participant::interviewer(pid("+900"), "Grace", Some("grace@example.com".into())),
            vec![
                Participant::interviewee(pid("+100"), "Ada", None, Some("Engineer".into())),
                Participant::interviewee(pid("+101"), "Linus", None, None),
            ],
            SchedulingPolicy::new(45, None, Some("Acme".into())).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn negotiated_state_survives_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileConversationRepository::new(temp_dir.path());

        let mut conv = conversation();
        conv.activate(Timestamp::now()).unwrap();
        conv.resolve_timezone(&pid("+100"), Some("UTC".into())).unwrap();
        conv.resolve_timezone(&pid("+101"), Some("UTC".into())).unwrap();
        let start = Timestamp::now().plus_hours(24);
        let slot = Slot::new(start, start.plus_minutes(45)).unwrap();
        conv.stage_availability(vec![slot], None).unwrap();
        conv.confirm_staged_availability().unwrap();
        conv.advance(2, Timestamp::now()).unwrap();
        conv.decline(&pid("+100")).unwrap();

        repo.insert(&conv).await.unwrap();
        let loaded = repo.find_by_id(&conv.id()).await.unwrap().unwrap();

        assert_eq!(loaded, conv);
        assert_eq!(
            loaded.pool().denials_for(&slot.key()).map(|d| d.len()),
            Some(1)
        );
    }

    #[tokio::test]
    async fn missing_directory_lists_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileConversationRepository::new(temp_dir.path().join("absent"));

        assert!(repo
            .list_by_status(ConversationStatus::Queued)
            .await
            .unwrap()
            .is_empty());
        assert!(repo.find_by_id(&ConversationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn save_requires_existing_document() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileConversationRepository::new(temp_dir.path());
        let conv = conversation();

        assert_eq!(repo.save(&conv).await, Err(RepositoryError::NotFound(conv.id())));
        repo.insert(&conv).await.unwrap();
        repo.save(&conv).await.unwrap();
        assert!(repo.delete(&conv.id()).await.unwrap());
        assert!(!repo.delete(&conv.id()).await.unwrap());
    }

    #[tokio::test]
    async fn finds_active_conversation_by_participant() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileConversationRepository::new(temp_dir.path());
        let mut conv = conversation();
        conv.activate(Timestamp::now()).unwrap();
        repo.insert(&conv).await.unwrap();

        let found = repo.find_active_by_participant(&pid("+101")).await.unwrap();
        assert_eq!(found.map(|c| c.id()), Some(conv.id()));
        assert!(repo
            .find_active_by_participant(&pid("+555"))
            .await
            .unwrap()
            .is_none());
    }
}
