//! In-Memory Attention Flag Repository

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::attention::{AttentionFlag, FlagType};
use crate::domain::foundation::{ConversationId, FlagId, ParticipantId, Timestamp};
use crate::ports::{AttentionFlagRepository, RepositoryError};

/// Flags kept in insertion order.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttentionFlagRepository {
    flags: Arc<RwLock<Vec<AttentionFlag>>>,
}

impl InMemoryAttentionFlagRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttentionFlagRepository for InMemoryAttentionFlagRepository {
    async fn insert(&self, flag: &AttentionFlag) -> Result<(), RepositoryError> {
        self.flags.write().await.push(flag.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<AttentionFlag>, RepositoryError> {
        Ok(self.flags.read().await.clone())
    }

    async fn list_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<Vec<AttentionFlag>, RepositoryError> {
        Ok(self
            .flags
            .read()
            .await
            .iter()
            .filter(|f| f.conversation_id() == *conversation_id)
            .cloned()
            .collect())
    }

    async fn resolve(&self, id: &FlagId, at: Timestamp) -> Result<bool, RepositoryError> {
        let mut guard = self.flags.write().await;
        let flag = guard
            .iter_mut()
            .find(|f| f.id() == *id)
            .ok_or(RepositoryError::FlagNotFound(*id))?;
        Ok(flag.resolve(at))
    }

    async fn resolve_matching(
        &self,
        conversation_id: &ConversationId,
        participant: &ParticipantId,
        flag_type: FlagType,
        at: Timestamp,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.flags.write().await;
        let resolved = guard
            .iter_mut()
            .filter(|f| f.conversation_id() == *conversation_id && f.concerns(participant, flag_type))
            .map(|f| f.resolve(at))
            .filter(|changed| *changed)
            .count();
        Ok(resolved)
    }

    async fn delete_for_conversation(
        &self,
        conversation_id: &ConversationId,
    ) -> Result<usize, RepositoryError> {
        let mut guard = self.flags.write().await;
        let before = guard.len();
        guard.retain(|f| f.conversation_id() != *conversation_id);
        Ok(before - guard.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pid(n: &str) -> ParticipantId {
        ParticipantId::from_phone(n).unwrap()
    }

    #[tokio::test]
    async fn resolve_matching_only_touches_open_flags_of_that_kind() {
        let repo = InMemoryAttentionFlagRepository::new();
        let conv = ConversationId::new();
        let now = Timestamp::now();

        let silent = AttentionFlag::raise(conv, pid("+1"), FlagType::NoResponse, now);
        let stuck = AttentionFlag::raise(conv, pid("+1"), FlagType::NoAvailableSlots, now);
        let other = AttentionFlag::raise(conv, pid("+2"), FlagType::NoResponse, now);
        for f in [&silent, &stuck, &other] {
            repo.insert(f).await.unwrap();
        }

        let n = repo
            .resolve_matching(&conv, &pid("+1"), FlagType::NoResponse, now)
            .await
            .unwrap();
        assert_eq!(n, 1);

        let again = repo
            .resolve_matching(&conv, &pid("+1"), FlagType::NoResponse, now)
            .await
            .unwrap();
        assert_eq!(again, 0);

        let open: Vec<_> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .filter(|f| !f.is_resolved())
            .map(|f| f.id())
            .collect();
        assert_eq!(open, vec![stuck.id(), other.id()]);
    }

    #[tokio::test]
    async fn resolve_unknown_flag_is_an_error() {
        let repo = InMemoryAttentionFlagRepository::new();
        let id = FlagId::new();
        assert_eq!(
            repo.resolve(&id, Timestamp::now()).await,
            Err(RepositoryError::FlagNotFound(id))
        );
    }

    #[tokio::test]
    async fn delete_for_conversation_leaves_others() {
        let repo = InMemoryAttentionFlagRepository::new();
        let a = ConversationId::new();
        let b = ConversationId::new();
        let now = Timestamp::now();
        repo.insert(&AttentionFlag::raise(a, pid("+1"), FlagType::NoResponse, now))
            .await
            .unwrap();
        repo.insert(&AttentionFlag::raise(b, pid("+1"), FlagType::NoResponse, now))
            .await
            .unwrap();

        assert_eq!(repo.delete_for_conversation(&a).await.unwrap(), 1);
        assert_eq!(repo.list_for_conversation(&b).await.unwrap().len(), 1);
        assert!(repo.list_for_conversation(&a).await.unwrap().is_empty());
    }
}
