use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, info};

use super::store::DocumentStore;
use crate::models::{Conversation, ConversationSummary, User};

/// Process-local store used when no database URL is configured.
///
/// Uses DashMap for lock-free concurrent access. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<String, User>,
    conversations: DashMap<String, Conversation>,
}

impl MemoryStore {
    pub fn new() -> Self {
        info!("Initializing in-memory document store");
        Self::default()
    }

    pub fn conversation_count(&self) -> usize {
        self.conversations.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get_user(&self, auth0_id: &str) -> Result<Option<User>> {
        Ok(self.users.get(auth0_id).map(|entry| entry.value().clone()))
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        self.users.insert(user.auth0_id.clone(), user.clone());
        debug!("Stored user {}", user.auth0_id);
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        Ok(self.conversations.get(id).map(|entry| entry.value().clone()))
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<()> {
        self.conversations
            .insert(conversation.id.clone(), conversation.clone());
        debug!(
            "Stored conversation {} ({} messages)",
            conversation.id,
            conversation.messages.len()
        );
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let mut summaries: Vec<ConversationSummary> = self
            .conversations
            .iter()
            .filter(|entry| entry.value().is_owned_by(user_id))
            .map(|entry| entry.value().summary())
            .collect();
        summaries.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(summaries)
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool> {
        Ok(self.conversations.remove(id).is_some())
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Message;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn test_list_is_scoped_and_sorted() {
        let store = MemoryStore::new();

        let mut older = Conversation::new("auth0|a", Some("older".into()));
        older.updated_at = Utc::now() - Duration::minutes(5);
        let newer = Conversation::new("auth0|a", Some("newer".into()));
        let foreign = Conversation::new("auth0|b", None);

        for conv in [&older, &newer, &foreign] {
            store.save_conversation(conv).await.unwrap();
        }

        let listed = store.list_conversations("auth0|a").await.unwrap();
        let titles: Vec<_> = listed.iter().map(|s| s.title.as_str()).collect();
        assert_eq!(titles, vec!["newer", "older"]);
        assert_eq!(store.list_conversations("auth0|c").await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_save_replaces_document() {
        let store = MemoryStore::new();
        let mut conv = Conversation::new("auth0|a", None);
        store.save_conversation(&conv).await.unwrap();

        conv.add_message(Message::user("hi"));
        store.save_conversation(&conv).await.unwrap();

        let stored = store.get_conversation(&conv.id).await.unwrap().unwrap();
        assert_eq!(stored.messages.len(), 1);
        assert_eq!(store.conversation_count(), 1);
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryStore::new();
        let conv = Conversation::new("auth0|a", None);
        store.save_conversation(&conv).await.unwrap();

        assert!(store.delete_conversation(&conv.id).await.unwrap());
        assert!(!store.delete_conversation(&conv.id).await.unwrap());
        assert!(store.get_conversation(&conv.id).await.unwrap().is_none());
    }
}
