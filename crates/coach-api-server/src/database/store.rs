use anyhow::Result;
use async_trait::async_trait;

use crate::models::{Conversation, ConversationSummary, User};

/// Persistence port for user and conversation documents.
///
/// Every call is a single round trip; callers never retry.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get_user(&self, auth0_id: &str) -> Result<Option<User>>;

    /// Insert or replace the user keyed by `auth0_id`.
    async fn upsert_user(&self, user: &User) -> Result<()>;

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>>;

    /// Insert or replace the conversation keyed by `id`.
    async fn save_conversation(&self, conversation: &Conversation) -> Result<()>;

    /// Conversations owned by `user_id`, most recently updated first.
    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>>;

    /// Returns whether a document was removed.
    async fn delete_conversation(&self, id: &str) -> Result<bool>;

    /// Cheap connectivity check for the readiness route.
    async fn ping(&self) -> Result<()>;

    fn backend(&self) -> &'static str;
}
