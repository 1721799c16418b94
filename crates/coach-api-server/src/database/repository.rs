use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use tracing::{debug, info};

use super::store::DocumentStore;
use super::DbPool;
use crate::models::{Conversation, ConversationSummary, User};

/// PostgreSQL backend. Each record is one JSONB document plus the columns
/// queries filter and sort on.
pub struct PgStore {
    pub pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create the document tables if they are missing.
    pub async fn ensure_schema(&self) -> Result<()> {
        let statements = [
            r#"CREATE TABLE IF NOT EXISTS users (
                auth0_id   TEXT PRIMARY KEY,
                doc        JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )"#,
            r#"CREATE TABLE IF NOT EXISTS conversations (
                id         TEXT PRIMARY KEY,
                user_id    TEXT NOT NULL,
                doc        JSONB NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )"#,
            r#"CREATE INDEX IF NOT EXISTS conversations_user_updated_idx
                ON conversations (user_id, updated_at DESC)"#,
        ];

        for statement in statements {
            sqlx::query(statement)
                .execute(self.pool.get_pool())
                .await
                .context("Failed to apply schema")?;
        }

        info!("Document schema ready");
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for PgStore {
    async fn get_user(&self, auth0_id: &str) -> Result<Option<User>> {
        let doc = sqlx::query_scalar::<_, Json<User>>("SELECT doc FROM users WHERE auth0_id = $1")
            .bind(auth0_id)
            .fetch_optional(self.pool.get_pool())
            .await?;

        Ok(doc.map(|Json(user)| user))
    }

    async fn upsert_user(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO users (auth0_id, doc, updated_at)
               VALUES ($1, $2, $3)
               ON CONFLICT (auth0_id)
               DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at"#,
        )
        .bind(&user.auth0_id)
        .bind(Json(user))
        .bind(user.updated_at)
        .execute(self.pool.get_pool())
        .await?;

        debug!("Upserted user {}", user.auth0_id);
        Ok(())
    }

    async fn get_conversation(&self, id: &str) -> Result<Option<Conversation>> {
        let doc = sqlx::query_scalar::<_, Json<Conversation>>(
            "SELECT doc FROM conversations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool.get_pool())
        .await?;

        Ok(doc.map(|Json(conversation)| conversation))
    }

    async fn save_conversation(&self, conversation: &Conversation) -> Result<()> {
        sqlx::query(
            r#"INSERT INTO conversations (id, user_id, doc, updated_at)
               VALUES ($1, $2, $3, $4)
               ON CONFLICT (id)
               DO UPDATE SET doc = EXCLUDED.doc, updated_at = EXCLUDED.updated_at"#,
        )
        .bind(&conversation.id)
        .bind(&conversation.user_id)
        .bind(Json(conversation))
        .bind(conversation.updated_at)
        .execute(self.pool.get_pool())
        .await?;

        debug!(
            "Saved conversation {} ({} messages)",
            conversation.id,
            conversation.messages.len()
        );
        Ok(())
    }

    async fn list_conversations(&self, user_id: &str) -> Result<Vec<ConversationSummary>> {
        let rows = sqlx::query_as::<_, (String, String, DateTime<Utc>, DateTime<Utc>, i32)>(
            r#"SELECT
                id,
                doc->>'title',
                (doc->>'created_at')::timestamptz,
                updated_at,
                COALESCE(jsonb_array_length(doc->'messages'), 0)
               FROM conversations
               WHERE user_id = $1
               ORDER BY updated_at DESC"#,
        )
        .bind(user_id)
        .persistent(false)
        .fetch_all(self.pool.get_pool())
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, title, created_at, updated_at, count)| ConversationSummary {
                id,
                title,
                created_at,
                updated_at,
                message_count: count.max(0) as usize,
            })
            .collect())
    }

    async fn delete_conversation(&self, id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM conversations WHERE id = $1")
            .bind(id)
            .execute(self.pool.get_pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(self.pool.get_pool()).await?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
