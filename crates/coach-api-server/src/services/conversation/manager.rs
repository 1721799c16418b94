use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::context_window::{maybe_retitle, windowed};
use crate::database::DocumentStore;
use crate::models::chat::{ChatReply, GenerateReply};
use crate::models::{ChatMessage, Conversation, ConversationSummary, Message};
use crate::utils::error::ApiError;

/// Trait for the text generation backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// One completion for the given prompt. Called at most once per request.
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String, ApiError>;

    fn model(&self) -> String;
}

/// Chat operations over the document store and the generation backend.
pub struct ConversationService {
    store: Arc<dyn DocumentStore>,
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    max_context_messages: usize,
    /// One lock per conversation id; sends to the same id run one at a time.
    turn_locks: DashMap<String, Arc<Mutex<()>>>,
}

impl ConversationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmProvider>,
        system_prompt: String,
        max_context_messages: usize,
    ) -> Self {
        Self {
            store,
            llm,
            system_prompt,
            max_context_messages,
            turn_locks: DashMap::new(),
        }
    }

    fn turn_lock(&self, id: &str) -> Arc<Mutex<()>> {
        self.turn_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone()
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<ConversationSummary>, ApiError> {
        self.store
            .list_conversations(user_id)
            .await
            .map_err(ApiError::database)
    }

    pub async fn create(&self, user_id: &str, title: Option<String>) -> Result<Conversation, ApiError> {
        let conversation = Conversation::new(user_id, title);
        self.store
            .save_conversation(&conversation)
            .await
            .map_err(ApiError::database)?;

        info!("Created conversation {} for {}", conversation.id, user_id);
        Ok(conversation)
    }

    /// The conversation, if it exists and belongs to `user_id`.
    pub async fn get(&self, user_id: &str, id: &str) -> Result<Conversation, ApiError> {
        let conversation = self
            .store
            .get_conversation(id)
            .await
            .map_err(ApiError::database)?
            .ok_or_else(|| ApiError::NotFound("Conversation not found".to_string()))?;

        ensure_owner(&conversation, user_id)?;
        Ok(conversation)
    }

    /// Append `text`, generate a reply and persist both.
    ///
    /// An unknown `id` starts a new conversation for the caller. If generation
    /// fails nothing is written. Concurrent sends to the same `id` are
    /// serialized so neither exchange overwrites the other.
    pub async fn send_message(&self, user_id: &str, id: &str, text: &str) -> Result<ChatReply, ApiError> {
        if text.is_empty() {
            return Err(ApiError::BadRequest("Message content is required".to_string()));
        }

        let lock = self.turn_lock(id);
        let _turn = lock.lock().await;

        let mut conversation = match self
            .store
            .get_conversation(id)
            .await
            .map_err(ApiError::database)?
        {
            Some(existing) => {
                ensure_owner(&existing, user_id)?;
                existing
            }
            None => {
                debug!("Conversation {} not found, starting a new one", id);
                Conversation::new(user_id, None)
            }
        };

        conversation.add_message(Message::user(text));
        let prompt = self.build_prompt(&conversation);

        let start = Instant::now();
        let reply = self.llm.generate(&prompt).await.map_err(|e| {
            warn!("Generation failed for conversation {}: {}", conversation.id, e);
            e
        })?;
        debug!(
            "Generated reply for {} in {:?} ({} prompt messages)",
            conversation.id,
            start.elapsed(),
            prompt.len()
        );

        conversation.add_message(Message::assistant(reply.clone()));
        if maybe_retitle(&mut conversation) {
            debug!("Retitled conversation {} to {:?}", conversation.id, conversation.title);
        }

        self.store
            .save_conversation(&conversation)
            .await
            .map_err(ApiError::database)?;

        Ok(ChatReply {
            response: reply,
            conversation_id: conversation.id,
            model: self.llm.model(),
            title: conversation.title,
        })
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<(), ApiError> {
        self.get(user_id, id).await?;

        let removed = self
            .store
            .delete_conversation(id)
            .await
            .map_err(ApiError::database)?;
        if !removed {
            return Err(ApiError::NotFound("Conversation not found".to_string()));
        }
        self.turn_locks.remove(id);

        info!("Deleted conversation {} for {}", id, user_id);
        Ok(())
    }

    /// Single-turn generation without history.
    pub async fn generate(&self, prompt: &str) -> Result<GenerateReply, ApiError> {
        if prompt.is_empty() {
            return Err(ApiError::BadRequest("Prompt is required".to_string()));
        }

        let response = self.llm.generate(&[ChatMessage::user(prompt)]).await?;
        Ok(GenerateReply {
            response,
            model: self.llm.model(),
        })
    }

    /// System prompt followed by the bounded history window.
    fn build_prompt(&self, conversation: &Conversation) -> Vec<ChatMessage> {
        let window = windowed(&conversation.messages, self.max_context_messages);

        let mut prompt = Vec::with_capacity(window.len() + 1);
        if !self.system_prompt.trim().is_empty() {
            prompt.push(ChatMessage::system(self.system_prompt.clone()));
        }
        prompt.extend(window.iter().map(ChatMessage::from));
        prompt
    }
}

fn ensure_owner(conversation: &Conversation, user_id: &str) -> Result<(), ApiError> {
    if conversation.is_owned_by(user_id) {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Access denied".to_string()))
    }
}
