use std::sync::Arc;

use axum::extract::FromRef;

use crate::auth::TokenVerifier;
use crate::config::Settings;
use crate::database::DocumentStore;
use crate::services::{ConversationService, LlmProvider, UserService};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub verifier: Arc<TokenVerifier>,
    pub store: Arc<dyn DocumentStore>,
    pub conversations: Arc<ConversationService>,
    pub users: Arc<UserService>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        verifier: Arc<TokenVerifier>,
        store: Arc<dyn DocumentStore>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        let conversations = Arc::new(ConversationService::new(
            store.clone(),
            llm,
            settings.prompts.coach_system_prompt.clone(),
            settings.conversation.max_context_messages,
        ));
        let users = Arc::new(UserService::new(store.clone()));

        Self {
            settings: Arc::new(settings),
            verifier,
            store,
            conversations,
            users,
        }
    }
}

impl FromRef<AppState> for Arc<TokenVerifier> {
    fn from_ref(state: &AppState) -> Self {
        state.verifier.clone()
    }
}

impl FromRef<AppState> for Arc<ConversationService> {
    fn from_ref(state: &AppState) -> Self {
        state.conversations.clone()
    }
}

impl FromRef<AppState> for Arc<UserService> {
    fn from_ref(state: &AppState) -> Self {
        state.users.clone()
    }
}
