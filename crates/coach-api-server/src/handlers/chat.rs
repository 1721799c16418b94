use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::auth::AuthUser;
use crate::models::chat::{
    ConversationResponse, CreateConversationRequest, GenerateRequest, SendMessageRequest,
};
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn list_conversations(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let conversations = state.conversations.list(user.user_id()).await?;
    Ok(Json(json!({ "conversations": conversations })))
}

pub async fn create_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<CreateConversationRequest>>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let title = body.and_then(|Json(req)| req.title);
    let conversation = state.conversations.create(user.user_id(), title).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "conversation_id": conversation.id,
            "title": conversation.title,
        })),
    ))
}

pub async fn get_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<ConversationResponse>, ApiError> {
    let conversation = state.conversations.get(user.user_id(), &id).await?;
    Ok(Json(ConversationResponse { conversation }))
}

pub async fn send_message(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<SendMessageRequest>,
) -> Result<Json<Value>, ApiError> {
    info!("💬 Message from {} in conversation {}", user.user_id(), id);
    let reply = state
        .conversations
        .send_message(user.user_id(), &id, &req.message)
        .await?;

    Ok(Json(json!({
        "success": true,
        "response": reply.response,
        "conversation_id": reply.conversation_id,
        "model": reply.model,
        "title": reply.title,
    })))
}

pub async fn delete_conversation(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.conversations.delete(user.user_id(), &id).await?;
    Ok(Json(json!({ "success": true, "message": "Conversation deleted" })))
}

/// Single-turn generation without conversation context.
pub async fn generate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let reply = state.conversations.generate(&req.prompt).await?;
    Ok(Json(json!({
        "success": true,
        "response": reply.response,
        "model": reply.model,
    })))
}
