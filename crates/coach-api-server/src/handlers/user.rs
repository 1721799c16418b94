use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::models::user::OnboardingResponse;
use crate::models::OnboardingProfile;
use crate::state::AppState;
use crate::utils::error::ApiError;

/// Echo arbitrary JSON back with the caller's id.
pub async fn post_data(user: AuthUser, Json(data): Json<Value>) -> Json<Value> {
    Json(json!({
        "message": "Data received successfully",
        "user_id": user.user_id(),
        "received_data": data,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn get_onboarding(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<OnboardingResponse>, ApiError> {
    let onboarding = state.users.onboarding(user.user_id()).await?;
    Ok(Json(OnboardingResponse {
        completed: onboarding.is_some(),
        onboarding,
    }))
}

pub async fn save_onboarding(
    State(state): State<AppState>,
    user: AuthUser,
    Json(profile): Json<OnboardingProfile>,
) -> Result<Json<OnboardingResponse>, ApiError> {
    let saved = state.users.save_onboarding(&user.claims, profile).await?;
    Ok(Json(OnboardingResponse {
        completed: true,
        onboarding: saved.onboarding,
    }))
}
