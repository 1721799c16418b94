use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::auth::AuthUser;
use crate::models::user::ProfileResponse;
use crate::state::AppState;
use crate::utils::error::ApiError;

pub async fn public_endpoint() -> Json<Value> {
    Json(json!({
        "message": "This is a public endpoint",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

pub async fn protected_endpoint(user: AuthUser) -> Json<Value> {
    Json(json!({
        "message": "This is a protected endpoint",
        "user": {
            "sub": user.claims.sub(),
            "email": user.claims.email(),
            "name": user.claims.name(),
        },
        "trust": user.trust,
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// Profile from the token, provisioning the stored user on first call.
pub async fn profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<ProfileResponse>, ApiError> {
    let stored = state.users.ensure_user(&user.claims).await?;
    let claims = &user.claims;

    Ok(Json(ProfileResponse {
        user_id: stored.auth0_id,
        email: claims.email().map(str::to_string).unwrap_or(stored.email),
        name: claims.name().map(str::to_string).unwrap_or(stored.name),
        nickname: claims.nickname().map(str::to_string),
        picture: claims.picture().map(str::to_string).or(stored.picture),
        email_verified: claims.email_verified(),
        created_at: stored.created_at,
    }))
}
