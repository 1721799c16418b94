use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::auth::VerifiedClaims;
use crate::database::DocumentStore;
use crate::models::{OnboardingProfile, User};
use crate::utils::error::ApiError;

/// User records keyed by identity provider subject.
pub struct UserService {
    store: Arc<dyn DocumentStore>,
}

impl UserService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// The stored user for the token subject, created on first sight.
    pub async fn ensure_user(&self, claims: &VerifiedClaims) -> Result<User, ApiError> {
        let sub = claims
            .sub()
            .ok_or_else(|| ApiError::Unauthorized("Token has no subject".to_string()))?;

        if let Some(user) = self.store.get_user(sub).await.map_err(ApiError::database)? {
            return Ok(user);
        }

        let user = User::from_claims(claims)
            .ok_or_else(|| ApiError::Unauthorized("Token has no subject".to_string()))?;
        self.store.upsert_user(&user).await.map_err(ApiError::database)?;
        info!("Provisioned user {}", user.auth0_id);
        Ok(user)
    }

    pub async fn onboarding(&self, user_id: &str) -> Result<Option<OnboardingProfile>, ApiError> {
        let user = self
            .store
            .get_user(user_id)
            .await
            .map_err(ApiError::database)?;
        Ok(user.and_then(|u| u.onboarding))
    }

    /// Validate and store the onboarding answers, provisioning the user if needed.
    pub async fn save_onboarding(
        &self,
        claims: &VerifiedClaims,
        profile: OnboardingProfile,
    ) -> Result<User, ApiError> {
        profile.validate().map_err(ApiError::BadRequest)?;

        let mut user = self.ensure_user(claims).await?;
        user.onboarding = Some(profile);
        user.updated_at = Utc::now().max(user.updated_at);
        self.store.upsert_user(&user).await.map_err(ApiError::database)?;

        info!("Saved onboarding for {}", user.auth0_id);
        Ok(user)
    }
}
