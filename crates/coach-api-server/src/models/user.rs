use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::VerifiedClaims;

/// Answers collected during onboarding, stored on the user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardingProfile {
    /// The user's own job title.
    pub role: String,
    pub boss_type: String,
    /// Self-rated, 1 to 10.
    pub confidence: u8,
    #[serde(default)]
    pub goals: Vec<String>,
}

impl OnboardingProfile {
    pub fn validate(&self) -> Result<(), String> {
        if self.role.trim().is_empty() {
            return Err("role must not be empty".to_string());
        }
        if self.boss_type.trim().is_empty() {
            return Err("boss_type must not be empty".to_string());
        }
        if !(1..=10).contains(&self.confidence) {
            return Err(format!("confidence must be between 1 and 10, got {}", self.confidence));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Identity provider subject (`sub` claim).
    pub auth0_id: String,
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub onboarding: Option<OnboardingProfile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// New record for the subject of `claims`.
    pub fn from_claims(claims: &VerifiedClaims) -> Option<Self> {
        let sub = claims.sub()?;
        let now = Utc::now();
        Some(Self {
            auth0_id: sub.to_string(),
            email: claims.email().unwrap_or_default().to_string(),
            name: claims
                .name()
                .or_else(|| claims.nickname())
                .unwrap_or_default()
                .to_string(),
            picture: claims.picture().map(str::to_string),
            onboarding: None,
            created_at: now,
            updated_at: now,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub nickname: Option<String>,
    pub picture: Option<String>,
    pub email_verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OnboardingResponse {
    pub completed: bool,
    pub onboarding: Option<OnboardingProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn profile(confidence: u8) -> OnboardingProfile {
        OnboardingProfile {
            role: "Engineer".into(),
            boss_type: "micromanager".into(),
            confidence,
            goals: vec!["ask for feedback".into()],
        }
    }

    #[test]
    fn test_confidence_range() {
        assert!(profile(1).validate().is_ok());
        assert!(profile(10).validate().is_ok());
        assert!(profile(0).validate().is_err());
        assert!(profile(11).validate().is_err());
    }

    #[test]
    fn test_blank_fields_rejected() {
        let mut p = profile(5);
        p.boss_type = " ".into();
        assert!(p.validate().is_err());
    }

    #[test]
    fn test_user_from_claims() {
        let claims: VerifiedClaims = serde_json::from_value(json!({
            "sub": "auth0|u1",
            "nickname": "ada",
            "email": "ada@example.com"
        }))
        .unwrap();
        let user = User::from_claims(&claims).unwrap();
        assert_eq!(user.auth0_id, "auth0|u1");
        assert_eq!(user.name, "ada");
        assert!(user.onboarding.is_none());

        assert!(User::from_claims(&VerifiedClaims::default()).is_none());
    }
}
