use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header::AUTHORIZATION, request::Parts};
use tracing::debug;

use super::jwt::{TrustLevel, VerifiedClaims};
use super::verifier::TokenVerifier;
use crate::utils::error::ApiError;

const INVALID_FORMAT: &str = "Invalid authorization header format";

/// Extract the token from an `Authorization` header value.
///
/// The value must be exactly two whitespace-separated words and the first
/// must be `bearer` in any case.
pub fn parse_bearer(value: &str) -> Result<&str, ApiError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(ApiError::Unauthorized(INVALID_FORMAT.to_string())),
    }
}

/// Caller identity established from a bearer token.
///
/// Any handler taking this extractor is protected: every verification
/// failure is rejected with 401 before the handler runs.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub claims: VerifiedClaims,
    pub trust: TrustLevel,
}

impl AuthUser {
    /// Subject claim; tokens without one are rejected at extraction.
    pub fn user_id(&self) -> &str {
        self.claims.sub().unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for AuthUser
where
    Arc<TokenVerifier>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| ApiError::Unauthorized("No authorization header".to_string()))?;
        let value = header
            .to_str()
            .map_err(|_| ApiError::Unauthorized(INVALID_FORMAT.to_string()))?;
        let token = parse_bearer(value)?;

        let verifier = Arc::<TokenVerifier>::from_ref(state);
        let (claims, trust) = verifier
            .verify(token)
            .await
            .into_result()
            .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

        if claims.sub().is_none() {
            return Err(ApiError::Unauthorized("Token has no subject".to_string()));
        }

        debug!("Authenticated {} ({:?})", claims.sub().unwrap_or_default(), trust);
        Ok(Self { claims, trust })
    }
}
