//! Bearer token verification.
//!
//! A token is run through an ordered list of [`Strategy`] values. The first
//! strategy that applies to the token's header decides the outcome:
//!
//! 1. [`Strategy::EncryptedPayload`]: header carries `enc`; claims are read
//!    without any cryptographic check. Only three-segment tokens have
//!    readable claims; a five-segment JWE fails as malformed since nothing
//!    here can decrypt it.
//! 2. [`Strategy::MissingKeyId`]: header has no `kid`; claims are read
//!    without any cryptographic check.
//! 3. [`Strategy::SignedWithKey`]: `kid` is looked up in the [`KeyCache`] and
//!    the RS256 signature, issuer, audience and expiry are verified. An
//!    audience mismatch is retried with the audience check disabled, because
//!    ID tokens and access tokens are both accepted and carry different
//!    audiences.
//!
//! The first two are trust-reduced paths and surface as
//! [`Verification::VerifiedWeak`]. Deployments that must not accept them set
//! `reject_unverified`.

use std::sync::Arc;

use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};
use tracing::{debug, warn};

use super::error::AuthError;
use super::jwks::{KeyCache, SigningKey};
use super::jwt::{decode_token_header, decode_unverified_claims, TokenHeader, TrustLevel, VerifiedClaims, WeakReason};

/// Outcome of verifying one token.
#[derive(Debug, Clone, PartialEq)]
pub enum Verification {
    /// Signature, issuer and expiry checked against a published key.
    Verified(VerifiedClaims),
    /// Accepted without a signature check.
    VerifiedWeak {
        claims: VerifiedClaims,
        reason: WeakReason,
    },
    Failed(AuthError),
}

impl Verification {
    pub fn is_ok(&self) -> bool {
        !matches!(self, Self::Failed(_))
    }

    pub fn trust_level(&self) -> Option<TrustLevel> {
        match self {
            Self::Verified(_) => Some(TrustLevel::Verified),
            Self::VerifiedWeak { reason, .. } => Some(TrustLevel::Unverified(*reason)),
            Self::Failed(_) => None,
        }
    }

    pub fn into_result(self) -> Result<(VerifiedClaims, TrustLevel), AuthError> {
        match self {
            Self::Verified(claims) => Ok((claims, TrustLevel::Verified)),
            Self::VerifiedWeak { claims, reason } => Ok((claims, TrustLevel::Unverified(reason))),
            Self::Failed(err) => Err(err),
        }
    }

    /// `(claims, reason)` pair: exactly one side is populated.
    pub fn into_parts(self) -> (Option<VerifiedClaims>, Option<String>) {
        match self.into_result() {
            Ok((claims, _)) => (Some(claims), None),
            Err(err) => (None, Some(err.to_string())),
        }
    }
}

/// Verification strategies, in the order they are tried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    EncryptedPayload,
    MissingKeyId,
    SignedWithKey,
}

impl Strategy {
    pub const ORDER: [Strategy; 3] = [
        Strategy::EncryptedPayload,
        Strategy::MissingKeyId,
        Strategy::SignedWithKey,
    ];

    /// Run this strategy, or return `None` when it does not apply to `header`.
    async fn attempt(
        self,
        verifier: &TokenVerifier,
        token: &str,
        header: &TokenHeader,
    ) -> Option<Verification> {
        match self {
            Strategy::EncryptedPayload => header
                .is_encrypted()
                .then(|| weak(token, WeakReason::EncryptedPayload)),
            Strategy::MissingKeyId => header
                .key_id()
                .is_none()
                .then(|| weak(token, WeakReason::MissingKeyId)),
            Strategy::SignedWithKey => {
                let kid = header.key_id()?;
                let outcome = match verifier.keys.get(kid).await {
                    Some(key) => verifier.verify_signed(token, &key),
                    None => Err(AuthError::UnknownSigningKey(kid.to_string())),
                };
                Some(match outcome {
                    Ok(claims) => Verification::Verified(claims),
                    Err(err) => Verification::Failed(err),
                })
            }
        }
    }
}

fn weak(token: &str, reason: WeakReason) -> Verification {
    match decode_unverified_claims(token) {
        Ok(claims) => Verification::VerifiedWeak { claims, reason },
        Err(err) => Verification::Failed(err),
    }
}

/// Validates bearer tokens issued by one identity provider tenant.
pub struct TokenVerifier {
    keys: Arc<KeyCache>,
    issuer: String,
    audience: String,
    reject_unverified: bool,
}

impl TokenVerifier {
    /// Verifier for tokens issued by `https://<domain>/` for `client_id`.
    pub fn new(keys: Arc<KeyCache>, domain: &str, client_id: impl Into<String>) -> Self {
        Self {
            keys,
            issuer: format!("https://{}/", domain.trim_end_matches('/')),
            audience: client_id.into(),
            reject_unverified: false,
        }
    }

    /// Refuse the trust-reduced fallbacks instead of accepting them.
    pub fn reject_unverified(mut self, reject: bool) -> Self {
        self.reject_unverified = reject;
        self
    }

    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Verify `token`. Never panics; every failure is a [`Verification::Failed`].
    pub async fn verify(&self, token: &str) -> Verification {
        let header = match decode_token_header(token) {
            Ok(header) => header,
            Err(err) => {
                debug!("Rejecting malformed token: {}", err);
                return Verification::Failed(err);
            }
        };

        for strategy in Strategy::ORDER {
            if let Some(outcome) = strategy.attempt(self, token, &header).await {
                debug!("Token handled by {:?}", strategy);
                return self.apply_policy(outcome);
            }
        }

        // SignedWithKey applies whenever a kid is present, and MissingKeyId
        // whenever it is not.
        Verification::Failed(AuthError::invalid("no verification strategy applies"))
    }

    fn apply_policy(&self, outcome: Verification) -> Verification {
        let Verification::VerifiedWeak { reason, .. } = &outcome else {
            return outcome;
        };
        let reason = reason.as_str();

        if self.reject_unverified {
            warn!("Rejecting unverified token ({})", reason);
            return Verification::Failed(AuthError::invalid(format!(
                "unverified token rejected ({})",
                reason
            )));
        }

        warn!("Accepting token without signature verification ({})", reason);
        outcome
    }

    fn verify_signed(&self, token: &str, key: &SigningKey) -> Result<VerifiedClaims, AuthError> {
        let decoding_key = DecodingKey::from_rsa_components(&key.n, &key.e).map_err(|e| {
            AuthError::invalid(format!("unusable signing key {}: {}", key.kid, e))
        })?;

        let mut validation = Validation::new(signing_algorithm(key));
        validation.set_issuer(&[self.issuer.as_str()]);
        validation.set_audience(&[self.audience.as_str()]);

        match decode::<VerifiedClaims>(token, &decoding_key, &validation) {
            Ok(data) => Ok(data.claims),
            Err(e) if matches!(e.kind(), ErrorKind::InvalidAudience) => {
                debug!("Audience mismatch for key {}, retrying without audience check", key.kid);
                validation.validate_aud = false;
                decode::<VerifiedClaims>(token, &decoding_key, &validation)
                    .map(|data| data.claims)
                    .map_err(AuthError::from)
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// Algorithm advertised by the key, restricted to the RSA family.
fn signing_algorithm(key: &SigningKey) -> Algorithm {
    key.alg
        .as_deref()
        .and_then(|alg| alg.parse::<Algorithm>().ok())
        .filter(|alg| {
            matches!(
                alg,
                Algorithm::RS256
                    | Algorithm::RS384
                    | Algorithm::RS512
                    | Algorithm::PS256
                    | Algorithm::PS384
                    | Algorithm::PS512
            )
        })
        .unwrap_or(Algorithm::RS256)
}
