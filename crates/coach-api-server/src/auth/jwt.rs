//! Compact token framing and the claim set handed to the route layer.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error::AuthError;

/// The subset of a JOSE header the verifier classifies on.
///
/// Parsed by hand rather than through `jsonwebtoken::decode_header`, which
/// rejects the key-management algorithms used by encrypted tokens.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenHeader {
    pub alg: Option<String>,
    pub kid: Option<String>,
    pub enc: Option<String>,
    pub typ: Option<String>,
}

impl TokenHeader {
    /// Encrypted (JWE) tokens carry a content-encryption `enc` member.
    pub fn is_encrypted(&self) -> bool {
        self.enc.is_some()
    }

    /// Key id, treating an empty string the same as an absent one.
    pub fn key_id(&self) -> Option<&str> {
        self.kid.as_deref().filter(|kid| !kid.is_empty())
    }
}

const JWE_SEGMENTS: usize = 5;

/// Split a compact token into its segments. Signed tokens have three,
/// encrypted ones five.
fn segments(token: &str) -> Result<Vec<&str>, AuthError> {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 3 && parts.len() != JWE_SEGMENTS {
        return Err(AuthError::malformed(format!(
            "expected 3 or 5 segments, found {}",
            parts.len()
        )));
    }
    if parts[0].is_empty() {
        return Err(AuthError::malformed("empty header segment"));
    }
    Ok(parts)
}

fn decode_segment<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, AuthError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment.trim_end_matches('='))
        .map_err(|e| AuthError::malformed(format!("failed to decode {}: {}", what, e)))?;
    serde_json::from_slice(&bytes)
        .map_err(|e| AuthError::malformed(format!("failed to parse {}: {}", what, e)))
}

/// Decode the header without verifying anything.
pub fn decode_token_header(token: &str) -> Result<TokenHeader, AuthError> {
    let parts = segments(token)?;
    decode_segment(parts[0], "token header")
}

/// Decode the payload segment without verifying the signature.
///
/// Only used by the trust-reduced fallbacks in the verifier. Compact JWE
/// tokens (five segments) carry ciphertext rather than claims and are
/// refused; only a three-segment token whose header declares `enc` is read.
pub fn decode_unverified_claims(token: &str) -> Result<VerifiedClaims, AuthError> {
    let parts = segments(token)?;
    if parts.len() == JWE_SEGMENTS {
        return Err(AuthError::malformed(
            "encrypted payload cannot be read without decryption",
        ));
    }
    let claims: Map<String, Value> = decode_segment(parts[1], "token payload")?;
    Ok(VerifiedClaims(claims))
}

/// Claim set of an accepted token.
///
/// Carries every claim of the payload; typed accessors cover the ones the
/// route layer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VerifiedClaims(Map<String, Value>);

impl VerifiedClaims {
    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    fn str_claim(&self, claim: &str) -> Option<&str> {
        self.0.get(claim).and_then(Value::as_str)
    }

    /// Subject, the primary key of the user record.
    pub fn sub(&self) -> Option<&str> {
        self.str_claim("sub")
    }

    pub fn email(&self) -> Option<&str> {
        self.str_claim("email")
    }

    pub fn name(&self) -> Option<&str> {
        self.str_claim("name")
    }

    pub fn nickname(&self) -> Option<&str> {
        self.str_claim("nickname")
    }

    pub fn picture(&self) -> Option<&str> {
        self.str_claim("picture")
    }

    pub fn email_verified(&self) -> bool {
        self.0
            .get("email_verified")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    pub fn issuer(&self) -> Option<&str> {
        self.str_claim("iss")
    }

    pub fn scope(&self) -> Option<&str> {
        self.str_claim("scope")
    }

    pub fn expires_at(&self) -> Option<i64> {
        self.0.get("exp").and_then(Value::as_i64)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }
}

impl From<Map<String, Value>> for VerifiedClaims {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// Why a token was accepted without a signature check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WeakReason {
    /// Header declared an encrypted payload; claims were read undecrypted.
    EncryptedPayload,
    /// Header carried no key id to look up.
    MissingKeyId,
}

impl WeakReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EncryptedPayload => "encrypted_payload",
            Self::MissingKeyId => "missing_key_id",
        }
    }
}

/// How much a set of claims can be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "level", content = "reason", rename_all = "snake_case")]
pub enum TrustLevel {
    Verified,
    Unverified(WeakReason),
}

impl TrustLevel {
    pub fn is_verified(&self) -> bool {
        matches!(self, Self::Verified)
    }
}
