use thiserror::Error;

/// Reasons a bearer token is refused.
///
/// Every variant is returned as a value from the verifier; nothing here is
/// ever raised past the verifier boundary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// The token is not a recognizable compact JWS/JWE string.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The header names a key id the identity provider does not publish.
    #[error("Key ID not found: {0}")]
    UnknownSigningKey(String),

    #[error("Token has expired")]
    TokenExpired,

    /// Signature, issuer or audience failure after all fallbacks.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// The key set could not be fetched or parsed. Only logged: the key
    /// cache degrades to an empty set instead of propagating this.
    #[error("Key set unavailable: {0}")]
    KeySetUnavailable(String),
}

impl AuthError {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedToken(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidToken(msg.into())
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            ErrorKind::InvalidToken | ErrorKind::Base64(_) | ErrorKind::Json(_) | ErrorKind::Utf8(_) => {
                AuthError::MalformedToken(err.to_string())
            }
            _ => AuthError::InvalidToken(err.to_string()),
        }
    }
}
