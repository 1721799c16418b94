//! Bearer token authentication against the identity provider's key set.

pub mod error;
pub mod jwks;
pub mod jwt;
pub mod middleware;
pub mod verifier;

pub use error::AuthError;
pub use jwks::{KeyCache, SigningKey};
pub use jwt::{TrustLevel, VerifiedClaims, WeakReason};
pub use middleware::{parse_bearer, AuthUser};
pub use verifier::{Strategy, TokenVerifier, Verification};
