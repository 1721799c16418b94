//! Identity provider key set and its in-process cache.
//!
//! The cache is filled lazily by the first verification that needs a key and
//! then lives for the rest of the process:
//!
//! ```text
//! verify(kid) → cache initialized? ─ yes → lookup kid
//!                      │
//!                      no → GET /.well-known/jwks.json (bounded timeout)
//!                           ├─ ok   → map kid → SigningKey
//!                           └─ fail → empty map (logged, not retried)
//! ```
//!
//! Population is single-flight: concurrent first callers wait on the same
//! fetch instead of racing their own.

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::error::AuthError;

/// One RSA public key as published in the identity provider's JWKS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    pub kid: String,
    /// Base64url big-endian modulus.
    pub n: String,
    /// Base64url big-endian public exponent.
    pub e: String,
    #[serde(default)]
    pub alg: Option<String>,
    #[serde(default)]
    pub kty: Option<String>,
}

/// Raw JWKS entry; `kid`, `n` and `e` may be missing on non-RSA keys.
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: Option<String>,
    n: Option<String>,
    e: Option<String>,
    alg: Option<String>,
    kty: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Jwks {
    keys: Vec<Jwk>,
}

/// Parse a JWKS body into a key id → key map.
///
/// Entries without a key id or RSA components are skipped.
pub fn parse_key_set(body: &[u8]) -> Result<HashMap<String, SigningKey>> {
    let jwks: Jwks = serde_json::from_slice(body).context("JWKS body is not a key set")?;

    let keys = jwks
        .keys
        .into_iter()
        .filter_map(|jwk| {
            let kid = jwk.kid?;
            Some((
                kid.clone(),
                SigningKey {
                    kid,
                    n: jwk.n?,
                    e: jwk.e?,
                    alg: jwk.alg,
                    kty: jwk.kty,
                },
            ))
        })
        .collect();

    Ok(keys)
}

/// Memoized mapping from key id to [`SigningKey`].
pub struct KeyCache {
    client: Client,
    jwks_url: String,
    keys: OnceCell<HashMap<String, SigningKey>>,
}

impl KeyCache {
    /// Cache that fetches from `jwks_url` on first use.
    pub fn new(jwks_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_else(|_| Client::new()),
            jwks_url: jwks_url.into(),
            keys: OnceCell::new(),
        }
    }

    /// Well-known key set URL for an identity provider domain.
    pub fn well_known_url(domain: &str) -> String {
        format!("https://{}/.well-known/jwks.json", domain.trim_end_matches('/'))
    }

    /// Cache that is already initialized with `keys` and never fetches.
    pub fn with_keys(keys: impl IntoIterator<Item = SigningKey>) -> Self {
        let map = keys.into_iter().map(|k| (k.kid.clone(), k)).collect();
        Self {
            client: Client::new(),
            jwks_url: String::new(),
            keys: OnceCell::new_with(Some(map)),
        }
    }

    /// Look up `kid`, fetching the key set first if the cache was never filled.
    pub async fn get(&self, kid: &str) -> Option<SigningKey> {
        let keys = self.keys.get_or_init(|| self.populate()).await;
        let key = keys.get(kid).cloned();
        if key.is_none() {
            debug!("Key ID {} not in cached key set ({} keys)", kid, keys.len());
        }
        key
    }

    pub fn is_initialized(&self) -> bool {
        self.keys.initialized()
    }

    /// Number of cached keys; zero before the first fetch.
    pub fn len(&self) -> usize {
        self.keys.get().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    async fn populate(&self) -> HashMap<String, SigningKey> {
        match self.fetch().await {
            Ok(keys) => {
                info!("Loaded {} signing keys from {}", keys.len(), self.jwks_url);
                keys
            }
            Err(e) => {
                // Cached as empty; never refetched for this process.
                let err = AuthError::KeySetUnavailable(format!("{:#}", e));
                warn!("{}", err);
                HashMap::new()
            }
        }
    }

    async fn fetch(&self) -> Result<HashMap<String, SigningKey>> {
        debug!("Fetching key set from {}", self.jwks_url);

        let response = self
            .client
            .get(&self.jwks_url)
            .send()
            .await
            .context("JWKS request failed")?
            .error_for_status()
            .context("JWKS endpoint returned an error status")?;

        let body = response.bytes().await.context("Failed to read JWKS body")?;
        parse_key_set(&body)
    }
}
