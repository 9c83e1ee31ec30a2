//! Issuer metadata and signing-key discovery
//!
//! Fetches the issuer's discovery document from its well-known path and
//! the signing-key set it points at, caching both with a time-to-live.
//! Serving a slightly stale (but unexpired) document has no correctness
//! cost, so concurrent refreshes of the same entry are idempotent and
//! last-writer-wins.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{AuthError, AuthResult};

/// Default cache time-to-live: one hour.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(3600);

/// Machine-readable metadata describing the issuer's endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryDocument {
    /// Issuer identifier.
    pub issuer: String,

    /// Where the authorization-code flow starts.
    pub authorization_endpoint: String,

    /// Where codes, refresh tokens, and client credentials are exchanged.
    pub token_endpoint: String,

    /// Location of the signing-key set.
    pub jwks_uri: String,

    /// Response types the issuer supports.
    #[serde(default)]
    pub response_types_supported: Vec<String>,

    /// Grant types the issuer supports.
    #[serde(default)]
    pub grant_types_supported: Vec<String>,

    /// OIDC userinfo endpoint, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub userinfo_endpoint: Option<String>,

    /// Token revocation endpoint, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revocation_endpoint: Option<String>,

    /// Step-up authentication endpoint, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_up_endpoint: Option<String>,
}

/// One public key record from the issuer's signing-key set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SigningKey {
    /// Key identifier tokens reference in their header.
    pub kid: String,

    /// Key type (e.g. "RSA", "EC").
    pub kty: String,

    /// Intended algorithm, when published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alg: Option<String>,

    /// Intended use ("sig" for signing keys).
    #[serde(default, rename = "use", skip_serializing_if = "Option::is_none")]
    pub key_use: Option<String>,

    /// RSA modulus, when the key is RSA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<String>,

    /// RSA exponent, when the key is RSA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e: Option<String>,

    /// Remaining key parameters, preserved for the verifier collaborator.
    #[serde(default, flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

/// The issuer's published signing keys, keyed by identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SigningKeySet {
    /// The key records.
    pub keys: Vec<SigningKey>,
}

impl SigningKeySet {
    /// Look up a key by identifier.
    pub fn find(&self, kid: &str) -> Option<&SigningKey> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}

struct Cached<T> {
    value: T,
    fetched_at: Instant,
}

/// TTL cache over the discovery document and signing-key set.
pub struct MetadataCache {
    client: reqwest::Client,
    issuer_url: String,
    ttl: Duration,
    discovery: RwLock<Option<Cached<DiscoveryDocument>>>,
    keys: RwLock<Option<Cached<SigningKeySet>>>,
}

impl MetadataCache {
    /// Create a cache for one issuer.
    pub fn new(client: reqwest::Client, issuer_url: impl Into<String>, ttl: Duration) -> Self {
        Self {
            client,
            issuer_url: issuer_url.into(),
            ttl,
            discovery: RwLock::new(None),
            keys: RwLock::new(None),
        }
    }

    /// The issuer's well-known discovery path.
    pub fn well_known_url(&self) -> String {
        format!(
            "{}/.well-known/openid-configuration",
            self.issuer_url.trim_end_matches('/')
        )
    }

    /// The discovery document, from cache when fresh.
    ///
    /// `force` bypasses the cache and always refetches.
    pub async fn discovery(&self, force: bool) -> AuthResult<DiscoveryDocument> {
        if !force {
            if let Some(cached) = self.discovery.read().await.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.value.clone());
                }
            }
        }

        let url = self.well_known_url();
        debug!(%url, "fetching discovery document");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AuthError::DiscoveryFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::DiscoveryFetchFailed(format!(
                "{url} returned {}",
                response.status()
            )));
        }

        let document: DiscoveryDocument = response
            .json()
            .await
            .map_err(|e| AuthError::DiscoveryFetchFailed(e.to_string()))?;

        *self.discovery.write().await = Some(Cached {
            value: document.clone(),
            fetched_at: Instant::now(),
        });

        Ok(document)
    }

    /// The signing-key set, from cache when fresh.
    ///
    /// Resolves the key-set location through the (cached) discovery
    /// document. `force` refetches the keys but not the document.
    pub async fn signing_keys(&self, force: bool) -> AuthResult<SigningKeySet> {
        if !force {
            if let Some(cached) = self.keys.read().await.as_ref() {
                if cached.fetched_at.elapsed() < self.ttl {
                    return Ok(cached.value.clone());
                }
            }
        }

        let jwks_uri = self.discovery(false).await?.jwks_uri;
        debug!(%jwks_uri, "fetching signing-key set");

        let response = self
            .client
            .get(&jwks_uri)
            .send()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::KeyFetchFailed(format!(
                "{jwks_uri} returned {}",
                response.status()
            )));
        }

        let key_set: SigningKeySet = response
            .json()
            .await
            .map_err(|e| AuthError::KeyFetchFailed(e.to_string()))?;

        *self.keys.write().await = Some(Cached {
            value: key_set.clone(),
            fetched_at: Instant::now(),
        });

        Ok(key_set)
    }
}
