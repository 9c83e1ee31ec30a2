//! Client configuration
//!
//! Configuration for the authorization context. Loaded from environment
//! variables with local-development defaults, or constructed directly.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::DEFAULT_CACHE_TTL;

/// Configuration for an [`crate::context::AuthContext`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Base URL of the token issuer.
    pub issuer_url: String,

    /// OAuth client identifier.
    pub client_id: String,

    /// OAuth client secret, for confidential clients. Flows that require
    /// it fail with a configuration error when absent.
    pub client_secret: Option<String>,

    /// Redirect target registered for the authorization-code flow.
    pub redirect_uri: String,

    /// Default scope requested when a flow does not name one.
    pub scope: String,

    /// Request timeout for collaborator endpoints, in seconds.
    pub timeout_secs: u64,

    /// Discovery/signing-key cache time-to-live, in seconds.
    pub cache_ttl_secs: u64,

    /// Authorization endpoint override (otherwise taken from discovery).
    pub authorization_endpoint: Option<String>,

    /// Token endpoint override (otherwise taken from discovery).
    pub token_endpoint: Option<String>,
}

impl Default for AuthConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            issuer_url: "http://localhost:8080".to_string(),
            client_id: String::new(),
            client_secret: None,
            redirect_uri: "http://localhost:3000/callback".to_string(),
            scope: crate::authorize::DEFAULT_SCOPE.to_string(),
            timeout_secs: 30,
            cache_ttl_secs: DEFAULT_CACHE_TTL.as_secs(),
            authorization_endpoint: None,
            token_endpoint: None,
        }
    }
}

impl AuthConfig {
    /// Minimal configuration for a public client.
    pub fn new(issuer_url: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            issuer_url: issuer_url.into(),
            client_id: client_id.into(),
            ..Default::default()
        }
    }

    /// Attach a client secret (confidential client).
    pub fn with_client_secret(mut self, secret: impl Into<String>) -> Self {
        self.client_secret = Some(secret.into());
        self
    }

    /// Set the redirect target for the authorization-code flow.
    pub fn with_redirect_uri(mut self, redirect_uri: impl Into<String>) -> Self {
        self.redirect_uri = redirect_uri.into();
        self
    }

    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `VANTAGE_ISSUER_URL`: issuer base URL (default: http://localhost:8080)
    /// - `VANTAGE_CLIENT_ID`: OAuth client id
    /// - `VANTAGE_CLIENT_SECRET`: OAuth client secret
    /// - `VANTAGE_REDIRECT_URI`: registered redirect target
    /// - `VANTAGE_SCOPE`: default requested scope
    /// - `VANTAGE_TIMEOUT_SECS`: request timeout in seconds (default: 30)
    /// - `VANTAGE_CACHE_TTL_SECS`: metadata cache TTL (default: 3600)
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            issuer_url: std::env::var("VANTAGE_ISSUER_URL").unwrap_or(default.issuer_url),
            client_id: std::env::var("VANTAGE_CLIENT_ID").unwrap_or(default.client_id),
            client_secret: std::env::var("VANTAGE_CLIENT_SECRET").ok(),
            redirect_uri: std::env::var("VANTAGE_REDIRECT_URI").unwrap_or(default.redirect_uri),
            scope: std::env::var("VANTAGE_SCOPE").unwrap_or(default.scope),
            timeout_secs: std::env::var("VANTAGE_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.timeout_secs),
            cache_ttl_secs: std::env::var("VANTAGE_CACHE_TTL_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(default.cache_ttl_secs),
            authorization_endpoint: None,
            token_endpoint: None,
        }
    }

    /// Request timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Metadata cache TTL as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}
