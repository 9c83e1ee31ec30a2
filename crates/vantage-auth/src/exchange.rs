//! Token-endpoint wire types and the exchange seam
//!
//! The refresh scheduler and the context façade both talk to the issuer's
//! token endpoint; the [`TokenExchanger`] trait is the seam between them,
//! so the scheduler can be driven by a mock in tests and by
//! [`crate::context::AuthContext`] in production.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::AuthResult;

/// Response from the issuer's token endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,

    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,

    /// Lifetime in seconds, when the issuer reports one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,

    /// Rotated refresh token, when the issuer returns one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// ID token, for flows that include one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,

    /// Granted scope, when it differs from the requested scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

/// Collaborator that exchanges a refresh token for fresh tokens.
#[async_trait]
pub trait TokenExchanger: Send + Sync {
    /// Perform a `grant_type=refresh_token` exchange.
    async fn exchange_refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse>;
}
