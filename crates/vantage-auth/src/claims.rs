//! Access-token claims
//!
//! This module defines the claim set carried by Vantage access tokens.
//! A [`ClaimSet`] is produced by [`crate::codec::decode`] and is immutable
//! once constructed; validation logic reads it, nothing mutates it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// Claims carried by a platform access token.
///
/// Standard JWT claims (RFC 7519) plus the platform's authorization
/// extensions: roles, explicit permission grants, assurance indicator
/// (`acr`) and authentication methods (`amr`). Unknown fields are retained
/// in `custom` so extension claims survive a decode round.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimSet {
    /// Subject (user ID).
    #[serde(default)]
    pub sub: String,

    /// Issuer.
    #[serde(default)]
    pub iss: String,

    /// Audience; the wire value may be a single string or a list.
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,

    /// Expiration time (Unix timestamp).
    #[serde(default)]
    pub exp: i64,

    /// Issued at (Unix timestamp).
    #[serde(default)]
    pub iat: i64,

    /// Not before (Unix timestamp). Zero when absent, which every clock
    /// satisfies.
    #[serde(default)]
    pub nbf: i64,

    /// Granted scope, space-delimited.
    #[serde(default)]
    pub scope: String,

    /// Role names assigned to the subject.
    #[serde(default)]
    pub roles: Vec<String>,

    /// Explicit permission grants, in addition to role-derived ones.
    #[serde(default)]
    pub permissions: Vec<String>,

    /// Authentication context class reference (assurance indicator).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub acr: Option<String>,

    /// Authentication methods used for this session.
    #[serde(default)]
    pub amr: Vec<String>,

    /// Extension claims.
    #[serde(default, flatten)]
    pub custom: HashMap<String, serde_json::Value>,
}

impl ClaimSet {
    /// Individual scope values from the space-delimited claim.
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }

    /// Check whether a scope value was granted.
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes().any(|s| s == scope)
    }

    /// Check whether the audience claim contains the expected value,
    /// whether the claim was singular or a list.
    pub fn audience_contains(&self, expected: &str) -> bool {
        self.aud.iter().any(|a| a == expected)
    }

    /// Expiration as a UTC timestamp.
    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_default()
    }

    /// Check if the token is expired, with no skew tolerance.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() > self.exp
    }

    /// A string-valued extension claim, if present.
    pub fn custom_str(&self, key: &str) -> Option<&str> {
        self.custom.get(key).and_then(|v| v.as_str())
    }
}

/// Deserialize an audience claim that may be `"app"` or `["app", "api"]`.
fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}
