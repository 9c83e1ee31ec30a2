//! Authenticated user identity
//!
//! Bridges a decoded [`ClaimSet`] to the RBAC layer: a [`UserIdentity`]
//! carries the subject's roles and explicit grants and can answer
//! permission checks against a role table.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use vantage_rbac::{has_permission, RoleTable};

use crate::claims::ClaimSet;

/// The authenticated user extracted from an access token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserIdentity {
    /// Subject id.
    pub user_id: String,

    /// Email address, when the token carries one.
    pub email: Option<String>,

    /// Display name, when the token carries one.
    pub name: Option<String>,

    /// Tenant the session belongs to.
    pub tenant_id: Option<String>,

    /// Session id for session management.
    pub session_id: Option<String>,

    /// Role names assigned to the subject.
    pub roles: Vec<String>,

    /// Explicit permission grants carried by the token.
    pub permissions: Vec<String>,

    /// Granted scope values.
    pub scopes: Vec<String>,
}

impl UserIdentity {
    /// Build an identity from decoded claims.
    pub fn from_claims(claims: &ClaimSet) -> Self {
        Self {
            user_id: claims.sub.clone(),
            email: claims.custom_str("email").map(String::from),
            name: claims.custom_str("name").map(String::from),
            tenant_id: claims.custom_str("tenant_id").map(String::from),
            session_id: claims.custom_str("session_id").map(String::from),
            roles: claims.roles.clone(),
            permissions: claims.permissions.clone(),
            scopes: claims.scopes().map(String::from).collect(),
        }
    }

    /// Check whether a role was assigned directly.
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// The full permission set: roles expanded through the table's
    /// inheritance chains, unioned with the token's explicit grants.
    pub fn effective_permissions(&self, table: &RoleTable) -> HashSet<String> {
        table.effective_permissions(&self.roles, &self.permissions)
    }

    /// Check a required permission against the effective set.
    pub fn has_permission(&self, table: &RoleTable, required: &str) -> bool {
        has_permission(&self.effective_permissions(table), required)
    }
}
