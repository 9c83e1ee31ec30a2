//! # Roles
//!
//! Role definitions with single-parent inheritance.
//!
//! Roles form a forest: every role names at most one parent, and a role's
//! effective permission set is the union of its own grants and the grants
//! of every ancestor. The table is expected to be acyclic and finite; that
//! contract is not mechanically enforced on insertion, so traversal is
//! guarded by a visited set and fails closed if a cycle is ever present.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

/// A single role: its directly granted permissions and optional parent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleNode {
    /// Permissions granted directly to this role (not including ancestors).
    pub permissions: HashSet<String>,

    /// Parent role name, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

/// A table of roles keyed by name.
///
/// # Example
///
/// ```
/// use vantage_rbac::RoleTable;
///
/// let table = RoleTable::new()
///     .with_role("viewer", None, &["reports:read"])
///     .with_role("editor", Some("viewer"), &["reports:create"]);
///
/// let effective = table.effective_permissions(&["editor".to_string()], &[]);
/// assert!(effective.contains("reports:read"));
/// assert!(effective.contains("reports:create"));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleTable {
    roles: HashMap<String, RoleNode>,
}

impl RoleTable {
    /// Create an empty role table.
    pub fn new() -> Self {
        Self {
            roles: HashMap::new(),
        }
    }

    /// Add a role, replacing any previous definition of the same name.
    pub fn with_role(mut self, name: &str, parent: Option<&str>, permissions: &[&str]) -> Self {
        self.insert(name, parent, permissions);
        self
    }

    /// Insert a role in place.
    pub fn insert(&mut self, name: &str, parent: Option<&str>, permissions: &[&str]) {
        self.roles.insert(
            name.to_string(),
            RoleNode {
                permissions: permissions.iter().map(|p| p.to_string()).collect(),
                parent: parent.map(String::from),
            },
        );
    }

    /// Look up a role by name.
    pub fn get(&self, name: &str) -> Option<&RoleNode> {
        self.roles.get(name)
    }

    /// Number of roles in the table.
    pub fn len(&self) -> usize {
        self.roles.len()
    }

    /// Check if the table has no roles.
    pub fn is_empty(&self) -> bool {
        self.roles.is_empty()
    }

    /// All permissions for a role, including inherited permissions.
    ///
    /// Walks the parent chain to the root, accumulating each node's own
    /// grants. If the chain revisits a role the table violates the acyclic
    /// contract; the walk stops and the role contributes **no** permissions
    /// at all (fail closed), since a cyclic definition cannot be trusted.
    /// An unknown role name yields an empty set.
    pub fn role_permissions(&self, role: &str) -> HashSet<String> {
        let mut permissions = HashSet::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(role);

        while let Some(name) = current {
            if !visited.insert(name) {
                warn!(role, at = name, "cycle in role parent chain, dropping role grants");
                return HashSet::new();
            }
            match self.roles.get(name) {
                Some(node) => {
                    permissions.extend(node.permissions.iter().cloned());
                    current = node.parent.as_deref();
                }
                None => current = None,
            }
        }

        permissions
    }

    /// All effective permissions from a set of roles plus explicit grants.
    pub fn effective_permissions(
        &self,
        roles: &[String],
        explicit_grants: &[String],
    ) -> HashSet<String> {
        let mut permissions = HashSet::new();

        for role in roles {
            permissions.extend(self.role_permissions(role));
        }
        permissions.extend(explicit_grants.iter().cloned());

        permissions
    }

    /// Check if a role inherits from (or is) another role.
    ///
    /// Bounded by the same visited-set guard as [`role_permissions`]
    /// (a cycle answers `false` unless the ancestor was reached first).
    ///
    /// [`role_permissions`]: RoleTable::role_permissions
    pub fn role_inherits_from(&self, role: &str, ancestor: &str) -> bool {
        let mut visited: HashSet<&str> = HashSet::new();
        let mut current = Some(role);

        while let Some(name) = current {
            if name == ancestor {
                return true;
            }
            if !visited.insert(name) {
                return false;
            }
            current = self.roles.get(name).and_then(|node| node.parent.as_deref());
        }

        false
    }

    /// The platform's standard role table.
    ///
    /// `guest` is the root; each role inherits everything below it:
    /// `super_admin` > `admin` > `manager` > `user` > `guest`.
    pub fn platform_defaults() -> Self {
        Self::new()
            .with_role("guest", None, &["profile:read", "resources:read"])
            .with_role(
                "user",
                Some("guest"),
                &[
                    "profile:*",
                    "notifications:*",
                    "resources:read",
                    "resources:create",
                ],
            )
            .with_role(
                "manager",
                Some("user"),
                &[
                    "users:read",
                    "users:create",
                    "users:update",
                    "team:*",
                    "reports:read",
                    "reports:create",
                ],
            )
            .with_role(
                "admin",
                Some("manager"),
                &["users:*", "settings:*", "audit:read", "reports:*"],
            )
            .with_role("super_admin", Some("admin"), &["*"])
    }
}
