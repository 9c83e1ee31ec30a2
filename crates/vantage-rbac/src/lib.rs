//! # Vantage RBAC (Role-Based Access Control)
//!
//! This crate provides permission resolution for the Vantage platform,
//! shared across every platform service.
//!
//! ## Overview
//!
//! The vantage-rbac crate handles:
//! - **Grants**: `resource:action` permission strings with wildcard support
//! - **Roles**: a forest of roles with single-parent inheritance
//! - **Resolution**: expanding roles + explicit grants into an effective
//!   permission set
//!
//! ## Grant Format
//!
//! ```text
//! "users:read"   - a single action on a single resource
//! "users:*"      - every action on one resource
//! "*:read"       - one action on every resource
//! "*"            - everything
//! ```
//!
//! Grants are case-sensitive and compared verbatim. A required permission
//! that is not exactly two colon-delimited segments is only ever satisfied
//! by exact equality (or the universal `*` grant).
//!
//! ## Usage
//!
//! ```rust
//! use vantage_rbac::{has_permission, RoleTable};
//!
//! let table = RoleTable::platform_defaults();
//!
//! let granted = table.effective_permissions(
//!     &["manager".to_string()],
//!     &["billing:read".to_string()],
//! );
//!
//! assert!(has_permission(&granted, "team:create"));   // manager's own grant
//! assert!(has_permission(&granted, "profile:read"));  // inherited from guest
//! assert!(has_permission(&granted, "billing:read"));  // explicit grant
//! assert!(!has_permission(&granted, "settings:update"));
//! ```
//!
//! ## Cycles
//!
//! The role table is documented as acyclic; this is a contract on the
//! table's author, not something insertion enforces. Traversal is bounded
//! by a visited set and a cyclic chain contributes no permissions (fail
//! closed) rather than looping.

pub mod grants;
pub mod roles;

pub use grants::{grant_matches, has_permission};
pub use roles::{RoleNode, RoleTable};
