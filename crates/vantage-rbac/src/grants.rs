//! # Grants
//!
//! Wildcard permission grants and matching.
//! A grant is a string of the form `resource:action`, `resource:*`,
//! `*:action`, or the universal `*`.

/// Check whether a single grant satisfies a required permission.
///
/// Matching rules:
/// - Exact string equality always matches.
/// - `*` matches any required string.
/// - `*:*` behaves identically to `*`.
/// - For two-segment grants, `*` in either segment matches any value in
///   that position; both segments must match for the grant to apply.
/// - A required string that is not exactly two colon-delimited segments
///   can only be satisfied by exact equality.
///
/// Grants are case-sensitive and compared verbatim.
///
/// # Example
///
/// ```
/// use vantage_rbac::grant_matches;
///
/// assert!(grant_matches("*", "reports:read"));
/// assert!(grant_matches("users:*", "users:write"));
/// assert!(grant_matches("*:read", "teams:read"));
/// assert!(!grant_matches("users:*", "teams:read"));
/// ```
pub fn grant_matches(grant: &str, required: &str) -> bool {
    if grant == required {
        return true;
    }

    if grant == "*" {
        return true;
    }

    let req: Vec<&str> = required.split(':').collect();
    if req.len() != 2 {
        // Only exact equality can satisfy a non resource:action string.
        return false;
    }

    let parts: Vec<&str> = grant.split(':').collect();
    if parts.len() != 2 {
        return false;
    }

    let resource_ok = parts[0] == "*" || parts[0] == req[0];
    let action_ok = parts[1] == "*" || parts[1] == req[1];

    resource_ok && action_ok
}

/// Check whether any grant in `granted` satisfies the required permission.
///
/// # Example
///
/// ```
/// use std::collections::HashSet;
/// use vantage_rbac::has_permission;
///
/// let granted: HashSet<String> =
///     ["users:*".to_string(), "reports:read".to_string()].into();
/// assert!(has_permission(&granted, "users:create"));
/// assert!(!has_permission(&granted, "reports:create"));
/// ```
pub fn has_permission(granted: &std::collections::HashSet<String>, required: &str) -> bool {
    granted.iter().any(|grant| grant_matches(grant, required))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn set(grants: &[&str]) -> HashSet<String> {
        grants.iter().map(|g| g.to_string()).collect()
    }

    #[test]
    fn test_exact_match() {
        assert!(grant_matches("users:read", "users:read"));
        assert!(!grant_matches("users:read", "users:write"));
    }

    #[test]
    fn test_universal_wildcard() {
        assert!(grant_matches("*", "anything:anything"));
        assert!(grant_matches("*", "not-even-a-pair"));
    }

    #[test]
    fn test_star_star_equals_star() {
        assert!(grant_matches("*:*", "users:read"));
        assert!(grant_matches("*:*", "teams:delete"));
    }

    #[test]
    fn test_resource_wildcard() {
        assert!(grant_matches("users:*", "users:read"));
        assert!(grant_matches("users:*", "users:write"));
        assert!(!grant_matches("users:*", "teams:read"));
    }

    #[test]
    fn test_action_wildcard() {
        assert!(grant_matches("*:read", "users:read"));
        assert!(grant_matches("*:read", "teams:read"));
        assert!(!grant_matches("*:read", "users:write"));
    }

    #[test]
    fn test_case_sensitive() {
        assert!(!grant_matches("Users:read", "users:read"));
        assert!(!grant_matches("users:Read", "users:read"));
    }

    #[test]
    fn test_malformed_required_only_exact() {
        // Three segments: no wildcard grant applies.
        assert!(!grant_matches("users:*", "users:read:extra"));
        assert!(!grant_matches("*:*", "users:read:extra"));
        assert!(grant_matches("users:read:extra", "users:read:extra"));

        // Single segment: same story, except for the universal grant.
        assert!(!grant_matches("admin:*", "admin"));
        assert!(grant_matches("admin", "admin"));
        assert!(grant_matches("*", "admin"));
    }

    #[test]
    fn test_has_permission() {
        let granted = set(&["users:*", "reports:read"]);
        assert!(has_permission(&granted, "users:create"));
        assert!(has_permission(&granted, "reports:read"));
        assert!(!has_permission(&granted, "reports:create"));
        assert!(!has_permission(&granted, "settings:read"));
    }

    #[test]
    fn test_has_permission_empty_set() {
        assert!(!has_permission(&HashSet::new(), "users:read"));
    }
}
