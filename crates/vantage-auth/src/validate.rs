//! Local token validation
//!
//! Applies expiry, audience, issuer, scope, and assurance checks to a
//! token's claims without a network round trip. Failures are returned as
//! data, never as `Err`: a well-formed-but-invalid token is a routine
//! input, and callers need to inspect why it failed.

use chrono::Utc;
use thiserror::Error;

use crate::assurance::AssuranceLevel;
use crate::claims::ClaimSet;
use crate::codec::decode_token;

/// Constraints to validate a token against.
#[derive(Debug, Clone)]
pub struct ValidationOptions {
    /// Expected audience; skipped when `None`. Matches if the value appears
    /// anywhere in the token's singular-or-list audience claim.
    pub audience: Option<String>,

    /// Expected issuer; skipped when `None`.
    pub issuer: Option<String>,

    /// Clock-skew tolerance in seconds applied to both expiry and
    /// not-before.
    pub clock_skew_secs: i64,

    /// Scopes that must all be present in the space-delimited scope claim.
    pub required_scopes: Vec<String>,

    /// Minimum assurance level; skipped when `None`.
    pub required_assurance: Option<AssuranceLevel>,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            audience: None,
            issuer: None,
            clock_skew_secs: 30,
            required_scopes: Vec::new(),
            required_assurance: None,
        }
    }
}

/// Why a token failed validation.
///
/// One tag per failure class, each carrying only the fields relevant to
/// that case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// The token could not be decoded at all.
    #[error("token is malformed")]
    Malformed,

    /// The token is outside its usable time window (expired, or not yet
    /// valid; both mean "not currently usable").
    #[error("token is outside its validity window")]
    Expired,

    /// The issuer claim does not match the expected issuer.
    #[error("issuer mismatch: expected {expected}, found {found}")]
    InvalidIssuer {
        /// Issuer the caller expected.
        expected: String,
        /// Issuer the token carried.
        found: String,
    },

    /// The expected audience appears nowhere in the audience claim.
    #[error("audience mismatch: expected {expected}")]
    InvalidAudience {
        /// Audience the caller expected.
        expected: String,
    },

    /// A required scope is absent from the scope claim.
    #[error("missing required scope: {missing}")]
    InsufficientScope {
        /// The first required scope found missing.
        missing: String,
    },

    /// The token's assurance level is below the required level.
    #[error("insufficient assurance: required {required:?}, token has {level:?}")]
    InsufficientAssurance {
        /// Level the caller required.
        required: AssuranceLevel,
        /// Level the token claimed.
        level: AssuranceLevel,
    },
}

/// Result of validating a token.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// Every check passed; the full claim set is available.
    Valid(Box<ClaimSet>),

    /// A check failed; the first failure in precedence order.
    Invalid(ValidationFailure),
}

impl ValidationOutcome {
    /// Whether validation succeeded.
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }

    /// The claims, when validation succeeded.
    pub fn claims(&self) -> Option<&ClaimSet> {
        match self {
            ValidationOutcome::Valid(claims) => Some(claims),
            ValidationOutcome::Invalid(_) => None,
        }
    }

    /// The failure reason, when validation failed.
    pub fn failure(&self) -> Option<&ValidationFailure> {
        match self {
            ValidationOutcome::Valid(_) => None,
            ValidationOutcome::Invalid(failure) => Some(failure),
        }
    }
}

/// Validate a token against the given constraints.
///
/// Checks run in a fixed precedence order and short-circuit at the first
/// failure, so a token violating several constraints at once still reports
/// a single deterministic reason: malformed, then the time window, then
/// issuer, audience, scope, and finally assurance.
pub fn validate(token: &str, options: &ValidationOptions) -> ValidationOutcome {
    let claims = match decode_token(token) {
        Ok(claims) => claims,
        Err(_) => return ValidationOutcome::Invalid(ValidationFailure::Malformed),
    };

    let now = Utc::now().timestamp();
    let tolerance = options.clock_skew_secs;

    if now > claims.exp + tolerance {
        return ValidationOutcome::Invalid(ValidationFailure::Expired);
    }

    // Not-yet-valid reads the same as expired to callers: not currently
    // usable.
    if claims.nbf - tolerance > now {
        return ValidationOutcome::Invalid(ValidationFailure::Expired);
    }

    if let Some(ref expected) = options.issuer {
        if &claims.iss != expected {
            return ValidationOutcome::Invalid(ValidationFailure::InvalidIssuer {
                expected: expected.clone(),
                found: claims.iss.clone(),
            });
        }
    }

    if let Some(ref expected) = options.audience {
        if !claims.audience_contains(expected) {
            return ValidationOutcome::Invalid(ValidationFailure::InvalidAudience {
                expected: expected.clone(),
            });
        }
    }

    for scope in &options.required_scopes {
        if !claims.has_scope(scope) {
            return ValidationOutcome::Invalid(ValidationFailure::InsufficientScope {
                missing: scope.clone(),
            });
        }
    }

    if let Some(required) = options.required_assurance {
        let level = AssuranceLevel::of_claims(&claims);
        if level < required {
            return ValidationOutcome::Invalid(ValidationFailure::InsufficientAssurance {
                required,
                level,
            });
        }
    }

    ValidationOutcome::Valid(Box::new(claims))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mint;
    use chrono::Utc;

    fn fresh_token(extra: serde_json::Value) -> String {
        let now = Utc::now().timestamp();
        let mut claims = serde_json::json!({
            "sub": "user-1",
            "iss": "https://issuer.test",
            "aud": "app",
            "iat": now,
            "exp": now + 3600,
            "scope": "openid profile email",
        });
        claims
            .as_object_mut()
            .unwrap()
            .extend(extra.as_object().unwrap().clone());
        mint(&claims)
    }

    #[test]
    fn test_valid_token() {
        let outcome = validate(&fresh_token(serde_json::json!({})), &Default::default());
        assert!(outcome.is_valid());
        assert_eq!(outcome.claims().unwrap().sub, "user-1");
    }

    #[test]
    fn test_malformed_is_data_not_error() {
        let outcome = validate("garbage", &Default::default());
        assert_eq!(outcome.failure(), Some(&ValidationFailure::Malformed));
    }

    #[test]
    fn test_expired() {
        let now = Utc::now().timestamp();
        let token = mint(&serde_json::json!({ "exp": now - 120 }));
        let outcome = validate(&token, &Default::default());
        assert_eq!(outcome.failure(), Some(&ValidationFailure::Expired));
    }

    #[test]
    fn test_expiry_within_skew_tolerated() {
        let now = Utc::now().timestamp();
        let token = mint(&serde_json::json!({ "exp": now - 10 }));
        assert!(validate(&token, &Default::default()).is_valid());
    }

    #[test]
    fn test_not_yet_valid_reports_expired() {
        let now = Utc::now().timestamp();
        let token = mint(&serde_json::json!({ "exp": now + 3600, "nbf": now + 600 }));
        let outcome = validate(&token, &Default::default());
        assert_eq!(outcome.failure(), Some(&ValidationFailure::Expired));
    }

    #[test]
    fn test_precedence_expired_before_audience() {
        // Simultaneously expired and audience-mismatched: the reported
        // reason must be the time window, deterministically.
        let now = Utc::now().timestamp();
        let token = mint(&serde_json::json!({ "exp": now - 120, "aud": "other" }));
        let options = ValidationOptions {
            audience: Some("app".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate(&token, &options).failure(),
            Some(&ValidationFailure::Expired)
        );
    }

    #[test]
    fn test_issuer_mismatch() {
        let token = fresh_token(serde_json::json!({}));
        let options = ValidationOptions {
            issuer: Some("https://other.test".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate(&token, &options).failure(),
            Some(&ValidationFailure::InvalidIssuer {
                expected: "https://other.test".to_string(),
                found: "https://issuer.test".to_string(),
            })
        );
    }

    #[test]
    fn test_issuer_before_audience() {
        let token = fresh_token(serde_json::json!({}));
        let options = ValidationOptions {
            issuer: Some("https://other.test".to_string()),
            audience: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            validate(&token, &options).failure(),
            Some(ValidationFailure::InvalidIssuer { .. })
        ));
    }

    #[test]
    fn test_audience_list_membership() {
        let token = fresh_token(serde_json::json!({ "aud": ["app", "api"] }));
        let options = ValidationOptions {
            audience: Some("api".to_string()),
            ..Default::default()
        };
        assert!(validate(&token, &options).is_valid());

        let options = ValidationOptions {
            audience: Some("admin-console".to_string()),
            ..Default::default()
        };
        assert_eq!(
            validate(&token, &options).failure(),
            Some(&ValidationFailure::InvalidAudience {
                expected: "admin-console".to_string()
            })
        );
    }

    #[test]
    fn test_required_scopes() {
        let token = fresh_token(serde_json::json!({}));
        let options = ValidationOptions {
            required_scopes: vec!["openid".to_string(), "email".to_string()],
            ..Default::default()
        };
        assert!(validate(&token, &options).is_valid());

        let options = ValidationOptions {
            required_scopes: vec!["openid".to_string(), "admin".to_string()],
            ..Default::default()
        };
        assert_eq!(
            validate(&token, &options).failure(),
            Some(&ValidationFailure::InsufficientScope {
                missing: "admin".to_string()
            })
        );
    }

    #[test]
    fn test_required_assurance() {
        let token = fresh_token(serde_json::json!({ "acr": "aal2" }));
        let options = ValidationOptions {
            required_assurance: Some(AssuranceLevel::MultiFactor),
            ..Default::default()
        };
        assert!(validate(&token, &options).is_valid());

        let options = ValidationOptions {
            required_assurance: Some(AssuranceLevel::HardwareBound),
            ..Default::default()
        };
        assert_eq!(
            validate(&token, &options).failure(),
            Some(&ValidationFailure::InsufficientAssurance {
                required: AssuranceLevel::HardwareBound,
                level: AssuranceLevel::MultiFactor,
            })
        );
    }

    #[test]
    fn test_no_assurance_claim_satisfies_only_lowest() {
        let token = fresh_token(serde_json::json!({}));

        let lowest = ValidationOptions {
            required_assurance: Some(AssuranceLevel::SingleFactor),
            ..Default::default()
        };
        assert!(validate(&token, &lowest).is_valid());

        let higher = ValidationOptions {
            required_assurance: Some(AssuranceLevel::MultiFactor),
            ..Default::default()
        };
        assert!(!validate(&token, &higher).is_valid());
    }

    #[test]
    fn test_scope_before_assurance() {
        let token = fresh_token(serde_json::json!({}));
        let options = ValidationOptions {
            required_scopes: vec!["admin".to_string()],
            required_assurance: Some(AssuranceLevel::HardwareBound),
            ..Default::default()
        };
        assert!(matches!(
            validate(&token, &options).failure(),
            Some(ValidationFailure::InsufficientScope { .. })
        ));
    }
}
