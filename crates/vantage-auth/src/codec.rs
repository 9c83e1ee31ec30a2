//! Token decoding
//!
//! Decodes an opaque signed token into a structured [`ClaimSet`] without
//! verifying its cryptographic signature. That is an explicit design choice:
//! decoding must work without network access, and signature assurance is
//! delegated to an external key-provider collaborator (see
//! [`crate::discovery`]). Callers who cross a trust boundary they do not
//! control must combine this with signature verification before acting on
//! the claims.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use crate::claims::ClaimSet;
use crate::error::{AuthError, AuthResult};

/// Decode a token into its claim set.
///
/// Fails with [`AuthError::MalformedToken`] when the input cannot be split
/// into the expected three dot-delimited segments, or the payload segment
/// is not valid encoded claims. No time-window, audience, or issuer checks
/// happen here; see [`crate::validate`] for those.
pub fn decode_token(token: &str) -> AuthResult<ClaimSet> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();

    // The key is unused with signature validation disabled.
    let data = decode::<ClaimSet>(token, &DecodingKey::from_secret(&[]), &validation)
        .map_err(|e| AuthError::MalformedToken(e.to_string()))?;

    Ok(data.claims)
}

#[cfg(test)]
pub(crate) fn mint(claims: &serde_json::Value) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(b"unit-test-secret"),
    )
    .unwrap()
}
