//! Proof key for code exchange (PKCE)
//!
//! Generates a random verifier and its derived S256 challenge, binding an
//! authorization code to the client that requested it.

use base64::Engine;
use rand::Rng;
use sha2::{Digest, Sha256};

/// Challenge method sent alongside the derived challenge.
pub const CHALLENGE_METHOD: &str = "S256";

/// Shortest verifier RFC 7636 permits.
pub const MIN_VERIFIER_LENGTH: usize = 43;

/// Longest verifier RFC 7636 permits.
pub const MAX_VERIFIER_LENGTH: usize = 128;

/// Unreserved URL-safe characters permitted in a verifier.
const VERIFIER_CHARSET: &[u8] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-._~";

/// A verifier/challenge pair for one authorization attempt.
///
/// The pair is always derived as a unit, so
/// `pair.challenge == derive_challenge(&pair.verifier)` holds for every
/// instance. The verifier must be retained by the caller until code
/// exchange; this crate does not persist it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofKeyPair {
    /// Random verifier, 43-128 unreserved characters.
    pub verifier: String,

    /// base64url(sha256(verifier)), no padding.
    pub challenge: String,

    /// Always [`CHALLENGE_METHOD`].
    pub method: &'static str,
}

impl ProofKeyPair {
    /// Generate a pair with a verifier of the requested length.
    ///
    /// Lengths outside [43, 128] are clamped to the nearest bound rather
    /// than rejected. The verifier is sampled from a cryptographically
    /// secure random source.
    pub fn generate(length: usize) -> Self {
        let length = length.clamp(MIN_VERIFIER_LENGTH, MAX_VERIFIER_LENGTH);
        let mut rng = rand::thread_rng();

        let verifier: String = (0..length)
            .map(|_| {
                let idx = rng.gen_range(0..VERIFIER_CHARSET.len());
                VERIFIER_CHARSET[idx] as char
            })
            .collect();

        let challenge = derive_challenge(&verifier);
        Self {
            verifier,
            challenge,
            method: CHALLENGE_METHOD,
        }
    }
}

impl Default for ProofKeyPair {
    fn default() -> Self {
        Self::generate(64)
    }
}

/// Derive the S256 challenge for a verifier.
///
/// Deterministic given the verifier; exposed separately so it can be
/// re-derived for verification.
pub fn derive_challenge(verifier: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(verifier.as_bytes());
    let digest = hasher.finalize();
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(digest)
}
