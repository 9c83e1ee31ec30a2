//! # Vantage Authentication
//!
//! This crate is the authentication and authorization core of the Vantage
//! platform, shared across every platform service.
//!
//! ## Overview
//!
//! The vantage-auth crate handles:
//! - **Login flows**: proof-key-protected authorization-code requests
//! - **Token decoding**: claims extraction without a network round trip
//! - **Validation**: expiry, audience, issuer, scope, and assurance checks
//!   with failures returned as data
//! - **Assurance**: ordered authentication-assurance levels and step-up
//! - **Refresh**: a per-session scheduler that proactively exchanges the
//!   refresh token before expiry, with bounded retry and backoff
//! - **Discovery**: TTL-cached issuer metadata and signing-key sets
//!
//! Cryptographic signature verification is deliberately out of scope: the
//! codec parses claims locally, and the signing-key set is fetched and
//! cached for an external verifier collaborator.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use vantage_auth::{AuthConfig, AuthContext, AuthorizeOptions, ValidationOptions};
//!
//! # async fn example() -> vantage_auth::AuthResult<()> {
//! let context = AuthContext::new(
//!     AuthConfig::new("https://auth.example.com", "client-1")
//!         .with_redirect_uri("https://app/callback"),
//! );
//!
//! // 1. Send the user to the issuer.
//! let request = context
//!     .build_authorization_request(AuthorizeOptions::default())
//!     .await?;
//!
//! // 2. Exchange the returned code, proving possession of the verifier.
//! let tokens = context
//!     .exchange_code("code-from-callback", &request.proof_key.verifier)
//!     .await?;
//!
//! // 3. Validate locally and keep the session fresh.
//! let outcome = context.validate_token(&tokens.access_token, &ValidationOptions::default());
//! assert!(outcome.is_valid());
//! if let Some(refresh) = tokens.refresh_token.clone() {
//!     context.enable_auto_refresh(&tokens.access_token, refresh)?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Cross-App Integration
//!
//! This crate integrates with:
//! - `vantage-rbac`: effective-permission resolution for an identity

pub mod assurance;
pub mod authorize;
pub mod claims;
pub mod codec;
pub mod config;
pub mod context;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod identity;
pub mod pkce;
pub mod refresh;
pub mod validate;

// Re-export main types
pub use assurance::{AssuranceLevel, StepUpOptions, StepUpOutcome};
pub use authorize::{AuthorizationRequest, AuthorizeOptions, DEFAULT_SCOPE};
pub use claims::ClaimSet;
pub use codec::decode_token;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use discovery::{DiscoveryDocument, MetadataCache, SigningKey, SigningKeySet};
pub use error::{AuthError, AuthResult};
pub use exchange::{TokenExchanger, TokenResponse};
pub use identity::UserIdentity;
pub use pkce::{derive_challenge, ProofKeyPair};
pub use refresh::{ObserverId, RefreshOptions, RefreshScheduler};
pub use validate::{ValidationFailure, ValidationOptions, ValidationOutcome};
