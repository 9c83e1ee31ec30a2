//! Error types for authentication operations
//!
//! Failures split into two families: `AuthError` covers conditions that are
//! genuinely exceptional for the caller (endpoint rejections, configuration
//! gaps, collaborator fetch failures), while semantic token-validation
//! failures are returned as data from the validator (see
//! [`crate::validate::ValidationFailure`]) because callers routinely need to
//! inspect *why* a token failed.

use thiserror::Error;

/// Authentication error types.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token cannot be decoded into header/payload/signature segments,
    /// or its payload is not valid encoded claims.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token or credential endpoint rejected the request (401).
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// A flow was invoked without the configuration it requires
    /// (e.g. client credentials without a client secret).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The discovery document could not be fetched or parsed.
    #[error("Discovery fetch failed: {0}")]
    DiscoveryFetchFailed(String),

    /// The signing-key set could not be fetched or parsed.
    #[error("Signing-key fetch failed: {0}")]
    KeyFetchFailed(String),

    /// HTTP transport failure talking to a collaborator endpoint.
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for authentication operations.
pub type AuthResult<T> = Result<T, AuthError>;

impl AuthError {
    /// Check if this error should be logged at error level.
    ///
    /// Rejected credentials and malformed tokens are expected inputs and
    /// should not be logged as errors.
    pub fn is_server_error(&self) -> bool {
        matches!(
            self,
            AuthError::Internal(_)
                | AuthError::Configuration(_)
                | AuthError::DiscoveryFetchFailed(_)
                | AuthError::KeyFetchFailed(_)
        )
    }

    /// Get error code for API responses and structured logs.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MalformedToken(_) => "MALFORMED_TOKEN",
            AuthError::Unauthorized(_) => "UNAUTHORIZED",
            AuthError::Configuration(_) => "CONFIG_ERROR",
            AuthError::DiscoveryFetchFailed(_) => "DISCOVERY_FETCH_FAILED",
            AuthError::KeyFetchFailed(_) => "KEY_FETCH_FAILED",
            AuthError::RequestFailed(_) => "REQUEST_FAILED",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}
