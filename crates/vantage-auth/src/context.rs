//! Authorization context façade
//!
//! The one entry point callers hold. Wires the request builder, codec,
//! validator, assurance engine, metadata cache, and refresh scheduler
//! together around a single issuer configuration.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, instrument};

use crate::assurance::{self, AssuranceLevel, StepUpOptions, StepUpOutcome};
use crate::authorize::{build_authorization_request, AuthorizationRequest, AuthorizeOptions};
use crate::codec::decode_token;
use crate::config::AuthConfig;
use crate::discovery::{DiscoveryDocument, MetadataCache, SigningKeySet};
use crate::error::{AuthError, AuthResult};
use crate::exchange::{TokenExchanger, TokenResponse};
use crate::identity::UserIdentity;
use crate::refresh::{ObserverId, RefreshOptions, RefreshScheduler};
use crate::validate::{validate, ValidationOptions, ValidationOutcome};

struct ContextInner {
    config: AuthConfig,
    client: reqwest::Client,
    metadata: MetadataCache,
}

impl ContextInner {
    async fn token_endpoint(&self) -> AuthResult<String> {
        if let Some(ref endpoint) = self.config.token_endpoint {
            return Ok(endpoint.clone());
        }
        Ok(self.metadata.discovery(false).await?.token_endpoint)
    }

    /// POST a form to the token endpoint and parse the token response.
    async fn post_token_form(&self, params: &[(&str, &str)]) -> AuthResult<TokenResponse> {
        let endpoint = self.token_endpoint().await?;
        let response = self.client.post(&endpoint).form(params).send().await?;

        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthorized(
                "token endpoint rejected the credentials".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(AuthError::Internal(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Internal(format!("invalid token response: {e}")))
    }
}

#[async_trait]
impl TokenExchanger for ContextInner {
    async fn exchange_refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        let mut params = vec![
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ];
        if !self.config.client_id.is_empty() {
            params.push(("client_id", self.config.client_id.as_str()));
        }
        if let Some(ref secret) = self.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        self.post_token_form(&params).await
    }
}

/// The authorization core behind one issuer configuration.
///
/// # Example
///
/// ```rust,no_run
/// use vantage_auth::{AuthConfig, AuthContext, AuthorizeOptions};
///
/// # async fn example() -> vantage_auth::AuthResult<()> {
/// let context = AuthContext::new(
///     AuthConfig::new("https://auth.example.com", "client-1")
///         .with_redirect_uri("https://app/callback"),
/// );
///
/// // Start a login attempt; keep request.proof_key.verifier for the
/// // code exchange.
/// let request = context
///     .build_authorization_request(AuthorizeOptions::default())
///     .await?;
///
/// // After the user returns with a code:
/// let tokens = context
///     .exchange_code("the-code", &request.proof_key.verifier)
///     .await?;
///
/// // Validate locally, no round trip.
/// let outcome = context.validate_token(&tokens.access_token, &Default::default());
/// assert!(outcome.is_valid());
/// # Ok(())
/// # }
/// ```
pub struct AuthContext {
    inner: Arc<ContextInner>,
    scheduler: RefreshScheduler,
}

impl AuthContext {
    /// Create a context with default refresh tuning.
    pub fn new(config: AuthConfig) -> Self {
        Self::with_refresh_options(config, RefreshOptions::default())
    }

    /// Create a context with explicit refresh tuning.
    pub fn with_refresh_options(config: AuthConfig, refresh_options: RefreshOptions) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .expect("Failed to build HTTP client");

        let metadata = MetadataCache::new(client.clone(), config.issuer_url.clone(), config.cache_ttl());
        let inner = Arc::new(ContextInner {
            config,
            client,
            metadata,
        });
        let scheduler = RefreshScheduler::new(
            Arc::clone(&inner) as Arc<dyn TokenExchanger>,
            refresh_options,
        );

        Self { inner, scheduler }
    }

    /// The configuration this context was built from.
    pub fn config(&self) -> &AuthConfig {
        &self.inner.config
    }

    // ----- discovery -----

    /// The issuer's discovery document (TTL-cached).
    pub async fn discovery(&self, force: bool) -> AuthResult<DiscoveryDocument> {
        self.inner.metadata.discovery(force).await
    }

    /// The issuer's signing-key set (TTL-cached), for an external
    /// signature-verifier collaborator.
    pub async fn signing_keys(&self, force: bool) -> AuthResult<SigningKeySet> {
        self.inner.metadata.signing_keys(force).await
    }

    async fn authorization_endpoint(&self) -> AuthResult<String> {
        if let Some(ref endpoint) = self.inner.config.authorization_endpoint {
            return Ok(endpoint.clone());
        }
        Ok(self.inner.metadata.discovery(false).await?.authorization_endpoint)
    }

    async fn step_up_endpoint(&self) -> AuthResult<String> {
        let document = self.inner.metadata.discovery(false).await?;
        Ok(document.step_up_endpoint.unwrap_or_else(|| {
            format!(
                "{}/auth/step-up",
                self.inner.config.issuer_url.trim_end_matches('/')
            )
        }))
    }

    async fn revocation_endpoint(&self) -> AuthResult<String> {
        let document = self.inner.metadata.discovery(false).await?;
        Ok(document.revocation_endpoint.unwrap_or_else(|| {
            format!(
                "{}/oauth/revoke",
                self.inner.config.issuer_url.trim_end_matches('/')
            )
        }))
    }

    // ----- login flows -----

    /// Build the redirect URL that starts an authorization-code login.
    ///
    /// An empty redirect target or omitted scope falls back to the
    /// configured defaults before the URL is built.
    pub async fn build_authorization_request(
        &self,
        mut options: AuthorizeOptions,
    ) -> AuthResult<AuthorizationRequest> {
        if options.redirect_uri.is_empty() {
            options.redirect_uri = self.inner.config.redirect_uri.clone();
        }
        if options.scope.is_none() {
            options.scope = Some(self.inner.config.scope.clone());
        }

        let endpoint = self.authorization_endpoint().await?;
        build_authorization_request(&endpoint, &self.inner.config.client_id, &options)
    }

    /// Exchange an authorization code (plus its proof-key verifier) for
    /// tokens. A rejection maps to [`AuthError::Unauthorized`].
    #[instrument(skip(self, code, code_verifier))]
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> AuthResult<TokenResponse> {
        debug!("exchanging authorization code");

        let mut params = vec![
            ("grant_type", "authorization_code"),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", self.inner.config.redirect_uri.as_str()),
        ];
        if !self.inner.config.client_id.is_empty() {
            params.push(("client_id", self.inner.config.client_id.as_str()));
        }
        if let Some(ref secret) = self.inner.config.client_secret {
            params.push(("client_secret", secret.as_str()));
        }
        self.inner.post_token_form(&params).await
    }

    /// Exchange a refresh token for fresh tokens.
    pub async fn refresh_token(&self, refresh_token: &str) -> AuthResult<TokenResponse> {
        self.inner.exchange_refresh_token(refresh_token).await
    }

    /// Request a token with the client-credentials grant.
    ///
    /// Requires a configured client secret.
    #[instrument(skip(self))]
    pub async fn client_credentials_token(
        &self,
        scope: Option<&str>,
        audience: Option<&str>,
    ) -> AuthResult<TokenResponse> {
        let secret = self.inner.config.client_secret.as_deref().ok_or_else(|| {
            AuthError::Configuration(
                "client_credentials requires a configured client secret".to_string(),
            )
        })?;

        let mut params = vec![
            ("grant_type", "client_credentials"),
            ("client_id", self.inner.config.client_id.as_str()),
            ("client_secret", secret),
        ];
        if let Some(scope) = scope {
            params.push(("scope", scope));
        }
        if let Some(audience) = audience {
            params.push(("audience", audience));
        }
        self.inner.post_token_form(&params).await
    }

    /// Revoke an access or refresh token at the issuer.
    pub async fn revoke_token(&self, token: &str, token_type_hint: Option<&str>) -> AuthResult<()> {
        let endpoint = self.revocation_endpoint().await?;
        let mut params = vec![("token", token)];
        if let Some(hint) = token_type_hint {
            params.push(("token_type_hint", hint));
        }

        let response = self.inner.client.post(&endpoint).form(&params).send().await?;
        if response.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(AuthError::Unauthorized(
                "revocation endpoint rejected the token".to_string(),
            ));
        }
        if !response.status().is_success() {
            return Err(AuthError::Internal(format!(
                "revocation endpoint returned {}",
                response.status()
            )));
        }
        Ok(())
    }

    // ----- local token operations -----

    /// Validate a token locally. Failures come back as data.
    pub fn validate_token(&self, token: &str, options: &ValidationOptions) -> ValidationOutcome {
        validate(token, options)
    }

    /// The assurance level a token claims.
    pub fn assurance_level(&self, token: &str) -> AuthResult<AssuranceLevel> {
        AssuranceLevel::of_token(token)
    }

    /// Extract the authenticated identity from a token.
    pub fn identity(&self, token: &str) -> AuthResult<UserIdentity> {
        Ok(UserIdentity::from_claims(&decode_token(token)?))
    }

    /// Decide whether a token needs step-up to reach `target`.
    pub async fn require_step_up(
        &self,
        token: &str,
        target: AssuranceLevel,
        options: &StepUpOptions,
    ) -> AuthResult<StepUpOutcome> {
        let endpoint = self.step_up_endpoint().await?;
        assurance::require_step_up(&self.inner.client, &endpoint, token, target, options).await
    }

    // ----- auto refresh -----

    /// Arm proactive refresh from an access token's expiry.
    pub fn enable_auto_refresh(
        &self,
        access_token: &str,
        refresh_token: impl Into<String>,
    ) -> AuthResult<()> {
        self.scheduler.enable(access_token, refresh_token)
    }

    /// Stop proactive refresh. Idempotent.
    pub fn disable_auto_refresh(&self) {
        self.scheduler.stop();
    }

    /// Whether the refresh session can still fire.
    pub fn auto_refresh_active(&self) -> bool {
        self.scheduler.is_active()
    }

    /// Register an observer for successful refreshes.
    pub fn on_token_refresh(
        &self,
        observer: impl Fn(&TokenResponse) + Send + Sync + 'static,
    ) -> ObserverId {
        self.scheduler.on_refresh(observer)
    }

    /// Register an observer for terminal refresh failures.
    pub fn on_refresh_error(
        &self,
        observer: impl Fn(&AuthError) + Send + Sync + 'static,
    ) -> ObserverId {
        self.scheduler.on_error(observer)
    }

    /// Remove a previously registered refresh observer.
    pub fn unsubscribe(&self, id: ObserverId) {
        self.scheduler.unsubscribe(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::mint;

    fn context() -> AuthContext {
        AuthContext::new(
            AuthConfig::new("https://auth.test", "client-1")
                .with_redirect_uri("https://app/callback"),
        )
    }

    #[tokio::test]
    async fn test_client_credentials_requires_secret() {
        let result = context().client_credentials_token(None, None).await;
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_identity_extraction() {
        let token = mint(&serde_json::json!({
            "sub": "user-1",
            "exp": 2_000_000_000i64,
            "roles": ["user"],
        }));
        let identity = context().identity(&token).unwrap();
        assert_eq!(identity.user_id, "user-1");
        assert!(identity.has_role("user"));
    }

    #[tokio::test]
    async fn test_identity_rejects_garbage() {
        assert!(matches!(
            context().identity("garbage"),
            Err(AuthError::MalformedToken(_))
        ));
    }

    #[tokio::test]
    async fn test_assurance_level_passthrough() {
        let token = mint(&serde_json::json!({ "acr": "aal2" }));
        assert_eq!(
            context().assurance_level(&token).unwrap(),
            AssuranceLevel::MultiFactor
        );
    }

    #[tokio::test]
    async fn test_auto_refresh_starts_idle() {
        let context = context();
        assert!(!context.auto_refresh_active());
        context.disable_auto_refresh(); // idempotent on an idle session
        assert!(!context.auto_refresh_active());
    }
}
