//! Authorization-code request construction
//!
//! Builds the redirect URL that starts a proof-key-protected
//! authorization-code flow. Purely constructive: the only side effect is
//! randomness consumption for the state value and the proof key pair.

use std::collections::HashMap;

use rand::Rng;

use crate::assurance::AssuranceLevel;
use crate::error::{AuthError, AuthResult};
use crate::pkce::ProofKeyPair;

/// Scope requested when the caller does not name one.
pub const DEFAULT_SCOPE: &str = "openid profile email";

/// Inputs for one authorization request.
#[derive(Debug, Clone, Default)]
pub struct AuthorizeOptions {
    /// Where the issuer sends the user back with the code. Required.
    pub redirect_uri: String,

    /// Requested scope; [`DEFAULT_SCOPE`] when omitted.
    pub scope: Option<String>,

    /// CSRF correlation value; generated with the secure-random source
    /// when omitted.
    pub state: Option<String>,

    /// Pre-fill hint for the login form.
    pub login_hint: Option<String>,

    /// External identity-provider selector.
    pub connection: Option<String>,

    /// Assurance level to request up front.
    pub acr_values: Option<AssuranceLevel>,

    /// Free-form extension parameters, merged last. Keys colliding with
    /// the parameters this builder emits are dropped; fixed parameters
    /// always win.
    pub extra_params: HashMap<String, String>,
}

impl AuthorizeOptions {
    /// Options for a redirect target, everything else defaulted.
    pub fn new(redirect_uri: impl Into<String>) -> Self {
        Self {
            redirect_uri: redirect_uri.into(),
            ..Default::default()
        }
    }
}

/// A fully built authorization request.
///
/// Created per login attempt. The caller must retain `proof_key.verifier`
/// until code exchange; this crate does not persist it.
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    /// The redirect URL to send the user agent to.
    pub url: String,

    /// The state value encoded in the URL.
    pub state: String,

    /// The scope encoded in the URL.
    pub scope: String,

    /// The proof key pair whose challenge is encoded in the URL.
    pub proof_key: ProofKeyPair,
}

/// Build the authorization redirect URL.
///
/// A fresh [`ProofKeyPair`] is generated on every call and never reused.
pub fn build_authorization_request(
    authorization_endpoint: &str,
    client_id: &str,
    options: &AuthorizeOptions,
) -> AuthResult<AuthorizationRequest> {
    if options.redirect_uri.is_empty() {
        return Err(AuthError::Configuration(
            "redirect_uri must not be empty".to_string(),
        ));
    }

    let mut url = reqwest::Url::parse(authorization_endpoint).map_err(|e| {
        AuthError::Configuration(format!(
            "invalid authorization endpoint {authorization_endpoint}: {e}"
        ))
    })?;

    let proof_key = ProofKeyPair::generate(64);
    let state = options.state.clone().unwrap_or_else(random_state);
    let scope = options
        .scope
        .clone()
        .unwrap_or_else(|| DEFAULT_SCOPE.to_string());

    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("response_type", "code");
        pairs.append_pair("client_id", client_id);
        pairs.append_pair("redirect_uri", &options.redirect_uri);
        pairs.append_pair("scope", &scope);
        pairs.append_pair("state", &state);
        pairs.append_pair("code_challenge", &proof_key.challenge);
        pairs.append_pair("code_challenge_method", proof_key.method);

        if let Some(ref hint) = options.login_hint {
            pairs.append_pair("login_hint", hint);
        }
        if let Some(ref connection) = options.connection {
            pairs.append_pair("connection", connection);
        }
        if let Some(acr) = options.acr_values {
            pairs.append_pair("acr_values", acr.as_str());
        }

        // Extensions merge last and never displace what was set above.
        let mut extras: Vec<(&String, &String)> = options
            .extra_params
            .iter()
            .filter(|(key, _)| !is_reserved_param(key, options))
            .collect();
        extras.sort_by(|a, b| a.0.cmp(b.0));
        for (key, value) in extras {
            pairs.append_pair(key, value);
        }
    }

    Ok(AuthorizationRequest {
        url: url.into(),
        state,
        scope,
        proof_key,
    })
}

fn is_reserved_param(key: &str, options: &AuthorizeOptions) -> bool {
    matches!(
        key,
        "response_type"
            | "client_id"
            | "redirect_uri"
            | "scope"
            | "state"
            | "code_challenge"
            | "code_challenge_method"
    ) || (key == "login_hint" && options.login_hint.is_some())
        || (key == "connection" && options.connection.is_some())
        || (key == "acr_values" && options.acr_values.is_some())
}

fn random_state() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pkce::derive_challenge;
    use std::collections::HashMap;

    const ENDPOINT: &str = "https://issuer.test/oauth/authorize";

    fn query_map(url: &str) -> HashMap<String, String> {
        reqwest::Url::parse(url)
            .unwrap()
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_fixed_parameters_present() {
        let request = build_authorization_request(
            ENDPOINT,
            "client-1",
            &AuthorizeOptions::new("https://app/callback"),
        )
        .unwrap();

        let query = query_map(&request.url);
        assert_eq!(query["response_type"], "code");
        assert_eq!(query["client_id"], "client-1");
        assert_eq!(query["redirect_uri"], "https://app/callback");
        assert_eq!(query["scope"], DEFAULT_SCOPE);
        assert_eq!(query["code_challenge_method"], "S256");
        assert!(!query["state"].is_empty());
    }

    #[test]
    fn test_challenge_matches_verifier() {
        let request = build_authorization_request(
            ENDPOINT,
            "client-1",
            &AuthorizeOptions::new("https://app/callback"),
        )
        .unwrap();

        let query = query_map(&request.url);
        assert_eq!(
            query["code_challenge"],
            derive_challenge(&request.proof_key.verifier)
        );
    }

    #[test]
    fn test_fresh_proof_key_per_call() {
        let options = AuthorizeOptions::new("https://app/callback");
        let a = build_authorization_request(ENDPOINT, "client-1", &options).unwrap();
        let b = build_authorization_request(ENDPOINT, "client-1", &options).unwrap();
        assert_ne!(a.proof_key.verifier, b.proof_key.verifier);
        assert_ne!(a.state, b.state);
    }

    #[test]
    fn test_caller_supplied_state_and_scope() {
        let options = AuthorizeOptions {
            state: Some("my-state".to_string()),
            scope: Some("openid offline_access".to_string()),
            ..AuthorizeOptions::new("https://app/callback")
        };
        let request = build_authorization_request(ENDPOINT, "client-1", &options).unwrap();

        let query = query_map(&request.url);
        assert_eq!(query["state"], "my-state");
        assert_eq!(query["scope"], "openid offline_access");
        assert_eq!(request.state, "my-state");
    }

    #[test]
    fn test_optional_fields_encoded() {
        let options = AuthorizeOptions {
            login_hint: Some("user@example.com".to_string()),
            connection: Some("github".to_string()),
            acr_values: Some(AssuranceLevel::MultiFactor),
            ..AuthorizeOptions::new("https://app/callback")
        };
        let request = build_authorization_request(ENDPOINT, "client-1", &options).unwrap();

        let query = query_map(&request.url);
        assert_eq!(query["login_hint"], "user@example.com");
        assert_eq!(query["connection"], "github");
        assert_eq!(query["acr_values"], "aal2");
    }

    #[test]
    fn test_extensions_cannot_displace_fixed_params() {
        let mut extra_params = HashMap::new();
        extra_params.insert("state".to_string(), "smuggled".to_string());
        extra_params.insert("code_challenge".to_string(), "smuggled".to_string());
        extra_params.insert("prompt".to_string(), "consent".to_string());

        let options = AuthorizeOptions {
            state: Some("legit".to_string()),
            extra_params,
            ..AuthorizeOptions::new("https://app/callback")
        };
        let request = build_authorization_request(ENDPOINT, "client-1", &options).unwrap();

        let url = reqwest::Url::parse(&request.url).unwrap();
        let states: Vec<_> = url
            .query_pairs()
            .filter(|(k, _)| k == "state")
            .map(|(_, v)| v.into_owned())
            .collect();
        assert_eq!(states, vec!["legit"]);

        let query = query_map(&request.url);
        assert_eq!(
            query["code_challenge"],
            derive_challenge(&request.proof_key.verifier)
        );
        assert_eq!(query["prompt"], "consent");
    }

    #[test]
    fn test_empty_redirect_rejected() {
        let result =
            build_authorization_request(ENDPOINT, "client-1", &AuthorizeOptions::default());
        assert!(matches!(result, Err(AuthError::Configuration(_))));
    }
}
