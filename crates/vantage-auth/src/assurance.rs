//! Authentication assurance levels and step-up
//!
//! Maps the `acr` claim onto a fixed total order of assurance levels and
//! decides whether a session must step up to a stronger authentication
//! ceremony. Requesting a step-up is the only operation here that performs
//! network I/O.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::claims::ClaimSet;
use crate::codec::decode_token;
use crate::error::{AuthError, AuthResult};

/// How strongly the session's holder was authenticated.
///
/// Levels form a fixed total order:
/// `SingleFactor < MultiFactor < HardwareBound`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AssuranceLevel {
    /// Password-only (or equivalent single-factor) authentication.
    SingleFactor = 0,

    /// A second factor was presented.
    MultiFactor = 1,

    /// A hardware-bound authenticator was used.
    HardwareBound = 2,
}

impl AssuranceLevel {
    /// The `acr` wire value for this level.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssuranceLevel::SingleFactor => "aal1",
            AssuranceLevel::MultiFactor => "aal2",
            AssuranceLevel::HardwareBound => "aal3",
        }
    }

    /// Parse an `acr` claim value.
    ///
    /// Recognizes the `aal1`/`aal2`/`aal3` family plus the short aliases
    /// some issuers emit. Unrecognized values map to `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "aal1" | "pwd" => Some(Self::SingleFactor),
            "aal2" | "mfa" => Some(Self::MultiFactor),
            "aal3" | "hwk" => Some(Self::HardwareBound),
            _ => None,
        }
    }

    /// The level claimed by a decoded claim set.
    ///
    /// An absent or unrecognized `acr` claim maps to the lowest level, so a
    /// token never gains assurance it cannot prove.
    pub fn of_claims(claims: &ClaimSet) -> Self {
        claims
            .acr
            .as_deref()
            .and_then(Self::parse)
            .unwrap_or(Self::SingleFactor)
    }

    /// The level claimed by an encoded token.
    ///
    /// Fails only when the token cannot be decoded at all; a missing claim
    /// is the lowest level, not an error.
    pub fn of_token(token: &str) -> AuthResult<Self> {
        let claims = decode_token(token)?;
        Ok(Self::of_claims(&claims))
    }
}

/// Optional fields forwarded to the step-up endpoint.
#[derive(Debug, Clone, Default)]
pub struct StepUpOptions {
    /// Human-readable reason shown during the ceremony.
    pub reason: Option<String>,

    /// Where to land after the ceremony completes.
    pub redirect_uri: Option<String>,
}

/// Outcome of a step-up decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepUpOutcome {
    /// The token already meets the target level; echoed back unchanged.
    NotRequired {
        /// The token that satisfied the requirement.
        token: String,
    },

    /// A stronger ceremony is needed; redirect the user here.
    Required {
        /// Redirect target for the stronger authentication ceremony.
        step_up_url: String,
    },
}

#[derive(Serialize)]
struct StepUpRequest<'a> {
    target_level: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redirect_uri: Option<&'a str>,
}

#[derive(Deserialize)]
struct StepUpResponse {
    #[serde(rename = "stepUpUrl")]
    step_up_url: Option<String>,
}

/// Decide whether a token needs step-up to reach `target`, contacting the
/// step-up endpoint when it does.
///
/// A 401 from the endpoint maps to [`AuthError::Unauthorized`] rather than
/// a step-up outcome: an unauthenticated caller cannot request step-up.
pub async fn require_step_up(
    client: &reqwest::Client,
    step_up_endpoint: &str,
    token: &str,
    target: AssuranceLevel,
    options: &StepUpOptions,
) -> AuthResult<StepUpOutcome> {
    let current = AssuranceLevel::of_token(token)?;
    if current >= target {
        return Ok(StepUpOutcome::NotRequired {
            token: token.to_string(),
        });
    }

    debug!(
        current = current.as_str(),
        target = target.as_str(),
        "requesting step-up"
    );

    let body = StepUpRequest {
        target_level: target.as_str(),
        reason: options.reason.as_deref(),
        redirect_uri: options.redirect_uri.as_deref(),
    };

    let response = client
        .post(step_up_endpoint)
        .bearer_auth(token)
        .json(&body)
        .send()
        .await?;

    if response.status() == reqwest::StatusCode::UNAUTHORIZED {
        return Err(AuthError::Unauthorized(
            "step-up endpoint rejected the token".to_string(),
        ));
    }
    if !response.status().is_success() {
        return Err(AuthError::Internal(format!(
            "step-up endpoint returned {}",
            response.status()
        )));
    }

    let parsed: StepUpResponse = response
        .json()
        .await
        .map_err(|e| AuthError::Internal(format!("invalid step-up response: {e}")))?;

    match parsed.step_up_url {
        Some(step_up_url) => Ok(StepUpOutcome::Required { step_up_url }),
        None => Err(AuthError::Internal(
            "step-up endpoint returned no redirect target".to_string(),
        )),
    }
}
