//! Error types for the Verdent trial client.
//!
//! Every failure is surfaced to the direct caller. Nothing here is retried
//! or downgraded to default data.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Body attached to an HTTP error: parsed JSON when possible, otherwise the
/// leading slice of the raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpErrorBody {
    Json(Value),
    Text(String),
}

impl fmt::Display for HttpErrorBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpErrorBody::Json(value) => write!(f, "{value}"),
            HttpErrorBody::Text(text) => f.write_str(text),
        }
    }
}

#[derive(Debug, Error)]
pub enum TrialError {
    /// An authenticated operation was called before a token was set.
    #[error("no auth token set; call set_auth_token() or pkce_callback() first")]
    MissingAuth,

    /// Transport failure: DNS, connect, TLS, timeout.
    #[error("request failed: {0}")]
    Network(String),

    /// Non-2xx response.
    #[error("HTTP error {status}: {reason} ({body})")]
    Http {
        status: u16,
        reason: String,
        body: HttpErrorBody,
    },

    /// The response carried a non-zero `errCode`.
    #[error("API error (errCode={code}): {message}")]
    Api { code: i64, message: String },

    /// The account is not eligible for a free trial and the check was enforced.
    #[error(
        "free trial is not available for this account \
         (isSubscribe={}, isTrialAvailable={is_trial_available}); \
         it may have used its trial already, hold a subscription, or not qualify",
        display_flag(.is_subscribe)
    )]
    NotEligible {
        is_subscribe: Option<bool>,
        is_trial_available: bool,
    },

    /// Account info did not include a usable `trialPlanId`.
    #[error("account info has no trialPlanId")]
    MissingPlanId,

    /// Subscription was created but no `checkout_url` came back.
    #[error("subscription response has no checkout_url")]
    MissingCheckoutUrl,

    /// PKCE callback succeeded but returned no token.
    #[error("PKCE callback response has no token")]
    MissingToken,

    /// A successful response could not be interpreted.
    #[error("failed to decode response: {0}")]
    Decode(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(#[from] std::io::Error),
}

fn display_flag(flag: &Option<bool>) -> String {
    match flag {
        Some(value) => value.to_string(),
        None => "unknown".to_string(),
    }
}

impl TrialError {
    /// HTTP status carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            TrialError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True for transport-level failures that may succeed with a different
    /// network path (for example a proxy).
    pub fn is_network(&self) -> bool {
        matches!(self, TrialError::Network(_))
    }
}

impl From<reqwest::Error> for TrialError {
    fn from(err: reqwest::Error) -> Self {
        TrialError::Network(err.to_string())
    }
}

pub type TrialResult<T> = Result<T, TrialError>;
