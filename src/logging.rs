//! Structured logging for the trial flow.
//!
//! The client emits one event per protocol step through [`log_trial_event`].
//! Events never carry the auth token.
//!
//! # Usage
//!
//! ```rust,ignore
//! use verdent_trial::config::LoggingConfig;
//! use verdent_trial::logging::init_logging;
//!
//! init_logging(&LoggingConfig { enabled: true, level: "debug".into() });
//! ```

use tracing::{info, info_span, warn};

/// Steps of the trial-acquisition protocol worth recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrialEvent {
    /// Account info was fetched
    UserInfoFetched,
    /// Eligibility was checked and passed
    EligibilityChecked,
    /// Eligibility was checked and failed
    EligibilityDenied,
    /// Eligibility check was skipped by the caller
    EligibilityBypassed,
    /// Subscription creation call returned
    SubscriptionCreated,
    /// Final checkout URL was handed to the caller
    CheckoutUrlIssued,
    /// PKCE code was exchanged for a token
    TokenExchanged,
}

impl std::fmt::Display for TrialEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            TrialEvent::UserInfoFetched => "user_info_fetched",
            TrialEvent::EligibilityChecked => "eligibility_checked",
            TrialEvent::EligibilityDenied => "eligibility_denied",
            TrialEvent::EligibilityBypassed => "eligibility_bypassed",
            TrialEvent::SubscriptionCreated => "subscription_created",
            TrialEvent::CheckoutUrlIssued => "checkout_url_issued",
            TrialEvent::TokenExchanged => "token_exchanged",
        };
        write!(f, "{}", s)
    }
}

/// Log a protocol step with optional details.
pub fn log_trial_event(event: TrialEvent, details: Option<&str>) {
    let span = info_span!("trial_event", event = %event);
    let _enter = span.enter();

    match event {
        TrialEvent::EligibilityDenied => {
            if let Some(d) = details {
                warn!(reason = %d, "Trial event occurred");
            } else {
                warn!("Trial event occurred");
            }
        }
        _ => {
            if let Some(d) = details {
                info!(details = %d, "Trial event occurred");
            } else {
                info!("Trial event occurred");
            }
        }
    }
}

/// Install a global fmt subscriber at the configured level.
///
/// Does nothing when logging is disabled or a subscriber is already set.
#[cfg(feature = "cli")]
pub fn init_logging(config: &crate::config::LoggingConfig) {
    use std::str::FromStr;
    use tracing::Level;

    if !config.enabled {
        return;
    }

    let level = Level::from_str(&config.level).unwrap_or(Level::INFO);
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init();
}
