//! verdent-trial - client for the Verdent account service
//!
//! Authenticates with a cookie-borne token, reads account and trial
//! eligibility state, and walks the multi-step flow that yields a checkout
//! URL for a free-trial subscription.
//!
//! # Features
//!
//! - `cli` - the `verdent_trial` binary and log output. Enabled by default.
//! - `socks` - SOCKS4/5 proxy support in the HTTP transport. Enabled by default.
//!
//! # Example
//!
//! ```rust,ignore
//! use verdent_trial::client::{ClientOptions, Eligibility, TrialOptions, VerdentClient};
//!
//! let mut client = VerdentClient::new(ClientOptions::default())?;
//! client.set_auth_token(token);
//! let url = client
//!     .get_free_trial_page(TrialOptions::new(Eligibility::Enforce))
//!     .await?;
//! ```

pub mod client;
pub mod config;
pub mod device;
pub mod errors;
pub mod logging;
pub mod settings;

pub use client::{ClientOptions, Eligibility, TrialOptions, VerdentClient};
pub use errors::{TrialError, TrialResult};
