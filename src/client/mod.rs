//! Client for the Verdent account service.
//!
//! [`VerdentClient`] owns the session (auth token + proxy routes) and walks
//! the free-trial protocol:
//!
//! 1. fetch account info from the agent host,
//! 2. check eligibility (or bypass the check),
//! 3. create a subscription for the account's trial plan on the API host,
//! 4. hand back the checkout URL.
//!
//! Every step is awaited in sequence; each one consumes the previous step's
//! output, so nothing runs in parallel and nothing is retried.

pub mod proxy;
pub mod request;
pub mod responses;
pub mod transport;

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::config::{
    ApiConfig, DEFAULT_AGENT_HOST, DEFAULT_API_HOST, DEFAULT_LOGIN_HOST, DEFAULT_TIMEOUT_SECS,
};
use crate::device::generate_device_id;
use crate::errors::{TrialError, TrialResult};
use crate::logging::{log_trial_event, TrialEvent};

use self::proxy::ProxyRoutes;
use self::request::{normalize_response, prepare_headers, trace_request, trace_response};
use self::responses::{
    AccountInfo, PkceCallbackRequest, PkceToken, SubscriptionRequest, SubscriptionResult,
};
use self::transport::{HttpRequest, ReqwestTransport, Transport};

pub use self::responses::SubscriptionBonus;

/// Source tag sent with subscription requests made by this client.
pub const TRIAL_SOURCE: &str = "verdent";

pub const PKCE_CALLBACK_PATH: &str = "/passport/pkce/callback";
pub const USER_INFO_PATH: &str = "/user/center/info";
pub const SUBSCRIPTION_CREATE_PATH: &str = "/verdent/subscription/create";

/// Timeout for the account-info call.
const USER_INFO_TIMEOUT: Duration = Duration::from_secs(10);
/// Timeout for the PKCE code exchange.
const PKCE_TIMEOUT: Duration = Duration::from_secs(100);

/// Construction-time settings for [`VerdentClient`].
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub api_host: String,
    pub agent_host: String,
    pub login_host: String,
    pub timeout: Duration,
    pub debug: bool,
    /// Proxy URL; `None` or blank means direct connection.
    pub proxy: Option<String>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            agent_host: DEFAULT_AGENT_HOST.to_string(),
            login_host: DEFAULT_LOGIN_HOST.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            debug: false,
            proxy: None,
        }
    }
}

impl From<&ApiConfig> for ClientOptions {
    fn from(config: &ApiConfig) -> Self {
        Self {
            api_host: config.api_host.clone(),
            agent_host: config.agent_host.clone(),
            login_host: config.login_host.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
            debug: config.debug,
            proxy: None,
        }
    }
}

impl ClientOptions {
    pub fn with_proxy(mut self, proxy: Option<String>) -> Self {
        self.proxy = proxy;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

/// Whether the composed trial flow honours the server's eligibility flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eligibility {
    /// Fail with [`TrialError::NotEligible`] when `isTrialAvailable` is false.
    Enforce,
    /// Skip the check and let subscription creation decide.
    Bypass,
}

/// Options for [`VerdentClient::get_free_trial_page`].
#[derive(Debug, Clone)]
pub struct TrialOptions {
    /// Device id to send; a fresh one is generated when `None`.
    pub device_id: Option<String>,
    pub eligibility: Eligibility,
}

impl TrialOptions {
    pub fn new(eligibility: Eligibility) -> Self {
        Self {
            device_id: None,
            eligibility,
        }
    }

    pub fn with_device_id(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }
}

pub struct VerdentClient<T: Transport = ReqwestTransport> {
    api_host: String,
    agent_host: String,
    login_host: String,
    timeout: Duration,
    debug: bool,
    proxy: Option<ProxyRoutes>,
    auth_token: Option<String>,
    transport: T,
}

impl VerdentClient<ReqwestTransport> {
    /// Build a client backed by `reqwest`.
    ///
    /// Fails with [`TrialError::Config`] for a zero timeout or an unusable
    /// proxy URL.
    pub fn new(options: ClientOptions) -> TrialResult<Self> {
        let proxy = parse_proxy(&options)?;
        let transport = ReqwestTransport::new(proxy.as_ref())?;
        Self::build(options, proxy, transport)
    }
}

impl<T: Transport> VerdentClient<T> {
    /// Build a client on top of a custom transport.
    pub fn with_transport(options: ClientOptions, transport: T) -> TrialResult<Self> {
        let proxy = parse_proxy(&options)?;
        Self::build(options, proxy, transport)
    }

    fn build(options: ClientOptions, proxy: Option<ProxyRoutes>, transport: T) -> TrialResult<Self> {
        if options.timeout.is_zero() {
            return Err(TrialError::Config(
                "timeout must be greater than 0".to_string(),
            ));
        }

        if options.debug {
            if let Some(routes) = &proxy {
                tracing::debug!(proxy = %routes.http(), "using proxy");
            }
        }

        Ok(Self {
            api_host: options.api_host.trim_end_matches('/').to_string(),
            agent_host: options.agent_host.trim_end_matches('/').to_string(),
            login_host: options.login_host.trim_end_matches('/').to_string(),
            timeout: options.timeout,
            debug: options.debug,
            proxy,
            auth_token: None,
            transport,
        })
    }

    /// Store the token used by every later authenticated call. The token is
    /// not inspected; an expired or invalid one surfaces as a server error.
    pub fn set_auth_token(&mut self, token: impl Into<String>) {
        self.auth_token = Some(token.into());
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn proxy(&self) -> Option<&ProxyRoutes> {
        self.proxy.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Exchange a PKCE authorization code for a token and make it the active
    /// session token.
    pub async fn pkce_callback(&mut self, code: &str, code_verifier: &str) -> TrialResult<String> {
        let url = format!("{}{}", self.login_host, PKCE_CALLBACK_PATH);
        let body = PkceCallbackRequest {
            code,
            code_verifier,
        };

        let response: PkceToken = self
            .request(Method::POST, &url, Some(&body), None, Some(PKCE_TIMEOUT))
            .await?;

        let token = response
            .token
            .filter(|t| !t.is_empty())
            .ok_or(TrialError::MissingToken)?;

        self.auth_token = Some(token.clone());
        log_trial_event(TrialEvent::TokenExchanged, None);
        Ok(token)
    }

    /// Fetch the current account state. Never cached.
    pub async fn get_user_info(&self) -> TrialResult<AccountInfo> {
        self.require_auth()?;

        let url = format!("{}{}", self.agent_host, USER_INFO_PATH);
        let info: AccountInfo = self
            .request::<(), _>(Method::GET, &url, None, None, Some(USER_INFO_TIMEOUT))
            .await?;

        log_trial_event(TrialEvent::UserInfoFetched, info.email.as_deref());
        Ok(info)
    }

    /// Create a subscription for `plan_id`.
    ///
    /// A device id is generated when `device_id` is `None`.
    pub async fn create_subscription(
        &self,
        plan_id: &str,
        device_id: Option<&str>,
        source: &str,
    ) -> TrialResult<SubscriptionResult> {
        self.require_auth()?;

        let generated;
        let device_id = match device_id {
            Some(id) => id,
            None => {
                generated = generate_device_id();
                generated.as_str()
            }
        };

        let url = format!("{}{}", self.api_host, SUBSCRIPTION_CREATE_PATH);
        let body = SubscriptionRequest {
            plan_id,
            device_id,
            source,
        };

        let result: SubscriptionResult = self
            .request(Method::POST, &url, Some(&body), None, None)
            .await?;

        log_trial_event(TrialEvent::SubscriptionCreated, Some(plan_id));
        Ok(result)
    }

    /// Run the full trial flow and return the checkout URL.
    ///
    /// Eligibility is decided before any subscription call is spent, and the
    /// plan id always comes from the freshly fetched account state.
    pub async fn get_free_trial_page(&self, options: TrialOptions) -> TrialResult<String> {
        self.require_auth()?;

        let info = self.get_user_info().await?;

        match options.eligibility {
            Eligibility::Enforce => check_eligibility(&info)?,
            Eligibility::Bypass => log_trial_event(TrialEvent::EligibilityBypassed, None),
        }

        let plan_id = info.trial_plan_id().ok_or(TrialError::MissingPlanId)?;

        let device_id = options.device_id.unwrap_or_else(generate_device_id);

        let result = self
            .create_subscription(plan_id, Some(device_id.as_str()), TRIAL_SOURCE)
            .await?;

        let checkout_url = result
            .checkout_url()
            .ok_or(TrialError::MissingCheckoutUrl)?
            .to_string();

        log_trial_event(TrialEvent::CheckoutUrlIssued, None);
        Ok(checkout_url)
    }

    fn require_auth(&self) -> TrialResult<()> {
        match self.auth_token {
            Some(_) => Ok(()),
            None => Err(TrialError::MissingAuth),
        }
    }

    /// Send one request and decode its normalized payload into `R`.
    async fn request<B, R>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: Option<HeaderMap>,
        timeout: Option<Duration>,
    ) -> TrialResult<R>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let value = self.execute(method, url, body, headers, timeout).await?;
        serde_json::from_value(value)
            .map_err(|e| TrialError::Decode(format!("unexpected response from {url}: {e}")))
    }

    /// Shared request path: default headers, auth cookie, timeout, debug
    /// tracing, then response normalization.
    async fn execute<B>(
        &self,
        method: Method,
        url: &str,
        body: Option<&B>,
        headers: Option<HeaderMap>,
        timeout: Option<Duration>,
    ) -> TrialResult<Value>
    where
        B: Serialize + ?Sized,
    {
        let headers = prepare_headers(headers, self.auth_token.as_deref())?;
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| TrialError::Decode(format!("failed to encode request body: {e}")))?;

        let request = HttpRequest {
            method,
            url: url.to_string(),
            headers,
            body,
            timeout: timeout.unwrap_or(self.timeout),
        };

        if self.debug {
            trace_request(&request);
        }

        let response = self.transport.execute(request).await?;

        if self.debug {
            trace_response(&response);
        }

        normalize_response(&response)
    }
}

fn parse_proxy(options: &ClientOptions) -> TrialResult<Option<ProxyRoutes>> {
    match options.proxy.as_deref() {
        Some(descriptor) => ProxyRoutes::parse(descriptor),
        None => Ok(None),
    }
}

fn check_eligibility(info: &AccountInfo) -> TrialResult<()> {
    if info.trial_available() {
        log_trial_event(TrialEvent::EligibilityChecked, None);
        return Ok(());
    }

    let err = TrialError::NotEligible {
        is_subscribe: info.is_subscribe,
        is_trial_available: false,
    };
    let reason = err.to_string();
    log_trial_event(TrialEvent::EligibilityDenied, Some(reason.as_str()));
    Err(err)
}
