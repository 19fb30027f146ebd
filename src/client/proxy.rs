//! Proxy routing derived from a single proxy URL.

use reqwest::Url;

use crate::errors::{TrialError, TrialResult};

const SUPPORTED_SCHEMES: &[&str] = &["http", "https", "socks4", "socks4a", "socks5", "socks5h"];

/// Routes for outbound traffic. Both plain and TLS traffic go through the
/// same proxy; the map is fixed once the client is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyRoutes {
    http: Url,
    https: Url,
}

impl ProxyRoutes {
    /// Parse a proxy descriptor such as `http://127.0.0.1:7890` or
    /// `socks5://127.0.0.1:1080`.
    ///
    /// Returns `Ok(None)` for a blank descriptor (direct connection).
    pub fn parse(descriptor: &str) -> TrialResult<Option<Self>> {
        let descriptor = descriptor.trim();
        if descriptor.is_empty() {
            return Ok(None);
        }

        let url = Url::parse(descriptor)
            .map_err(|e| TrialError::Config(format!("invalid proxy url '{descriptor}': {e}")))?;

        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(TrialError::Config(format!(
                "unsupported proxy scheme '{}', expected one of: {}",
                url.scheme(),
                SUPPORTED_SCHEMES.join(", ")
            )));
        }
        if url.host_str().is_none() {
            return Err(TrialError::Config(format!(
                "proxy url '{descriptor}' has no host"
            )));
        }

        Ok(Some(Self {
            http: url.clone(),
            https: url,
        }))
    }

    /// Proxy used for `http://` targets.
    pub fn http(&self) -> &Url {
        &self.http
    }

    /// Proxy used for `https://` targets.
    pub fn https(&self) -> &Url {
        &self.https
    }

    /// Whether the route is a SOCKS proxy. The transport must be built with
    /// SOCKS support (`socks` feature) for these to work.
    pub fn is_socks(&self) -> bool {
        self.http.scheme().starts_with("socks")
    }
}
