//! HTTP transport seam.
//!
//! [`VerdentClient`](crate::client::VerdentClient) only talks to the network
//! through [`Transport`], which keeps request shaping and response
//! normalization testable without sockets.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, Proxy, StatusCode};
use serde_json::Value;

use crate::client::proxy::ProxyRoutes;
use crate::errors::{TrialError, TrialResult};

/// A fully prepared outbound request.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Option<Value>,
    pub timeout: Duration,
}

/// Raw response as received from the wire.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: String,
}

impl HttpResponse {
    /// Convenience constructor with empty headers.
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and return whatever status came back.
    ///
    /// Implementations fail only on transport problems, mapped to
    /// [`TrialError::Network`]. Non-2xx statuses are a successful exchange.
    async fn execute(&self, request: HttpRequest) -> TrialResult<HttpResponse>;
}

/// Production transport backed by `reqwest` with rustls certificate
/// verification.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Build a transport, routing through `proxy` when given.
    pub fn new(proxy: Option<&ProxyRoutes>) -> TrialResult<Self> {
        let mut builder = Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));

        match proxy {
            Some(routes) => {
                let http = Proxy::http(routes.http().as_str())
                    .map_err(|e| TrialError::Config(format!("invalid proxy: {e}")))?;
                let https = Proxy::https(routes.https().as_str())
                    .map_err(|e| TrialError::Config(format!("invalid proxy: {e}")))?;
                builder = builder.proxy(http).proxy(https);
            }
            // Ignore HTTP(S)_PROXY from the environment; routing is explicit.
            None => builder = builder.no_proxy(),
        }

        let client = builder
            .build()
            .map_err(|e| TrialError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: HttpRequest) -> TrialResult<HttpResponse> {
        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers)
            .timeout(request.timeout);

        if let Some(body) = &request.body {
            // Content-Type is already set by the caller.
            let bytes = serde_json::to_vec(body)
                .map_err(|e| TrialError::Decode(format!("failed to encode request body: {e}")))?;
            builder = builder.body(bytes);
        }

        let resp = builder.send().await?; // -> TrialError::Network

        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp.text().await?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
