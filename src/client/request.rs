//! Request shaping and response normalization shared by every endpoint.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE, COOKIE};
use serde_json::Value;
use tracing::debug;

use crate::client::transport::{HttpRequest, HttpResponse};
use crate::errors::{HttpErrorBody, TrialError, TrialResult};

/// Characters of the Cookie header kept in debug traces.
pub const COOKIE_TRACE_CHARS: usize = 20;

/// Characters of a non-JSON error body kept in [`TrialError::Http`].
pub const ERROR_BODY_CHARS: usize = 200;

/// Characters of a non-JSON response body kept in debug traces.
const TRACE_BODY_CHARS: usize = 500;

/// Fill in the default headers.
///
/// `Content-Type: application/json` is added unless present. When a token is
/// set and the caller did not pass its own `Cookie`, `Cookie: token=<token>`
/// is added.
pub fn prepare_headers(
    overrides: Option<HeaderMap>,
    token: Option<&str>,
) -> TrialResult<HeaderMap> {
    let mut headers = overrides.unwrap_or_default();

    if !headers.contains_key(CONTENT_TYPE) {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    }

    if let Some(token) = token {
        if !headers.contains_key(COOKIE) {
            let value = HeaderValue::from_str(&format!("token={token}"))
                .map_err(|_| TrialError::Config("auth token is not a valid header value".into()))?;
            headers.insert(COOKIE, value);
        }
    }

    Ok(headers)
}

/// Turn a raw response into the payload the caller wants.
///
/// - non-2xx: [`TrialError::Http`] with a parsed or truncated body
/// - non-JSON body: [`TrialError::Decode`]
/// - non-zero `errCode`: [`TrialError::Api`]
/// - otherwise the `data` field when present, else the whole body
pub fn normalize_response(response: &HttpResponse) -> TrialResult<Value> {
    if !response.status.is_success() {
        let body = match serde_json::from_str::<Value>(&response.body) {
            Ok(json) => HttpErrorBody::Json(json),
            Err(_) => HttpErrorBody::Text(truncate(&response.body, ERROR_BODY_CHARS)),
        };
        return Err(TrialError::Http {
            status: response.status.as_u16(),
            reason: response
                .status
                .canonical_reason()
                .unwrap_or("Unknown")
                .to_string(),
            body,
        });
    }

    let parsed: Value = serde_json::from_str(&response.body).map_err(|e| {
        TrialError::Decode(format!(
            "response is not JSON ({e}): {}",
            truncate(&response.body, ERROR_BODY_CHARS)
        ))
    })?;

    let Value::Object(mut map) = parsed else {
        return Ok(parsed);
    };

    if let Some(code) = map.get("errCode") {
        let code = err_code(code)?;
        if code != 0 {
            let message = map
                .get("errMsg")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(TrialError::Api { code, message });
        }
    }

    match map.remove("data") {
        Some(Value::Null) | None => Ok(Value::Object(map)),
        Some(data) => Ok(data),
    }
}

fn err_code(value: &Value) -> TrialResult<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| TrialError::Decode(format!("unexpected errCode {n}"))),
        Value::String(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| TrialError::Decode(format!("unexpected errCode '{s}'"))),
        other => Err(TrialError::Decode(format!("unexpected errCode {other}"))),
    }
}

/// Trace an outgoing request. The Cookie value is cut to
/// [`COOKIE_TRACE_CHARS`] characters.
pub fn trace_request(request: &HttpRequest) {
    let body = request
        .body
        .as_ref()
        .map(|b| serde_json::to_string_pretty(b).unwrap_or_default())
        .unwrap_or_else(|| "null".to_string());

    debug!(
        method = %request.method,
        url = %request.url,
        headers = ?redacted_headers(&request.headers),
        "request body: {body}"
    );
}

/// Trace a received response.
pub fn trace_response(response: &HttpResponse) {
    let body = match serde_json::from_str::<Value>(&response.body) {
        Ok(json) => serde_json::to_string_pretty(&json).unwrap_or_default(),
        Err(_) => truncate(&response.body, TRACE_BODY_CHARS),
    };

    debug!(
        status = response.status.as_u16(),
        headers = ?response.headers,
        "response body: {body}"
    );
}

/// Header list with the Cookie value truncated.
pub fn redacted_headers(headers: &HeaderMap) -> Vec<(HeaderName, String)> {
    headers
        .iter()
        .map(|(name, value)| {
            let text = value.to_str().unwrap_or("<binary>");
            let shown = if name == COOKIE {
                format!("{}...", truncate(text, COOKIE_TRACE_CHARS))
            } else {
                text.to_string()
            };
            (name.clone(), shown)
        })
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
