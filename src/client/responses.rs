//! Request and response payloads for the Verdent endpoints.
//!
//! Response types keep every field the server sends: the fields the client
//! acts on are typed, the rest land in a flattened `extra` map.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Account state from `GET {agent}/user/center/info`.
///
/// Fetched fresh on every call and never cached. Fields the trial flow does
/// not act on are read leniently: a value of the wrong shape becomes `None`
/// instead of failing the whole response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountInfo {
    #[serde(default, deserialize_with = "lenient")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub is_login: Option<bool>,

    #[serde(default, deserialize_with = "lenient")]
    pub is_subscribe: Option<bool>,

    #[serde(default)]
    pub is_trial_available: Option<bool>,

    /// Plan the account may trial. Servers have sent both strings and
    /// numbers here; both are normalized to a string.
    #[serde(default, deserialize_with = "string_or_number")]
    pub trial_plan_id: Option<String>,

    #[serde(default, deserialize_with = "lenient")]
    pub subscription_bonus: Option<SubscriptionBonus>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl AccountInfo {
    /// Trial availability as reported by the server; absent means no.
    pub fn trial_available(&self) -> bool {
        self.is_trial_available.unwrap_or(false)
    }

    /// The trial plan id, or `None` when absent or empty.
    pub fn trial_plan_id(&self) -> Option<&str> {
        self.trial_plan_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Promotional copy attached to the account info.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionBonus {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tips: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Body for `POST {api}/verdent/subscription/create`.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionRequest<'a> {
    pub plan_id: &'a str,
    pub device_id: &'a str,
    pub source: &'a str,
}

/// Result of subscription creation. Server fields other than
/// `checkout_url` are passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionResult {
    #[serde(default)]
    pub checkout_url: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SubscriptionResult {
    /// The checkout URL, or `None` when absent or empty.
    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout_url.as_deref().filter(|url| !url.is_empty())
    }
}

/// Body for `POST {login}/passport/pkce/callback`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PkceCallbackRequest<'a> {
    pub code: &'a str,
    pub code_verifier: &'a str,
}

/// Result of the PKCE code exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PkceToken {
    #[serde(default)]
    pub token: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Decode `T`, mapping a mismatched value to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| serde_json::from_value(v).ok()))
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    match value {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_account_info() {
        let info: AccountInfo = serde_json::from_value(json!({
            "email": "dev@example.com",
            "isLogin": true,
            "isSubscribe": false,
            "isTrialAvailable": true,
            "trialPlanId": "plan_trial_01",
            "subscriptionBonus": {
                "title": "Free credits",
                "description": "Start a trial",
                "tips": ["card required"]
            },
            "region": "us"
        }))
        .unwrap();

        assert_eq!(info.email.as_deref(), Some("dev@example.com"));
        assert!(info.trial_available());
        assert_eq!(info.trial_plan_id(), Some("plan_trial_01"));
        let bonus = info.subscription_bonus.as_ref().unwrap();
        assert_eq!(bonus.title.as_deref(), Some("Free credits"));
        assert_eq!(info.extra.get("region"), Some(&json!("us")));
    }

    #[test]
    fn missing_trial_flag_means_unavailable() {
        let info: AccountInfo = serde_json::from_value(json!({})).unwrap();
        assert!(!info.trial_available());
        assert_eq!(info.trial_plan_id(), None);
        assert_eq!(info.is_subscribe, None);
    }

    #[test]
    fn unexpected_shapes_in_unused_fields_are_dropped() {
        let info: AccountInfo = serde_json::from_value(json!({
            "email": 12,
            "isLogin": 1,
            "isSubscribe": 0,
            "isTrialAvailable": true,
            "trialPlanId": "p1",
            "subscriptionBonus": {"title": 5}
        }))
        .unwrap();

        assert_eq!(info.email, None);
        assert_eq!(info.is_login, None);
        assert_eq!(info.is_subscribe, None);
        assert!(info.subscription_bonus.is_none());
        assert!(info.trial_available());
        assert_eq!(info.trial_plan_id(), Some("p1"));

        let info: AccountInfo =
            serde_json::from_value(json!({"subscriptionBonus": []})).unwrap();
        assert!(info.subscription_bonus.is_none());
    }

    #[test]
    fn empty_plan_id_is_treated_as_missing() {
        let info: AccountInfo = serde_json::from_value(json!({"trialPlanId": ""})).unwrap();
        assert_eq!(info.trial_plan_id(), None);
    }

    #[test]
    fn numeric_plan_id_is_normalized() {
        let info: AccountInfo = serde_json::from_value(json!({"trialPlanId": 42})).unwrap();
        assert_eq!(info.trial_plan_id(), Some("42"));
    }

    #[test]
    fn subscription_result_passes_through_fields() {
        let result: SubscriptionResult = serde_json::from_value(json!({
            "checkout_url": "https://checkout.example/s/abc",
            "session_id": "cs_123"
        }))
        .unwrap();
        assert_eq!(result.checkout_url(), Some("https://checkout.example/s/abc"));
        assert_eq!(result.extra.get("session_id"), Some(&json!("cs_123")));
    }

    #[test]
    fn subscription_request_body_shape() {
        let body = serde_json::to_value(SubscriptionRequest {
            plan_id: "p1",
            device_id: "d1",
            source: "verdent",
        })
        .unwrap();
        assert_eq!(
            body,
            json!({"plan_id": "p1", "device_id": "d1", "source": "verdent"})
        );
    }

    #[test]
    fn pkce_request_uses_camel_case() {
        let body = serde_json::to_value(PkceCallbackRequest {
            code: "c",
            code_verifier: "v",
        })
        .unwrap();
        assert_eq!(body, json!({"code": "c", "codeVerifier": "v"}));
    }
}
