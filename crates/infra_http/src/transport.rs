//! Shared JSON POST helper

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::HttpServiceConfig;
use crate::error::ClientError;

/// Status code and body of a completed exchange
pub(crate) struct JsonResponse {
    pub status: u16,
    /// `None` when the body is not JSON
    pub body: Option<Value>,
    pub text: String,
}

impl JsonResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Converts a non-JSON or failed response into an error
    pub fn into_error(self, service: &'static str) -> ClientError {
        ClientError::Api {
            service,
            status: self.status,
            body: self.text,
        }
    }
}

pub(crate) async fn post_json<B: Serialize + ?Sized>(
    client: &reqwest::Client,
    config: &HttpServiceConfig,
    service: &'static str,
    path: &str,
    body: &B,
) -> Result<JsonResponse, ClientError> {
    let url = config.endpoint(path);
    debug!(service, url = %url, "POST");

    let mut request = client.post(&url).json(body);
    if let Some(key) = &config.api_key {
        request = request.header("x-api-key", key);
    }

    let response = request
        .send()
        .await
        .map_err(|e| request_error(e, service, config))?;
    let status = response.status().as_u16();
    let text = response
        .text()
        .await
        .map_err(|e| request_error(e, service, config))?;
    let body = serde_json::from_str::<Value>(&text).ok();

    if !(200..300).contains(&status) {
        warn!(service, status, "Non-success response");
    }

    Ok(JsonResponse { status, body, text })
}

fn request_error(error: reqwest::Error, service: &'static str, config: &HttpServiceConfig) -> ClientError {
    if error.is_timeout() {
        warn!(service, timeout_ms = config.timeout.as_millis() as u64, "Request timed out");
        ClientError::Timeout {
            service,
            timeout_ms: config.timeout.as_millis() as u64,
        }
    } else {
        ClientError::Http(error)
    }
}

/// First string found under any of `keys`, looking at the top level and
/// then inside `data`
pub(crate) fn find_str(body: &Value, keys: &[&str]) -> Option<String> {
    let scopes = [Some(body), body.get("data")];
    for scope in scopes.into_iter().flatten() {
        for key in keys {
            match scope.get(*key) {
                Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.clone()),
                Some(Value::Number(n)) => return Some(n.to_string()),
                _ => {}
            }
        }
    }
    None
}

pub(crate) fn success_flag(body: &Value) -> bool {
    match body.get("success") {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_find_str_looks_inside_data() {
        let body = json!({"success": true, "data": {"policyNumber": "TRV-1"}});
        assert_eq!(find_str(&body, &["policy_number", "policyNumber"]), Some("TRV-1".to_string()));
        assert_eq!(find_str(&body, &["missing"]), None);
    }

    #[test]
    fn test_find_str_accepts_numbers() {
        let body = json!({"TransactionId": 778899});
        assert_eq!(find_str(&body, &["TransactionId"]), Some("778899".to_string()));
    }

    #[test]
    fn test_success_flag() {
        assert!(success_flag(&json!({"success": true})));
        assert!(success_flag(&json!({"success": "TRUE"})));
        assert!(!success_flag(&json!({"success": false})));
        assert!(!success_flag(&json!({})));
    }
}
