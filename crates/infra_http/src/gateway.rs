//! Payment gateway client
//!
//! `POST {base}/initiate` with `{"amount": <whole rupees>, "type": "<tag>"}`.
//! A successful answer carries the bank form to submit:
//!
//! ```json
//! {"success": true, "data": {"action_url": "https://bank/...", "fields": {"AuthToken": "..."}}}
//! ```

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument};

use core_kernel::{DomainPort, PortError};
use domain_checkout::{GatewayReply, GatewayRequest, PaymentGatewayPort, RedirectForm};

use crate::config::HttpServiceConfig;
use crate::error::ClientError;
use crate::transport::post_json;

const SERVICE: &str = "payment gateway";

#[derive(Debug, Deserialize)]
struct InitiateResponse {
    #[serde(default)]
    success: bool,
    message: Option<String>,
    data: Option<RedirectData>,
}

#[derive(Debug, Deserialize)]
struct RedirectData {
    #[serde(alias = "actionUrl", alias = "url")]
    action_url: String,
    #[serde(default)]
    fields: BTreeMap<String, Value>,
}

#[derive(Debug, Clone)]
pub struct GatewayClient {
    http: reqwest::Client,
    config: HttpServiceConfig,
}

impl GatewayClient {
    pub fn new(config: HttpServiceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.build_client()?,
            config,
        })
    }
}

impl DomainPort for GatewayClient {}

#[async_trait]
impl PaymentGatewayPort for GatewayClient {
    #[instrument(skip_all, fields(amount = request.amount, method = %request.method))]
    async fn request_redirect(&self, request: &GatewayRequest) -> Result<GatewayReply, PortError> {
        let response = post_json(&self.http, &self.config, SERVICE, "initiate", request).await?;
        let reply = parse_initiate(response.status, response.body.as_ref())
            .ok_or_else(|| response.into_error(SERVICE))?;

        if let GatewayReply::Redirect(form) = &reply {
            info!(action = %form.action_url, fields = form.fields.len(), "Gateway returned redirect form");
        }
        Ok(reply)
    }
}

/// Interprets a gateway body; `None` when it is not a gateway answer at all
fn parse_initiate(status: u16, body: Option<&Value>) -> Option<GatewayReply> {
    let parsed: InitiateResponse = serde_json::from_value(body?.clone()).ok()?;

    match parsed.data {
        Some(data) if parsed.success && (200..300).contains(&status) && !data.action_url.is_empty() => {
            let fields = data
                .fields
                .into_iter()
                .map(|(name, value)| {
                    let value = match value {
                        Value::String(s) => s,
                        Value::Null => String::new(),
                        other => other.to_string(),
                    };
                    (name, value)
                })
                .collect();
            Some(GatewayReply::Redirect(RedirectForm {
                action_url: data.action_url,
                fields,
            }))
        }
        _ => Some(GatewayReply::Rejected {
            message: parsed.message.filter(|m| !m.trim().is_empty()),
        }),
    }
}
