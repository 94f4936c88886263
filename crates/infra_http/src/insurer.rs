//! Insurer policy issuance client
//!
//! `POST {base}/policies` with the draft application as JSON. The answer is
//! kept whole as the issuer payload; the policy number and certificate URL
//! are read from the top level or from `data`.

use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

use core_kernel::{DomainPort, PortError};
use domain_checkout::{DraftPolicyApplication, IssuanceReply, PolicyIssuancePort};

use crate::config::HttpServiceConfig;
use crate::error::ClientError;
use crate::transport::{find_str, post_json, success_flag};

const SERVICE: &str = "insurer";

#[derive(Debug, Clone)]
pub struct InsurerClient {
    http: reqwest::Client,
    config: HttpServiceConfig,
}

impl InsurerClient {
    pub fn new(config: HttpServiceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.build_client()?,
            config,
        })
    }
}

impl DomainPort for InsurerClient {}

#[async_trait]
impl PolicyIssuancePort for InsurerClient {
    #[instrument(skip_all, fields(destination = %draft.trip.destination, plan = ?draft.plan))]
    async fn issue(&self, draft: &DraftPolicyApplication) -> Result<IssuanceReply, PortError> {
        let response = post_json(&self.http, &self.config, SERVICE, "policies", draft).await?;

        let answered = match &response.body {
            Some(body) if body.is_object() => {
                let mut reply = parse_issue(body);
                if !response.is_success() {
                    reply.success = false;
                }
                Some(reply)
            }
            Some(_) if response.is_success() => {
                return Err(ClientError::InvalidResponse {
                    service: SERVICE,
                    message: "expected a JSON object".to_string(),
                }
                .into())
            }
            _ => None,
        };
        let reply = answered.ok_or_else(|| response.into_error(SERVICE))?;

        match &reply.policy_number {
            Some(number) if reply.success => info!(policy_number = %number, "Policy issued"),
            _ => warn!(message = ?reply.message, "Insurer did not issue a policy"),
        }
        Ok(reply)
    }
}

fn parse_issue(body: &Value) -> IssuanceReply {
    IssuanceReply {
        success: success_flag(body),
        policy_number: find_str(body, &["policy_number", "policyNumber", "policy_no"]),
        certificate_url: find_str(body, &["certificate_url", "certificateUrl", "document_url", "pdf_url"]),
        message: find_str(body, &["message", "error"]),
        payload: body.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_issued_policy_top_level_fields() {
        let body = json!({
            "success": true,
            "policy_number": "TRV-2024-000123",
            "certificate_url": "https://insurer.example/c.pdf",
            "underwriter": "Example General"
        });

        let reply = parse_issue(&body);

        assert!(reply.success);
        assert_eq!(reply.policy_number.as_deref(), Some("TRV-2024-000123"));
        assert_eq!(reply.certificate_url.as_deref(), Some("https://insurer.example/c.pdf"));
        assert_eq!(reply.payload, body);
    }

    #[test]
    fn test_nested_camel_case_fields() {
        let body = json!({"success": true, "data": {"policyNumber": "P-9", "certificateUrl": "u"}});

        let reply = parse_issue(&body);

        assert_eq!(reply.policy_number.as_deref(), Some("P-9"));
        assert_eq!(reply.certificate_url.as_deref(), Some("u"));
    }

    #[test]
    fn test_declined() {
        let reply = parse_issue(&json!({"success": false, "message": "Destination not covered"}));
        assert!(!reply.success);
        assert_eq!(reply.message.as_deref(), Some("Destination not covered"));
    }
}
