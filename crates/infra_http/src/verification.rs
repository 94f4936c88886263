//! Payment verification client
//!
//! `POST {base}/verify` with `{"orderId": "..."}`. The backend asks the bank
//! for the order's status and answers `{"success": bool, "data": {...}}`.

use std::str::FromStr;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument};

use core_kernel::{DomainPort, Money, OrderId, PortError};
use domain_checkout::{PaymentVerificationPort, VerificationReply};

use crate::config::HttpServiceConfig;
use crate::error::ClientError;
use crate::transport::{find_str, post_json, success_flag};

const SERVICE: &str = "payment verification";

const TRANSACTION_ID_KEYS: &[&str] = &[
    "bank_transaction_id",
    "transaction_id",
    "transactionId",
    "TransactionId",
    "TransactionReferenceNumber",
];

const AMOUNT_KEYS: &[&str] = &["amount", "Amount", "TransactionAmount", "txnAmount"];

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyRequest<'a> {
    order_id: &'a str,
}

#[derive(Debug, Clone)]
pub struct PaymentVerificationClient {
    http: reqwest::Client,
    config: HttpServiceConfig,
}

impl PaymentVerificationClient {
    pub fn new(config: HttpServiceConfig) -> Result<Self, ClientError> {
        Ok(Self {
            http: config.build_client()?,
            config,
        })
    }
}

impl DomainPort for PaymentVerificationClient {}

#[async_trait]
impl PaymentVerificationPort for PaymentVerificationClient {
    #[instrument(skip_all, fields(order_id = %order_id))]
    async fn verify(&self, order_id: &OrderId) -> Result<VerificationReply, PortError> {
        let request = VerifyRequest {
            order_id: order_id.as_str(),
        };
        let response = post_json(&self.http, &self.config, SERVICE, "verify", &request).await?;

        let answered = match &response.body {
            Some(body) if response.is_success() => Some(parse_verify(body)),
            // An explicit `success: false` body is an answer, not a transport failure
            Some(body) if body.get("success").is_some() => Some(parse_verify(body)),
            _ => None,
        };
        let reply = answered.ok_or_else(|| response.into_error(SERVICE))?;

        info!(success = reply.success, "Payment verification answered");
        Ok(reply)
    }
}

fn parse_verify(body: &Value) -> VerificationReply {
    let success = success_flag(body);
    let raw = match body.get("data") {
        Some(data) if !data.is_null() => data.clone(),
        _ => body.clone(),
    };

    VerificationReply {
        success,
        bank_transaction_id: find_str(body, TRANSACTION_ID_KEYS),
        amount: find_str(body, AMOUNT_KEYS).and_then(|raw| parse_amount(&raw)),
        message: find_str(body, &["message", "ResponseDescription"]),
        raw,
    }
}

/// Banks echo amounts as `"15,000.00"` as often as `15000`
fn parse_amount(raw: &str) -> Option<Money> {
    let cleaned: String = raw.chars().filter(|c| *c != ',').collect();
    Decimal::from_str(cleaned.trim()).ok().map(Money::pkr)
}
