//! Back-office DTOs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use domain_checkout::{InquiryStatus, Page, PolicyRecord, PolicyStatus, TransactionRecord};

#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl From<PageQuery> for Page {
    fn from(query: PageQuery) -> Self {
        let default = Page::default();
        Page::new(
            query.limit.unwrap_or(default.limit),
            query.offset.unwrap_or(default.offset),
        )
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub items: Vec<T>,
    pub limit: u32,
    pub offset: u32,
}

impl<T> ListResponse<T> {
    pub fn new(items: Vec<T>, page: Page) -> Self {
        Self {
            items,
            limit: page.limit,
            offset: page.offset,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdatePolicyStatusRequest {
    pub status: PolicyStatus,
}

#[derive(Debug, Deserialize)]
pub struct UpdateInquiryStatusRequest {
    pub status: InquiryStatus,
}

#[derive(Debug, Serialize)]
pub struct PolicyRecordResponse {
    pub id: Uuid,
    pub order_id: String,
    pub policy_number: String,
    pub certificate_url: Option<String>,
    pub premium: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub currency: String,
    pub traveler_name: String,
    pub cnic: String,
    pub email: String,
    pub bank_transaction_id: Option<String>,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
    /// Only on the single-record view
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_payload: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction: Option<TransactionRecord>,
}

impl PolicyRecordResponse {
    pub fn summary(record: PolicyRecord) -> Self {
        Self {
            id: *record.id.as_uuid(),
            order_id: record.order_id.to_string(),
            policy_number: record.policy_number,
            certificate_url: record.certificate_url,
            premium: record.breakdown.premium.amount(),
            tax: record.breakdown.tax.amount(),
            total: record.breakdown.total.amount(),
            currency: record.breakdown.total.currency().code().to_string(),
            traveler_name: record.traveler_name,
            cnic: record.cnic,
            email: record.email,
            bank_transaction_id: record.bank_transaction_id,
            status: record.status,
            created_at: record.created_at,
            issuer_payload: None,
            transaction: None,
        }
    }

    pub fn detailed(record: PolicyRecord) -> Self {
        let issuer_payload = record.issuer_payload.clone();
        let transaction = record.transaction.clone();
        Self {
            issuer_payload: Some(issuer_payload),
            transaction: Some(transaction),
            ..Self::summary(record)
        }
    }
}
