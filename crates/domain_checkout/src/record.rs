//! Records produced by the external systems and persisted by the service

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{Money, OrderId, PolicyRecordId};

use crate::pricing::PremiumBreakdown;

/// The bank's view of one payment, as returned by the verification endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub order_id: OrderId,
    /// Status echoed on the return URL (`TS`)
    pub transaction_status: Option<String>,
    /// Response code echoed on the return URL (`RC`)
    pub response_code: Option<String>,
    /// Bank-assigned transaction reference, when the verifier supplies one
    pub bank_transaction_id: Option<String>,
    /// Amount the bank charged, when the verifier reports it
    pub amount: Option<Money>,
    pub verified_at: DateTime<Utc>,
    /// Every field the verifier returned, untouched
    pub raw: Value,
}

/// A policy confirmed by the insurer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssuedPolicy {
    pub policy_number: String,
    pub certificate_url: Option<String>,
    /// Full insurer response, stored verbatim
    pub payload: Value,
}

/// Back-office review state of a persisted policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyStatus {
    #[default]
    PendingReview,
    Approved,
    Rejected,
    Cancelled,
}

impl PolicyStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PolicyStatus::PendingReview => "pending_review",
            PolicyStatus::Approved => "approved",
            PolicyStatus::Rejected => "rejected",
            PolicyStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pending_review" => Some(PolicyStatus::PendingReview),
            "approved" => Some(PolicyStatus::Approved),
            "rejected" => Some(PolicyStatus::Rejected),
            "cancelled" => Some(PolicyStatus::Cancelled),
            _ => None,
        }
    }

    /// Allowed admin transitions
    ///
    /// ```text
    /// PendingReview -> Approved -> Cancelled
    ///               \-> Rejected
    /// ```
    pub fn can_transition_to(&self, next: PolicyStatus) -> bool {
        matches!(
            (self, next),
            (PolicyStatus::PendingReview, PolicyStatus::Approved)
                | (PolicyStatus::PendingReview, PolicyStatus::Rejected)
                | (PolicyStatus::Approved, PolicyStatus::Cancelled)
        )
    }
}

/// The combined payment + policy + customer record kept in the store
///
/// At most one exists per order id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolicyRecord {
    pub id: PolicyRecordId,
    pub order_id: OrderId,
    pub policy_number: String,
    pub certificate_url: Option<String>,
    pub breakdown: PremiumBreakdown,
    pub traveler_name: String,
    pub cnic: String,
    pub email: String,
    pub bank_transaction_id: Option<String>,
    pub issuer_payload: Value,
    pub transaction: TransactionRecord,
    pub status: PolicyStatus,
    pub created_at: DateTime<Utc>,
}
