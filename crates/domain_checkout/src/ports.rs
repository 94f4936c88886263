//! Checkout Domain Ports
//!
//! The checkout flow talks to three external HTTP services and one document
//! store. Each is a trait here so the flow can run against the real adapters
//! (`infra_http`, `infra_db`) or in-memory mocks.
//!
//! ```rust,ignore
//! let handler = ReturnHandler::new(
//!     Arc::new(PaymentVerificationClient::new(verify_config)?),
//!     Arc::new(InsurerClient::new(insurer_config)?),
//!     PolicyFinalizer::new(Arc::new(PostgresPolicyRecordStore::new(pool))),
//!     transient_store,
//!     tax_rate,
//! );
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use core_kernel::{DomainPort, InquiryId, Money, OrderId, PortError, SessionId};

use crate::draft::DraftPolicyApplication;
use crate::enquiry::{ContactMessage, Inquiry, InquiryStatus};
use crate::record::{PolicyRecord, PolicyStatus};

/// Payment method tag understood by the gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[serde(rename = "1")]
    Wallet,
    #[serde(rename = "2")]
    BankAccount,
    #[serde(rename = "3")]
    Card,
}

impl PaymentMethod {
    pub fn tag(&self) -> &'static str {
        match self {
            PaymentMethod::Wallet => "1",
            PaymentMethod::BankAccount => "2",
            PaymentMethod::Card => "3",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" => Ok(PaymentMethod::Wallet),
            "2" => Ok(PaymentMethod::BankAccount),
            "3" => Ok(PaymentMethod::Card),
            other => Err(format!("unknown payment method tag: {other}")),
        }
    }
}

/// Body sent to the gateway to obtain a bank redirect form
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRequest {
    /// Whole rupees
    pub amount: u64,
    #[serde(rename = "type")]
    pub method: PaymentMethod,
}

/// The form the browser must POST to reach the bank
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectForm {
    pub action_url: String,
    pub fields: BTreeMap<String, String>,
}

/// What the gateway said about a redirect request
#[derive(Debug, Clone, PartialEq)]
pub enum GatewayReply {
    Redirect(RedirectForm),
    /// Gateway answered but declined; `message` is shown to the traveler
    Rejected { message: Option<String> },
}

#[async_trait]
pub trait PaymentGatewayPort: DomainPort {
    async fn request_redirect(&self, request: &GatewayRequest) -> Result<GatewayReply, PortError>;
}

/// Outcome of asking the backend whether an order was paid
#[derive(Debug, Clone, PartialEq)]
pub struct VerificationReply {
    pub success: bool,
    pub bank_transaction_id: Option<String>,
    /// Amount the bank charged, when the backend reports it
    pub amount: Option<Money>,
    pub message: Option<String>,
    /// Raw transaction status fields
    pub raw: Value,
}

#[async_trait]
pub trait PaymentVerificationPort: DomainPort {
    async fn verify(&self, order_id: &OrderId) -> Result<VerificationReply, PortError>;
}

/// Insurer's answer to an issuance request
#[derive(Debug, Clone, PartialEq)]
pub struct IssuanceReply {
    pub success: bool,
    pub policy_number: Option<String>,
    pub certificate_url: Option<String>,
    pub message: Option<String>,
    /// Entire response body, stored unmodified
    pub payload: Value,
}

#[async_trait]
pub trait PolicyIssuancePort: DomainPort {
    async fn issue(&self, draft: &DraftPolicyApplication) -> Result<IssuanceReply, PortError>;
}

/// Pagination for back-office listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub const MAX_LIMIT: u32 = 200;

    pub fn new(limit: u32, offset: u32) -> Self {
        Self {
            limit: limit.clamp(1, Self::MAX_LIMIT),
            offset,
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::new(50, 0)
    }
}

/// Append-mostly store of issued policy records
#[async_trait]
pub trait PolicyRecordStore: DomainPort {
    /// Inserts the record unless one already exists for its order id
    ///
    /// Returns `true` when a row was written.
    async fn insert_if_absent(&self, record: &PolicyRecord) -> Result<bool, PortError>;

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<PolicyRecord>, PortError>;

    /// Newest first
    async fn list(&self, page: Page) -> Result<Vec<PolicyRecord>, PortError>;

    async fn update_status(&self, order_id: &OrderId, status: PolicyStatus) -> Result<PolicyRecord, PortError>;
}

/// Store for contact messages and package/visa inquiries
#[async_trait]
pub trait EnquiryStore: DomainPort {
    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), PortError>;

    async fn list_contacts(&self, page: Page) -> Result<Vec<ContactMessage>, PortError>;

    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<(), PortError>;

    async fn list_inquiries(&self, page: Page) -> Result<Vec<Inquiry>, PortError>;

    async fn update_inquiry_status(&self, id: InquiryId, status: InquiryStatus) -> Result<Inquiry, PortError>;
}

/// Session-scoped key/value storage for data that must not outlive the purchase
///
/// Writes are last-writer-wins per key.
#[async_trait]
pub trait TransientStore: DomainPort {
    async fn put(&self, session: SessionId, key: &str, value: Value);

    async fn get(&self, session: SessionId, key: &str) -> Option<Value>;

    async fn remove(&self, session: SessionId, key: &str) -> Option<Value>;

    /// Keys currently held for the session
    async fn keys(&self, session: SessionId) -> Vec<String>;
}
