//! In-memory port implementations
//!
//! Every mock records how often it was called so tests can assert that a
//! later pipeline step never ran.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use core_kernel::{DomainPort, InquiryId, OrderId, PortError};
use domain_checkout::{
    ContactMessage, DraftPolicyApplication, EnquiryStore, GatewayReply, GatewayRequest, Inquiry,
    InquiryStatus, IssuanceReply, Page, PaymentGatewayPort, PaymentVerificationPort,
    PolicyIssuancePort, PolicyRecord, PolicyRecordStore, PolicyStatus, VerificationReply,
};

/// Canned behaviour for a mocked external call
#[derive(Debug, Clone)]
pub enum MockBehaviour<T> {
    Reply(T),
    /// Simulates a connection failure
    Unreachable,
}

fn unreachable_error(service: &str) -> PortError {
    PortError::connection(format!("{service} unreachable"))
}

/// Payment gateway mock
pub struct MockGateway {
    behaviour: Mutex<MockBehaviour<GatewayReply>>,
    requests: Mutex<Vec<GatewayRequest>>,
}

impl MockGateway {
    pub fn replying(reply: GatewayReply) -> Self {
        Self {
            behaviour: Mutex::new(MockBehaviour::Reply(reply)),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            behaviour: Mutex::new(MockBehaviour::Unreachable),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<GatewayRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl DomainPort for MockGateway {}

#[async_trait]
impl PaymentGatewayPort for MockGateway {
    async fn request_redirect(&self, request: &GatewayRequest) -> Result<GatewayReply, PortError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.behaviour.lock().unwrap().clone() {
            MockBehaviour::Reply(reply) => Ok(reply),
            MockBehaviour::Unreachable => Err(unreachable_error("gateway")),
        }
    }
}

/// Payment verification mock
pub struct MockVerifier {
    behaviour: MockBehaviour<VerificationReply>,
    orders: Mutex<Vec<OrderId>>,
}

impl MockVerifier {
    pub fn replying(reply: VerificationReply) -> Self {
        Self {
            behaviour: MockBehaviour::Reply(reply),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            behaviour: MockBehaviour::Unreachable,
            orders: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.orders.lock().unwrap().len()
    }

    pub fn orders(&self) -> Vec<OrderId> {
        self.orders.lock().unwrap().clone()
    }
}

impl DomainPort for MockVerifier {}

#[async_trait]
impl PaymentVerificationPort for MockVerifier {
    async fn verify(&self, order_id: &OrderId) -> Result<VerificationReply, PortError> {
        self.orders.lock().unwrap().push(order_id.clone());
        match &self.behaviour {
            MockBehaviour::Reply(reply) => Ok(reply.clone()),
            MockBehaviour::Unreachable => Err(unreachable_error("verifier")),
        }
    }
}

/// Insurer mock
pub struct MockIssuer {
    behaviour: MockBehaviour<IssuanceReply>,
    drafts: Mutex<Vec<DraftPolicyApplication>>,
}

impl MockIssuer {
    pub fn replying(reply: IssuanceReply) -> Self {
        Self {
            behaviour: MockBehaviour::Reply(reply),
            drafts: Mutex::new(Vec::new()),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            behaviour: MockBehaviour::Unreachable,
            drafts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.drafts.lock().unwrap().len()
    }

    /// Drafts sent for issuance, in order
    pub fn drafts(&self) -> Vec<DraftPolicyApplication> {
        self.drafts.lock().unwrap().clone()
    }
}

impl DomainPort for MockIssuer {}

#[async_trait]
impl PolicyIssuancePort for MockIssuer {
    async fn issue(&self, draft: &DraftPolicyApplication) -> Result<IssuanceReply, PortError> {
        self.drafts.lock().unwrap().push(draft.clone());
        match &self.behaviour {
            MockBehaviour::Reply(reply) => Ok(reply.clone()),
            MockBehaviour::Unreachable => Err(unreachable_error("insurer")),
        }
    }
}

/// Policy record store with a switch to make writes fail
#[derive(Default)]
pub struct InMemoryPolicyRecordStore {
    records: Mutex<Vec<PolicyRecord>>,
    fail_writes: AtomicBool,
    insert_calls: AtomicUsize,
}

impl InMemoryPolicyRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose inserts fail until [`set_fail_writes(false)`](Self::set_fail_writes)
    pub fn failing() -> Self {
        let store = Self::default();
        store.set_fail_writes(true);
        store
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn records(&self) -> Vec<PolicyRecord> {
        self.records.lock().unwrap().clone()
    }

    pub fn insert_calls(&self) -> usize {
        self.insert_calls.load(Ordering::SeqCst)
    }
}

impl DomainPort for InMemoryPolicyRecordStore {}

#[async_trait]
impl PolicyRecordStore for InMemoryPolicyRecordStore {
    async fn insert_if_absent(&self, record: &PolicyRecord) -> Result<bool, PortError> {
        self.insert_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(PortError::connection("document store unavailable"));
        }
        let mut records = self.records.lock().unwrap();
        if records.iter().any(|r| r.order_id == record.order_id) {
            return Ok(false);
        }
        records.push(record.clone());
        Ok(true)
    }

    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<PolicyRecord>, PortError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .iter()
            .find(|r| &r.order_id == order_id)
            .cloned())
    }

    async fn list(&self, page: Page) -> Result<Vec<PolicyRecord>, PortError> {
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records
            .into_iter()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn update_status(&self, order_id: &OrderId, status: PolicyStatus) -> Result<PolicyRecord, PortError> {
        let mut records = self.records.lock().unwrap();
        let record = records
            .iter_mut()
            .find(|r| &r.order_id == order_id)
            .ok_or_else(|| PortError::not_found("PolicyRecord", order_id))?;
        record.status = status;
        Ok(record.clone())
    }
}

#[derive(Default)]
pub struct InMemoryEnquiryStore {
    contacts: Mutex<Vec<ContactMessage>>,
    inquiries: Mutex<Vec<Inquiry>>,
}

impl InMemoryEnquiryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contacts(&self) -> Vec<ContactMessage> {
        self.contacts.lock().unwrap().clone()
    }

    pub fn inquiries(&self) -> Vec<Inquiry> {
        self.inquiries.lock().unwrap().clone()
    }
}

impl DomainPort for InMemoryEnquiryStore {}

#[async_trait]
impl EnquiryStore for InMemoryEnquiryStore {
    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), PortError> {
        self.contacts.lock().unwrap().push(message.clone());
        Ok(())
    }

    async fn list_contacts(&self, page: Page) -> Result<Vec<ContactMessage>, PortError> {
        Ok(self
            .contacts()
            .into_iter()
            .rev()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<(), PortError> {
        self.inquiries.lock().unwrap().push(inquiry.clone());
        Ok(())
    }

    async fn list_inquiries(&self, page: Page) -> Result<Vec<Inquiry>, PortError> {
        Ok(self
            .inquiries()
            .into_iter()
            .rev()
            .skip(page.offset as usize)
            .take(page.limit as usize)
            .collect())
    }

    async fn update_inquiry_status(&self, id: InquiryId, status: InquiryStatus) -> Result<Inquiry, PortError> {
        let mut inquiries = self.inquiries.lock().unwrap();
        let inquiry = inquiries
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or_else(|| PortError::not_found("Inquiry", id))?;
        inquiry.status = status;
        Ok(inquiry.clone())
    }
}
