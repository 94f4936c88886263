//! Contact messages and package/visa inquiries
//!
//! Both are simple append-only submissions from the public site. The back
//! office can only change an inquiry's status.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use core_kernel::{ContactMessageId, InquiryId};

use crate::error::CheckoutError;
use crate::ports::{EnquiryStore, Page};

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewContactMessage {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone: Option<String>,
    #[validate(length(min = 1, max = 150))]
    pub subject: String,
    #[validate(length(min = 1, max = 5000))]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InquiryStatus {
    #[default]
    New,
    Contacted,
    Closed,
}

impl InquiryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InquiryStatus::New => "new",
            InquiryStatus::Contacted => "contacted",
            InquiryStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "new" => Some(InquiryStatus::New),
            "contacted" => Some(InquiryStatus::Contacted),
            "closed" => Some(InquiryStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct NewInquiry {
    #[validate(length(min = 2, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 7, max = 20))]
    pub phone: String,
    /// Package or visa the inquiry is about, e.g. `visa:schengen`
    #[validate(length(min = 1, max = 100))]
    pub reference: String,
    #[validate(range(min = 1, max = 50))]
    pub travelers: u32,
    #[validate(length(max = 5000))]
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inquiry {
    pub id: InquiryId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub reference: String,
    pub travelers: u32,
    pub message: Option<String>,
    pub status: InquiryStatus,
    pub created_at: DateTime<Utc>,
}

/// Accepts public submissions and serves the back-office listings
#[derive(Clone)]
pub struct EnquiryService {
    store: Arc<dyn EnquiryStore>,
}

impl EnquiryService {
    pub fn new(store: Arc<dyn EnquiryStore>) -> Self {
        Self { store }
    }

    pub async fn submit_contact(&self, request: NewContactMessage) -> Result<ContactMessage, CheckoutError> {
        request
            .validate()
            .map_err(|e| CheckoutError::InvalidSubmission(e.to_string()))?;

        let message = ContactMessage {
            id: ContactMessageId::new_v7(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone.filter(|p| !p.trim().is_empty()),
            subject: request.subject,
            message: request.message,
            created_at: Utc::now(),
        };
        self.store.insert_contact(&message).await?;

        info!(id = %message.id, "Contact message received");
        Ok(message)
    }

    pub async fn submit_inquiry(&self, request: NewInquiry) -> Result<Inquiry, CheckoutError> {
        request
            .validate()
            .map_err(|e| CheckoutError::InvalidSubmission(e.to_string()))?;

        let inquiry = Inquiry {
            id: InquiryId::new_v7(),
            name: request.name.trim().to_string(),
            email: request.email.trim().to_string(),
            phone: request.phone,
            reference: request.reference,
            travelers: request.travelers,
            message: request.message,
            status: InquiryStatus::New,
            created_at: Utc::now(),
        };
        self.store.insert_inquiry(&inquiry).await?;

        info!(id = %inquiry.id, reference = %inquiry.reference, "Inquiry received");
        Ok(inquiry)
    }

    pub async fn contacts(&self, page: Page) -> Result<Vec<ContactMessage>, CheckoutError> {
        Ok(self.store.list_contacts(page).await?)
    }

    pub async fn inquiries(&self, page: Page) -> Result<Vec<Inquiry>, CheckoutError> {
        Ok(self.store.list_inquiries(page).await?)
    }

    pub async fn set_inquiry_status(&self, id: InquiryId, status: InquiryStatus) -> Result<Inquiry, CheckoutError> {
        let inquiry = self.store.update_inquiry_status(id, status).await.map_err(|e| {
            if e.is_not_found() {
                CheckoutError::RecordNotFound(id.to_string())
            } else {
                CheckoutError::Port(e)
            }
        })?;
        info!(id = %id, status = status.as_str(), "Inquiry status updated");
        Ok(inquiry)
    }
}
