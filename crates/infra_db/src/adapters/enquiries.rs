//! PostgreSQL contact message and inquiry store

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::instrument;

use core_kernel::{ContactMessageId, DomainPort, HealthCheckResult, HealthCheckable, InquiryId, PortError};
use domain_checkout::{ContactMessage, EnquiryStore, Inquiry, InquiryStatus, Page};

use crate::adapters::policy_records::ping;
use crate::error::DatabaseError;
use crate::repositories::{ContactMessageRow, EnquiryRepository, InquiryRow};

#[derive(Debug, Clone)]
pub struct PostgresEnquiryStore {
    repository: EnquiryRepository,
    pool: PgPool,
}

impl PostgresEnquiryStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: EnquiryRepository::new(pool.clone()),
            pool,
        }
    }
}

impl DomainPort for PostgresEnquiryStore {}

#[async_trait]
impl HealthCheckable for PostgresEnquiryStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-enquiries").await
    }
}

#[async_trait]
impl EnquiryStore for PostgresEnquiryStore {
    #[instrument(skip_all, fields(id = %message.id))]
    async fn insert_contact(&self, message: &ContactMessage) -> Result<(), PortError> {
        let row = ContactMessageRow {
            id: *message.id.as_uuid(),
            name: message.name.clone(),
            email: message.email.clone(),
            phone: message.phone.clone(),
            subject: message.subject.clone(),
            message: message.message.clone(),
            created_at: message.created_at,
        };
        Ok(self.repository.insert_contact(&row).await?)
    }

    async fn list_contacts(&self, page: Page) -> Result<Vec<ContactMessage>, PortError> {
        let rows = self
            .repository
            .list_contacts(i64::from(page.limit), i64::from(page.offset))
            .await?;
        Ok(rows.into_iter().map(row_to_contact).collect())
    }

    #[instrument(skip_all, fields(id = %inquiry.id))]
    async fn insert_inquiry(&self, inquiry: &Inquiry) -> Result<(), PortError> {
        let row = InquiryRow {
            id: *inquiry.id.as_uuid(),
            name: inquiry.name.clone(),
            email: inquiry.email.clone(),
            phone: inquiry.phone.clone(),
            reference: inquiry.reference.clone(),
            travelers: i32::try_from(inquiry.travelers)
                .map_err(|_| PortError::validation("traveler count out of range"))?,
            message: inquiry.message.clone(),
            status: inquiry.status.as_str().to_string(),
            created_at: inquiry.created_at,
        };
        Ok(self.repository.insert_inquiry(&row).await?)
    }

    async fn list_inquiries(&self, page: Page) -> Result<Vec<Inquiry>, PortError> {
        self.repository
            .list_inquiries(i64::from(page.limit), i64::from(page.offset))
            .await?
            .into_iter()
            .map(row_to_inquiry)
            .collect()
    }

    #[instrument(skip_all, fields(id = %id, status = status.as_str()))]
    async fn update_inquiry_status(&self, id: InquiryId, status: InquiryStatus) -> Result<Inquiry, PortError> {
        let row = self
            .repository
            .update_inquiry_status(*id.as_uuid(), status.as_str())
            .await?;
        row_to_inquiry(row)
    }
}

fn row_to_contact(row: ContactMessageRow) -> ContactMessage {
    ContactMessage {
        id: ContactMessageId::from_uuid(row.id),
        name: row.name,
        email: row.email,
        phone: row.phone,
        subject: row.subject,
        message: row.message,
        created_at: row.created_at,
    }
}

fn row_to_inquiry(row: InquiryRow) -> Result<Inquiry, PortError> {
    let status = InquiryStatus::parse(&row.status).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown inquiry status '{}'", row.status))
    })?;
    let travelers = u32::try_from(row.travelers)
        .map_err(|_| DatabaseError::SerializationError(format!("negative traveler count {}", row.travelers)))?;

    Ok(Inquiry {
        id: InquiryId::from_uuid(row.id),
        name: row.name,
        email: row.email,
        phone: row.phone,
        reference: row.reference,
        travelers,
        message: row.message,
        status,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn inquiry_row(status: &str, travelers: i32) -> InquiryRow {
        InquiryRow {
            id: Uuid::now_v7(),
            name: "Bilal Ahmed".to_string(),
            email: "bilal@example.com".to_string(),
            phone: "03211234567".to_string(),
            reference: "visa:schengen".to_string(),
            travelers,
            message: None,
            status: status.to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_inquiry_row_conversion() {
        let inquiry = row_to_inquiry(inquiry_row("contacted", 2)).unwrap();
        assert_eq!(inquiry.status, InquiryStatus::Contacted);
        assert_eq!(inquiry.travelers, 2);
    }

    #[test]
    fn test_bad_inquiry_rows_are_rejected() {
        assert!(row_to_inquiry(inquiry_row("archived", 2)).is_err());
        assert!(row_to_inquiry(inquiry_row("new", -1)).is_err());
    }
}
