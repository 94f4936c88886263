//! Contact message and inquiry repository

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::DatabaseError;

/// Database row for `contact_messages`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct ContactMessageRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Database row for `inquiries`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct InquiryRow {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub reference: String,
    pub travelers: i32,
    pub message: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct EnquiryRepository {
    pool: PgPool,
}

impl EnquiryRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn insert_contact(&self, row: &ContactMessageRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO contact_messages (id, name, email, phone, subject, message, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.subject)
        .bind(&row.message)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_contacts(&self, limit: i64, offset: i64) -> Result<Vec<ContactMessageRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, ContactMessageRow>(
            r#"
            SELECT id, name, email, phone, subject, message, created_at
            FROM contact_messages
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn insert_inquiry(&self, row: &InquiryRow) -> Result<(), DatabaseError> {
        sqlx::query(
            r#"
            INSERT INTO inquiries (id, name, email, phone, reference, travelers, message, status, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.phone)
        .bind(&row.reference)
        .bind(row.travelers)
        .bind(&row.message)
        .bind(&row.status)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn list_inquiries(&self, limit: i64, offset: i64) -> Result<Vec<InquiryRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, InquiryRow>(
            r#"
            SELECT id, name, email, phone, reference, travelers, message, status, created_at
            FROM inquiries
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_inquiry_status(&self, id: Uuid, status: &str) -> Result<InquiryRow, DatabaseError> {
        sqlx::query_as::<_, InquiryRow>(
            r#"
            UPDATE inquiries SET status = $2, updated_at = now()
            WHERE id = $1
            RETURNING id, name, email, phone, reference, travelers, message, status, created_at
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("Inquiry", id))
    }
}
