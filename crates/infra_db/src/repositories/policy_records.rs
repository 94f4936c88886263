//! Policy record repository
//!
//! One row per bank order id. Payloads from the insurer and the bank are kept
//! as JSONB exactly as received.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DatabaseError;

const COLUMNS: &str = r#"
    id, order_id, policy_number, certificate_url,
    premium, tax, total, tax_rate, currency,
    traveler_name, cnic, email, bank_transaction_id,
    issuer_payload, transaction, status, created_at
"#;

/// Database row for `policy_records`
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct PolicyRecordRow {
    pub id: Uuid,
    pub order_id: String,
    pub policy_number: String,
    pub certificate_url: Option<String>,
    pub premium: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
    pub tax_rate: Decimal,
    pub currency: String,
    pub traveler_name: String,
    pub cnic: String,
    pub email: String,
    pub bank_transaction_id: Option<String>,
    pub issuer_payload: Value,
    pub transaction: Value,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PolicyRecordRepository {
    pool: PgPool,
}

impl PolicyRecordRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Inserts the row unless `order_id` is already present
    ///
    /// Returns `true` when this call wrote the row.
    pub async fn insert_if_absent(&self, row: &PolicyRecordRow) -> Result<bool, DatabaseError> {
        let result = sqlx::query(
            r#"
            INSERT INTO policy_records (
                id, order_id, policy_number, certificate_url,
                premium, tax, total, tax_rate, currency,
                traveler_name, cnic, email, bank_transaction_id,
                issuer_payload, transaction, status, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (order_id) DO NOTHING
            "#,
        )
        .bind(row.id)
        .bind(&row.order_id)
        .bind(&row.policy_number)
        .bind(&row.certificate_url)
        .bind(row.premium)
        .bind(row.tax)
        .bind(row.total)
        .bind(row.tax_rate)
        .bind(&row.currency)
        .bind(&row.traveler_name)
        .bind(&row.cnic)
        .bind(&row.email)
        .bind(&row.bank_transaction_id)
        .bind(&row.issuer_payload)
        .bind(&row.transaction)
        .bind(&row.status)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        let inserted = result.rows_affected() == 1;
        debug!(order_id = %row.order_id, inserted, "policy_records insert");
        Ok(inserted)
    }

    pub async fn find_by_order(&self, order_id: &str) -> Result<Option<PolicyRecordRow>, DatabaseError> {
        let row = sqlx::query_as::<_, PolicyRecordRow>(&format!(
            "SELECT {COLUMNS} FROM policy_records WHERE order_id = $1"
        ))
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    /// Newest first
    pub async fn list(&self, limit: i64, offset: i64) -> Result<Vec<PolicyRecordRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, PolicyRecordRow>(&format!(
            "SELECT {COLUMNS} FROM policy_records ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn update_status(&self, order_id: &str, status: &str) -> Result<PolicyRecordRow, DatabaseError> {
        sqlx::query_as::<_, PolicyRecordRow>(&format!(
            "UPDATE policy_records SET status = $2, updated_at = now() WHERE order_id = $1 RETURNING {COLUMNS}"
        ))
        .bind(order_id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| DatabaseError::not_found("PolicyRecord", order_id))
    }
}
