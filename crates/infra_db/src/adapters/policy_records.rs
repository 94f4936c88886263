//! PostgreSQL policy record store
//!
//! Implements `PolicyRecordStore` on top of [`PolicyRecordRepository`] and
//! converts between `PolicyRecord` and its row.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use tracing::{debug, instrument};

use core_kernel::{
    AdapterHealth, Currency, DomainPort, HealthCheckResult, HealthCheckable, Money, OrderId,
    PolicyRecordId, PortError, Rate,
};
use domain_checkout::{Page, PolicyRecord, PolicyRecordStore, PolicyStatus, PremiumBreakdown};

use crate::error::DatabaseError;
use crate::repositories::{PolicyRecordRepository, PolicyRecordRow};

#[derive(Debug, Clone)]
pub struct PostgresPolicyRecordStore {
    repository: PolicyRecordRepository,
    pool: PgPool,
}

impl PostgresPolicyRecordStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repository: PolicyRecordRepository::new(pool.clone()),
            pool,
        }
    }

    pub fn repository(&self) -> &PolicyRecordRepository {
        &self.repository
    }
}

impl DomainPort for PostgresPolicyRecordStore {}

#[async_trait]
impl HealthCheckable for PostgresPolicyRecordStore {
    async fn health_check(&self) -> HealthCheckResult {
        ping(&self.pool, "postgres-policy-records").await
    }
}

/// Runs `SELECT 1` and reports the latency
pub(crate) async fn ping(pool: &PgPool, adapter_id: &str) -> HealthCheckResult {
    let start = std::time::Instant::now();
    let result = sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (status, message) = match result {
        Ok(_) => (AdapterHealth::Healthy, None),
        Err(e) => (AdapterHealth::Unhealthy, Some(format!("Database error: {}", e))),
    };

    HealthCheckResult {
        adapter_id: adapter_id.to_string(),
        status,
        latency_ms,
        message,
        checked_at: Utc::now(),
    }
}

#[async_trait]
impl PolicyRecordStore for PostgresPolicyRecordStore {
    #[instrument(skip_all, fields(order_id = %record.order_id))]
    async fn insert_if_absent(&self, record: &PolicyRecord) -> Result<bool, PortError> {
        let row = record_to_row(record)?;
        Ok(self.repository.insert_if_absent(&row).await?)
    }

    #[instrument(skip_all, fields(order_id = %order_id))]
    async fn find_by_order(&self, order_id: &OrderId) -> Result<Option<PolicyRecord>, PortError> {
        debug!("Fetching policy record");
        self.repository
            .find_by_order(order_id.as_str())
            .await?
            .map(row_to_record)
            .transpose()
    }

    async fn list(&self, page: Page) -> Result<Vec<PolicyRecord>, PortError> {
        self.repository
            .list(i64::from(page.limit), i64::from(page.offset))
            .await?
            .into_iter()
            .map(row_to_record)
            .collect()
    }

    #[instrument(skip_all, fields(order_id = %order_id, status = status.as_str()))]
    async fn update_status(&self, order_id: &OrderId, status: PolicyStatus) -> Result<PolicyRecord, PortError> {
        let row = self
            .repository
            .update_status(order_id.as_str(), status.as_str())
            .await?;
        row_to_record(row)
    }
}

pub(crate) fn record_to_row(record: &PolicyRecord) -> Result<PolicyRecordRow, PortError> {
    let breakdown = &record.breakdown;
    let transaction = serde_json::to_value(&record.transaction)
        .map_err(|e| DatabaseError::SerializationError(format!("transaction: {e}")))?;
    Ok(PolicyRecordRow {
        id: *record.id.as_uuid(),
        order_id: record.order_id.as_str().to_string(),
        policy_number: record.policy_number.clone(),
        certificate_url: record.certificate_url.clone(),
        premium: breakdown.premium.amount(),
        tax: breakdown.tax.amount(),
        total: breakdown.total.amount(),
        tax_rate: breakdown.tax_rate.as_decimal(),
        currency: breakdown.total.currency().code().to_string(),
        traveler_name: record.traveler_name.clone(),
        cnic: record.cnic.clone(),
        email: record.email.clone(),
        bank_transaction_id: record.bank_transaction_id.clone(),
        issuer_payload: record.issuer_payload.clone(),
        transaction,
        status: record.status.as_str().to_string(),
        created_at: record.created_at,
    })
}

pub(crate) fn row_to_record(row: PolicyRecordRow) -> Result<PolicyRecord, PortError> {
    let currency = Currency::from_str(&row.currency)
        .map_err(|e| DatabaseError::SerializationError(e.to_string()))?;
    let status = PolicyStatus::parse(&row.status).ok_or_else(|| {
        DatabaseError::SerializationError(format!("unknown policy status '{}'", row.status))
    })?;
    let order_id = OrderId::parse(&row.order_id)
        .ok_or_else(|| DatabaseError::SerializationError("blank order_id".to_string()))?;
    let transaction = serde_json::from_value(row.transaction)
        .map_err(|e| DatabaseError::SerializationError(format!("transaction: {e}")))?;

    Ok(PolicyRecord {
        id: PolicyRecordId::from_uuid(row.id),
        order_id,
        policy_number: row.policy_number,
        certificate_url: row.certificate_url,
        breakdown: PremiumBreakdown {
            premium: Money::new(row.premium, currency),
            tax: Money::new(row.tax, currency),
            total: Money::new(row.total, currency),
            tax_rate: Rate::new(row.tax_rate),
        },
        traveler_name: row.traveler_name,
        cnic: row.cnic.trim_end().to_string(),
        email: row.email,
        bank_transaction_id: row.bank_transaction_id,
        issuer_payload: row.issuer_payload,
        transaction,
        status,
        created_at: row.created_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::RecordFixtures;

    #[test]
    fn test_record_survives_row_conversion() {
        let record = RecordFixtures::policy_record("ORD-77");

        let row = record_to_row(&record).unwrap();
        assert_eq!(row.order_id, "ORD-77");
        assert_eq!(row.currency, "PKR");
        assert_eq!(row.status, "pending_review");

        assert_eq!(row_to_record(row).unwrap(), record);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        let mut row = record_to_row(&RecordFixtures::policy_record("ORD-78")).unwrap();
        row.status = "issued".to_string();

        let err = row_to_record(row).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }

    #[test]
    fn test_unreadable_transaction_is_rejected() {
        let mut row = record_to_row(&RecordFixtures::policy_record("ORD-79")).unwrap();
        row.transaction = serde_json::json!({"order_id": 42});

        let err = row_to_record(row).unwrap_err();
        assert!(matches!(err, PortError::Transformation { .. }));
    }
}
