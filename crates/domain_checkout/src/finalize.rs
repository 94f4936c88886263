//! Single write path for issued policies
//!
//! Both the bank return callback and the confirmation page's save action go
//! through [`PolicyFinalizer::finalize`]. Writes are keyed by order id, so a
//! refreshed return URL or a repeated save never creates a second record.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info};

use core_kernel::{OrderId, PortError};

use crate::record::PolicyRecord;
use crate::ports::PolicyRecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FinalizeOutcome {
    /// This call wrote the record
    Recorded,
    /// The same policy was already stored for the order id; nothing was written
    AlreadyRecorded,
    /// The order id already holds a different policy; nothing was written
    Conflict,
}

impl FinalizeOutcome {
    /// True when the store holds exactly the record that was offered
    pub fn is_stored(&self) -> bool {
        matches!(self, FinalizeOutcome::Recorded | FinalizeOutcome::AlreadyRecorded)
    }
}

#[derive(Clone)]
pub struct PolicyFinalizer {
    store: Arc<dyn PolicyRecordStore>,
}

impl PolicyFinalizer {
    pub fn new(store: Arc<dyn PolicyRecordStore>) -> Self {
        Self { store }
    }

    pub async fn finalize(&self, record: &PolicyRecord) -> Result<FinalizeOutcome, PortError> {
        if self.store.insert_if_absent(record).await? {
            info!(
                order_id = %record.order_id,
                policy_number = %record.policy_number,
                total = %record.breakdown.total,
                "Policy record stored"
            );
            return Ok(FinalizeOutcome::Recorded);
        }

        match self.store.find_by_order(&record.order_id).await? {
            Some(stored) if stored.policy_number == record.policy_number => {
                debug!(order_id = %record.order_id, "Policy record already stored");
                Ok(FinalizeOutcome::AlreadyRecorded)
            }
            Some(stored) => {
                error!(
                    order_id = %record.order_id,
                    stored_policy = %stored.policy_number,
                    offered_policy = %record.policy_number,
                    "Order already holds a different policy"
                );
                Ok(FinalizeOutcome::Conflict)
            }
            None => Err(PortError::internal(format!(
                "insert for order {} was refused but no record exists",
                record.order_id
            ))),
        }
    }

    /// The stored record for an order, if any
    pub async fn recorded(&self, order_id: &OrderId) -> Result<Option<PolicyRecord>, PortError> {
        self.store.find_by_order(order_id).await
    }

    /// Whether the store holds this exact policy under the order id
    pub async fn holds(&self, order_id: &OrderId, policy_number: &str) -> Result<bool, PortError> {
        Ok(self
            .recorded(order_id)
            .await?
            .is_some_and(|stored| stored.policy_number == policy_number))
    }
}
