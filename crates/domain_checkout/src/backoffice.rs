//! Admin operations on stored policy records

use std::sync::Arc;

use tracing::info;

use core_kernel::OrderId;

use crate::error::CheckoutError;
use crate::ports::{Page, PolicyRecordStore};
use crate::record::{PolicyRecord, PolicyStatus};

#[derive(Clone)]
pub struct BackOffice {
    records: Arc<dyn PolicyRecordStore>,
}

impl BackOffice {
    pub fn new(records: Arc<dyn PolicyRecordStore>) -> Self {
        Self { records }
    }

    pub async fn policies(&self, page: Page) -> Result<Vec<PolicyRecord>, CheckoutError> {
        Ok(self.records.list(page).await?)
    }

    pub async fn policy(&self, order_id: &OrderId) -> Result<PolicyRecord, CheckoutError> {
        self.records
            .find_by_order(order_id)
            .await?
            .ok_or_else(|| CheckoutError::RecordNotFound(order_id.to_string()))
    }

    /// Moves a record to `status` if the transition is allowed
    pub async fn set_policy_status(
        &self,
        order_id: &OrderId,
        status: PolicyStatus,
        actor: &str,
    ) -> Result<PolicyRecord, CheckoutError> {
        let current = self.policy(order_id).await?;
        if current.status == status {
            return Ok(current);
        }
        if !current.status.can_transition_to(status) {
            return Err(CheckoutError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }

        let updated = self.records.update_status(order_id, status).await?;
        info!(
            order_id = %order_id,
            from = current.status.as_str(),
            to = status.as_str(),
            actor,
            "Policy status changed"
        );
        Ok(updated)
    }
}
