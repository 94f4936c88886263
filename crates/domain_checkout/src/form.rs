//! Form collection step
//!
//! Validates the purchase form and, only when it is valid, writes the draft
//! application and the derived payment info into the session.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tracing::{debug, info};

use core_kernel::SessionId;

use crate::draft::{CustomerPaymentInfo, DraftPolicyApplication};
use crate::error::CheckoutError;
use crate::navigation::Navigation;
use crate::ports::TransientStore;
use crate::session::{put_json, CUSTOMER_KEY, DRAFT_KEY};
use crate::validation::validate_application;

#[derive(Clone)]
pub struct FormCollector {
    store: Arc<dyn TransientStore>,
}

impl FormCollector {
    pub fn new(store: Arc<dyn TransientStore>) -> Self {
        Self { store }
    }

    /// Validates and stores the application for the payment step
    ///
    /// # Errors
    ///
    /// `CheckoutError::InvalidApplication` with the per-field report. Nothing
    /// is written to the session in that case.
    pub async fn submit(
        &self,
        session: SessionId,
        draft: DraftPolicyApplication,
    ) -> Result<Navigation, CheckoutError> {
        self.submit_on(session, draft, Utc::now().date_naive()).await
    }

    /// Same as [`submit`](Self::submit) with an explicit "today"
    pub async fn submit_on(
        &self,
        session: SessionId,
        draft: DraftPolicyApplication,
        today: NaiveDate,
    ) -> Result<Navigation, CheckoutError> {
        let draft = draft.normalized();
        let report = validate_application(&draft, today);
        if !report.is_valid() {
            debug!(
                session = %session,
                fields = ?report.field_errors.keys().collect::<Vec<_>>(),
                "Application rejected by form validation"
            );
            return Err(CheckoutError::InvalidApplication(report));
        }

        let customer = CustomerPaymentInfo::from(&draft);
        put_json(self.store.as_ref(), session, DRAFT_KEY, &draft).await?;
        put_json(self.store.as_ref(), session, CUSTOMER_KEY, &customer).await?;

        info!(
            session = %session,
            plan = ?draft.plan,
            insured = draft.insured_count(),
            amount = %customer.amount,
            "Application accepted, continuing to payment"
        );
        Ok(Navigation::Payment)
    }
}
