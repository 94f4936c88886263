//! Checkout domain errors
//!
//! The first group of variants are terminal failures of the purchase flow and
//! are shown to the traveler with a way back home. Persistence failures in the
//! return handler never surface here; they are logged and stashed instead.

use thiserror::Error;

use core_kernel::{CoreError, PortError};

use crate::navigation::Navigation;
use crate::record::PolicyStatus;
use crate::validation::ValidationReport;

#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The purchase form failed validation; nothing was stored
    #[error("Application is invalid: {} field(s) need attention", .0.field_errors.len())]
    InvalidApplication(ValidationReport),

    /// Payment was requested without a submitted application in the session
    #[error("No pending payment found for this session")]
    NoPendingPayment,

    /// The gateway refused or could not be reached
    #[error("Payment initiation failed: {0}")]
    PaymentInitiationFailed(String),

    /// The bank did not confirm the payment
    #[error("Payment verification failed for order {order_id}: {reason}")]
    PaymentVerificationFailed { order_id: String, reason: String },

    /// The draft application is gone from the session
    #[error("Application data not found")]
    MissingDraftData,

    /// The insurer did not issue the policy
    #[error("Policy issuance failed: {0}")]
    PolicyIssuanceFailed(String),

    /// The paid order already has a policy for a different traveler
    #[error("Order {0} has already been used for another policy")]
    OrderAlreadyFulfilled(String),

    /// Writing the policy record failed
    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),

    #[error("Policy record not found: {0}")]
    RecordNotFound(String),

    #[error("Cannot move policy from {from:?} to {to:?}")]
    InvalidStatusTransition { from: PolicyStatus, to: PolicyStatus },

    #[error("Invalid submission: {0}")]
    InvalidSubmission(String),

    /// Session payload could not be (de)serialized
    #[error("Session data is corrupt: {0}")]
    CorruptSession(String),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Port(#[from] PortError),
}

impl CheckoutError {
    /// True for the failures that end the purchase flow for the traveler
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CheckoutError::PaymentVerificationFailed { .. }
                | CheckoutError::MissingDraftData
                | CheckoutError::PolicyIssuanceFailed(_)
                | CheckoutError::OrderAlreadyFulfilled(_)
        )
    }

    /// Where the client goes after this error, if anywhere
    pub fn navigation(&self) -> Option<Navigation> {
        if self.is_terminal() {
            Some(Navigation::Home)
        } else {
            None
        }
    }
}
