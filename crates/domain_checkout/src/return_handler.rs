//! Bank return callback
//!
//! The bank sends the browser back to a fixed path with the order id and
//! status on the query string. From there the steps run strictly in order:
//!
//! 1. verify the payment with the backend
//! 2. load the draft application from the session
//! 3. ask the insurer to issue the policy
//! 4. store the combined record (best effort)
//! 5. clear the session and hand over to the confirmation view
//!
//! Steps 1-3 end the flow on failure. A failed step 4 is logged and the record
//! is kept in the session so the confirmation page's save action can retry it;
//! the traveler still sees success.
//!
//! An order id that already has a policy, in the store or in this session's
//! stash, is never sent to the insurer again.

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use core_kernel::{Money, OrderId, PolicyRecordId, Rate, SessionId};

use crate::draft::DraftPolicyApplication;
use crate::error::CheckoutError;
use crate::finalize::PolicyFinalizer;
use crate::navigation::Navigation;
use crate::ports::{PaymentVerificationPort, PolicyIssuancePort, TransientStore};
use crate::pricing::PremiumBreakdown;
use crate::record::{IssuedPolicy, PolicyRecord, PolicyStatus, TransactionRecord};
use crate::session::{get_json, put_json, CUSTOMER_KEY, DRAFT_KEY, PENDING_RECORD_KEY};

/// Query parameters the bank appends to the return URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentCallback {
    pub order_id: OrderId,
    pub transaction_status: Option<String>,
    pub response_code: Option<String>,
    pub response_description: Option<String>,
}

/// Values the confirmation view needs, passed along with the navigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationState {
    pub order_id: OrderId,
    pub policy_number: String,
    pub certificate_url: Option<String>,
    pub breakdown: PremiumBreakdown,
    pub traveler_name: String,
    pub cnic: String,
    pub bank_transaction_id: Option<String>,
}

impl From<&PolicyRecord> for ConfirmationState {
    fn from(record: &PolicyRecord) -> Self {
        Self {
            order_id: record.order_id.clone(),
            policy_number: record.policy_number.clone(),
            certificate_url: record.certificate_url.clone(),
            breakdown: record.breakdown,
            traveler_name: record.traveler_name.clone(),
            cnic: record.cnic.clone(),
            bank_transaction_id: record.bank_transaction_id.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReturnOutcome {
    pub confirmation: ConfirmationState,
    /// Whether the record is known to be in the store
    pub persisted: bool,
    pub navigation: Navigation,
}

#[derive(Clone)]
pub struct ReturnHandler {
    verifier: Arc<dyn PaymentVerificationPort>,
    issuer: Arc<dyn PolicyIssuancePort>,
    finalizer: PolicyFinalizer,
    store: Arc<dyn TransientStore>,
    tax_rate: Rate,
}

impl ReturnHandler {
    pub fn new(
        verifier: Arc<dyn PaymentVerificationPort>,
        issuer: Arc<dyn PolicyIssuancePort>,
        finalizer: PolicyFinalizer,
        store: Arc<dyn TransientStore>,
        tax_rate: Rate,
    ) -> Self {
        Self {
            verifier,
            issuer,
            finalizer,
            store,
            tax_rate,
        }
    }

    pub async fn handle(
        &self,
        session: SessionId,
        callback: PaymentCallback,
    ) -> Result<ReturnOutcome, CheckoutError> {
        let order_id = callback.order_id.clone();
        info!(
            session = %session,
            order_id = %order_id,
            status = ?callback.transaction_status,
            response_code = ?callback.response_code,
            "Bank return received"
        );

        let transaction = self.verify(&callback).await?;
        let draft = self.load_draft(session, &order_id).await?;

        if let Some(outcome) = self.already_fulfilled(session, &order_id, &draft).await? {
            self.clear_checkout(session).await;
            return Ok(outcome);
        }

        let issued = self.issue(&draft, &order_id).await?;

        let quoted = draft.quoted_amount();
        self.check_charged_amount(&quoted, &transaction);
        let breakdown = PremiumBreakdown::from_total(quoted, self.tax_rate)?;
        let record = PolicyRecord {
            id: PolicyRecordId::new_v7(),
            order_id: order_id.clone(),
            policy_number: issued.policy_number.clone(),
            certificate_url: issued.certificate_url.clone(),
            breakdown,
            traveler_name: draft.traveler.full_name.clone(),
            cnic: draft.traveler.cnic.clone(),
            email: draft.traveler.email.clone(),
            bank_transaction_id: transaction.bank_transaction_id.clone(),
            issuer_payload: issued.payload,
            transaction,
            status: PolicyStatus::PendingReview,
            created_at: Utc::now(),
        };

        let persisted = match self.finalizer.finalize(&record).await {
            Ok(outcome) => outcome.is_stored(),
            Err(e) => {
                error!(
                    order_id = %order_id,
                    policy_number = %record.policy_number,
                    error = %e,
                    "Failed to store policy record; kept in session for the save action"
                );
                if let Err(stash_err) = put_json(self.store.as_ref(), session, PENDING_RECORD_KEY, &record).await {
                    error!(order_id = %order_id, error = %stash_err, "Failed to stash policy record");
                }
                false
            }
        };

        self.clear_checkout(session).await;

        info!(order_id = %order_id, policy_number = %record.policy_number, persisted, "Checkout complete");

        Ok(ReturnOutcome {
            confirmation: ConfirmationState::from(&record),
            persisted,
            navigation: Navigation::confirmation(),
        })
    }

    /// A policy already issued for this order, stored or stashed in this session
    ///
    /// The insurer is only called once per order id. A replay for the same
    /// traveler gets the earlier policy back; a replay for anyone else is refused.
    async fn already_fulfilled(
        &self,
        session: SessionId,
        order_id: &OrderId,
        draft: &DraftPolicyApplication,
    ) -> Result<Option<ReturnOutcome>, CheckoutError> {
        let (record, persisted) = match self.finalizer.recorded(order_id).await {
            Ok(Some(record)) => (record, true),
            Ok(None) => match get_json::<PolicyRecord>(self.store.as_ref(), session, PENDING_RECORD_KEY).await {
                Ok(Some(record)) if &record.order_id == order_id => (record, false),
                _ => return Ok(None),
            },
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Could not look up earlier policy for order");
                return Ok(None);
            }
        };

        if record.cnic != draft.traveler.cnic {
            warn!(
                session = %session,
                order_id = %order_id,
                policy_number = %record.policy_number,
                "Order already fulfilled for another traveler"
            );
            return Err(CheckoutError::OrderAlreadyFulfilled(order_id.to_string()));
        }

        info!(
            order_id = %order_id,
            policy_number = %record.policy_number,
            persisted,
            "Order already fulfilled; returning the issued policy"
        );
        Ok(Some(ReturnOutcome {
            confirmation: ConfirmationState::from(&record),
            persisted,
            navigation: Navigation::confirmation(),
        }))
    }

    /// Flags a bank amount that differs from what the gateway was asked to charge
    fn check_charged_amount(&self, quoted: &Money, transaction: &TransactionRecord) {
        if let Some(charged) = transaction.amount.filter(|c| c.amount() != quoted.amount()) {
            warn!(
                order_id = %transaction.order_id,
                quoted = %quoted,
                charged = %charged,
                "Bank reports a different amount than quoted"
            );
        }
    }

    async fn clear_checkout(&self, session: SessionId) {
        self.store.remove(session, DRAFT_KEY).await;
        self.store.remove(session, CUSTOMER_KEY).await;
    }

    async fn verify(&self, callback: &PaymentCallback) -> Result<TransactionRecord, CheckoutError> {
        let order_id = &callback.order_id;
        let reply = match self.verifier.verify(order_id).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(order_id = %order_id, error = %e, "Payment verification request failed");
                return Err(CheckoutError::PaymentVerificationFailed {
                    order_id: order_id.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        if !reply.success {
            warn!(order_id = %order_id, message = ?reply.message, "Payment not confirmed");
            return Err(CheckoutError::PaymentVerificationFailed {
                order_id: order_id.to_string(),
                reason: reply
                    .message
                    .unwrap_or_else(|| "payment was not confirmed by the bank".to_string()),
            });
        }

        Ok(TransactionRecord {
            order_id: order_id.clone(),
            transaction_status: callback.transaction_status.clone(),
            response_code: callback.response_code.clone(),
            bank_transaction_id: reply.bank_transaction_id,
            amount: reply.amount,
            verified_at: Utc::now(),
            raw: reply.raw,
        })
    }

    async fn load_draft(
        &self,
        session: SessionId,
        order_id: &OrderId,
    ) -> Result<DraftPolicyApplication, CheckoutError> {
        match get_json::<DraftPolicyApplication>(self.store.as_ref(), session, DRAFT_KEY).await {
            Ok(Some(draft)) => Ok(draft),
            Ok(None) => {
                warn!(session = %session, order_id = %order_id, "Paid order has no draft in session");
                Err(CheckoutError::MissingDraftData)
            }
            Err(e) => {
                warn!(session = %session, order_id = %order_id, error = %e, "Draft in session is unreadable");
                Err(CheckoutError::MissingDraftData)
            }
        }
    }

    async fn issue(
        &self,
        draft: &DraftPolicyApplication,
        order_id: &OrderId,
    ) -> Result<IssuedPolicy, CheckoutError> {
        let reply = self.issuer.issue(draft).await.map_err(|e| {
            warn!(order_id = %order_id, error = %e, "Issuance request failed");
            CheckoutError::PolicyIssuanceFailed(e.to_string())
        })?;

        match (reply.success, reply.policy_number) {
            (true, Some(policy_number)) if !policy_number.trim().is_empty() => Ok(IssuedPolicy {
                policy_number,
                certificate_url: reply.certificate_url,
                payload: reply.payload,
            }),
            (true, _) => {
                warn!(order_id = %order_id, "Insurer reported success without a policy number");
                Err(CheckoutError::PolicyIssuanceFailed(
                    "insurer response did not include a policy number".to_string(),
                ))
            }
            (false, _) => {
                warn!(order_id = %order_id, message = ?reply.message, "Insurer declined issuance");
                Err(CheckoutError::PolicyIssuanceFailed(
                    reply.message.unwrap_or_else(|| "policy could not be issued".to_string()),
                ))
            }
        }
    }
}
