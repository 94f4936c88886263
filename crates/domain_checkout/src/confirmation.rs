//! Confirmation view
//!
//! `present` formats the values handed over by the return handler. `save`
//! makes sure the record is stored and always hands back the certificate URL,
//! so a storage problem never keeps the traveler from their document.
//!
//! ```text
//! Unsaved --save ok-----> Saved   (document opened)
//! Unsaved --save failed-> Unsaved (document opened anyway)
//! ```

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use core_kernel::SessionId;

use crate::finalize::PolicyFinalizer;
use crate::ports::TransientStore;
use crate::record::PolicyRecord;
use crate::return_handler::ConfirmationState;
use crate::session::{get_json, PENDING_RECORD_KEY};

/// Display-ready receipt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt {
    pub order_id: String,
    pub policy_number: String,
    pub traveler_name: String,
    pub cnic: String,
    pub premium: String,
    pub tax: String,
    pub tax_rate: String,
    pub total: String,
    pub document_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveState {
    Unsaved,
    Saved,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SaveOutcome {
    pub state: SaveState,
    /// Certificate to open, whether or not the save succeeded
    pub document_url: Option<String>,
}

#[derive(Clone)]
pub struct ConfirmationPresenter {
    finalizer: PolicyFinalizer,
    store: Arc<dyn TransientStore>,
}

impl ConfirmationPresenter {
    pub fn new(finalizer: PolicyFinalizer, store: Arc<dyn TransientStore>) -> Self {
        Self { finalizer, store }
    }

    pub fn present(state: &ConfirmationState) -> Receipt {
        Receipt {
            order_id: state.order_id.to_string(),
            policy_number: state.policy_number.clone(),
            traveler_name: state.traveler_name.clone(),
            cnic: state.cnic.clone(),
            premium: state.breakdown.premium.to_string(),
            tax: state.breakdown.tax.to_string(),
            tax_rate: state.breakdown.tax_rate.to_string(),
            total: state.breakdown.total.to_string(),
            document_url: state.certificate_url.clone(),
        }
    }

    /// Saves the record for `state.order_id` if it is not stored yet
    pub async fn save(&self, session: SessionId, state: &ConfirmationState) -> SaveOutcome {
        let document_url = state.certificate_url.clone();

        let pending = match get_json::<PolicyRecord>(self.store.as_ref(), session, PENDING_RECORD_KEY).await {
            Ok(record) => record.filter(|r| r.order_id == state.order_id),
            Err(e) => {
                warn!(session = %session, error = %e, "Ignoring unreadable pending record");
                None
            }
        };

        let state_after = match pending {
            Some(record) => match self.finalizer.finalize(&record).await {
                Ok(outcome) if outcome.is_stored() => {
                    self.store.remove(session, PENDING_RECORD_KEY).await;
                    info!(order_id = %record.order_id, outcome = ?outcome, "Pending policy record saved");
                    SaveState::Saved
                }
                Ok(outcome) => {
                    warn!(order_id = %record.order_id, outcome = ?outcome, "Pending policy record not saved");
                    SaveState::Unsaved
                }
                Err(e) => {
                    warn!(order_id = %record.order_id, error = %e, "Saving pending policy record failed");
                    SaveState::Unsaved
                }
            },
            None => match self.finalizer.holds(&state.order_id, &state.policy_number).await {
                Ok(true) => SaveState::Saved,
                Ok(false) => {
                    warn!(order_id = %state.order_id, "No stored or pending record for confirmation");
                    SaveState::Unsaved
                }
                Err(e) => {
                    warn!(order_id = %state.order_id, error = %e, "Could not check for stored record");
                    SaveState::Unsaved
                }
            },
        };

        SaveOutcome {
            state: state_after,
            document_url,
        }
    }
}
