//! Checkout DTOs

use serde::{Deserialize, Serialize};

use core_kernel::OrderId;
use domain_checkout::{ConfirmationState, Navigation, PaymentCallback, PaymentMethod, Receipt, ReturnOutcome};

use crate::error::ApiError;

#[derive(Debug, Serialize)]
pub struct ApplicationAccepted {
    pub navigation: Navigation,
    pub redirect_to: &'static str,
}

impl From<Navigation> for ApplicationAccepted {
    fn from(navigation: Navigation) -> Self {
        Self {
            redirect_to: navigation.path(),
            navigation,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentRequest {
    /// Gateway tag: `"1"` wallet, `"2"` bank account, `"3"` card
    pub method: PaymentMethod,
}

/// Query string the bank appends to the return URL
///
/// The parameter names are the bank's and are case-sensitive.
#[derive(Debug, Default, Deserialize)]
pub struct ReturnQuery {
    #[serde(rename = "O")]
    pub order_id: Option<String>,
    #[serde(rename = "TS")]
    pub transaction_status: Option<String>,
    #[serde(rename = "RC")]
    pub response_code: Option<String>,
    #[serde(rename = "RD")]
    pub response_description: Option<String>,
}

impl TryFrom<ReturnQuery> for PaymentCallback {
    type Error = ApiError;

    fn try_from(query: ReturnQuery) -> Result<Self, Self::Error> {
        let order_id = query
            .order_id
            .as_deref()
            .and_then(|raw| OrderId::parse(raw))
            .ok_or_else(|| ApiError::BadRequest("Missing order id (O) in return URL".to_string()))?;

        Ok(PaymentCallback {
            order_id,
            transaction_status: non_blank(query.transaction_status),
            response_code: non_blank(query.response_code),
            response_description: non_blank(query.response_description),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[derive(Debug, Serialize)]
pub struct CheckoutCompleted {
    pub confirmation: ConfirmationState,
    pub receipt: Receipt,
    pub persisted: bool,
    pub navigation: Navigation,
    pub redirect_to: &'static str,
}

impl From<ReturnOutcome> for CheckoutCompleted {
    fn from(outcome: ReturnOutcome) -> Self {
        Self {
            receipt: domain_checkout::ConfirmationPresenter::present(&outcome.confirmation),
            confirmation: outcome.confirmation,
            persisted: outcome.persisted,
            redirect_to: outcome.navigation.path(),
            navigation: outcome.navigation,
        }
    }
}
