//! Payment initiation step
//!
//! Asks the gateway for a bank redirect form and renders it as a page that
//! submits itself, so the browser performs a full-page POST to the bank.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use core_kernel::SessionId;

use crate::draft::CustomerPaymentInfo;
use crate::error::CheckoutError;
use crate::ports::{GatewayReply, GatewayRequest, PaymentGatewayPort, PaymentMethod, RedirectForm, TransientStore};
use crate::session::{get_json, CUSTOMER_KEY};

/// Shown while the browser is handed over to the bank
pub const REDIRECT_STATUS_MESSAGE: &str = "Redirecting to bank…";
/// Shown when the gateway fails without a message of its own
pub const GATEWAY_UNREACHABLE_MESSAGE: &str = "Unable to connect to payment gateway";

/// A ready-to-render bank handover
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentRedirect {
    pub form: RedirectForm,
    pub status_message: String,
}

impl PaymentRedirect {
    /// HTML page that POSTs the hidden fields to the bank on load
    pub fn to_html(&self) -> String {
        let mut inputs = String::new();
        for (name, value) in &self.form.fields {
            inputs.push_str(&format!(
                "    <input type=\"hidden\" name=\"{}\" value=\"{}\">\n",
                escape_html(name),
                escape_html(value)
            ));
        }

        format!(
            "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{status}</title></head>\n\
             <body onload=\"document.forms[0].submit()\">\n\
             <p>{status}</p>\n\
             <form method=\"POST\" action=\"{action}\">\n{inputs}    \
             <noscript><button type=\"submit\">Continue to bank</button></noscript>\n\
             </form>\n</body>\n</html>\n",
            status = escape_html(&self.status_message),
            action = escape_html(&self.form.action_url),
            inputs = inputs,
        )
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[derive(Clone)]
pub struct PaymentInitiator {
    gateway: Arc<dyn PaymentGatewayPort>,
    store: Arc<dyn TransientStore>,
}

impl PaymentInitiator {
    pub fn new(gateway: Arc<dyn PaymentGatewayPort>, store: Arc<dyn TransientStore>) -> Self {
        Self { gateway, store }
    }

    /// Requests a redirect form for the session's pending amount
    ///
    /// One gateway call per invocation; a failure is reported and the
    /// traveler has to click again.
    pub async fn initiate(
        &self,
        session: SessionId,
        method: PaymentMethod,
    ) -> Result<PaymentRedirect, CheckoutError> {
        let customer: CustomerPaymentInfo = get_json(self.store.as_ref(), session, CUSTOMER_KEY)
            .await?
            .ok_or(CheckoutError::NoPendingPayment)?;

        let amount = customer
            .amount
            .to_whole_units()
            .map_err(|e| CheckoutError::PaymentInitiationFailed(e.to_string()))?;
        let request = GatewayRequest { amount, method };

        match self.gateway.request_redirect(&request).await {
            Ok(GatewayReply::Redirect(form)) => {
                info!(
                    session = %session,
                    amount,
                    method = %method,
                    action = %form.action_url,
                    "Gateway issued bank redirect"
                );
                Ok(PaymentRedirect {
                    form,
                    status_message: REDIRECT_STATUS_MESSAGE.to_string(),
                })
            }
            Ok(GatewayReply::Rejected { message }) => {
                warn!(session = %session, message = ?message, "Gateway rejected payment request");
                Err(CheckoutError::PaymentInitiationFailed(
                    message.unwrap_or_else(|| GATEWAY_UNREACHABLE_MESSAGE.to_string()),
                ))
            }
            Err(e) => {
                warn!(session = %session, error = %e, transient = e.is_transient(), "Gateway request failed");
                Err(CheckoutError::PaymentInitiationFailed(GATEWAY_UNREACHABLE_MESSAGE.to_string()))
            }
        }
    }
}
