//! Checkout handlers
//!
//! Every response refreshes the session cookie so the transient store entry
//! and the browser cookie expire together.

use axum::{
    extract::{Query, State},
    http::header,
    response::{Html, IntoResponse},
    Json,
};

use domain_checkout::{ConfirmationPresenter, ConfirmationState, DraftPolicyApplication, PaymentCallback, Receipt, SaveOutcome};

use crate::dto::checkout::*;
use crate::error::ApiError;
use crate::session::CheckoutSession;
use crate::AppState;

fn session_cookie(state: &AppState, session: &CheckoutSession) -> [(header::HeaderName, String); 1] {
    [(header::SET_COOKIE, session.cookie(state.config.session_ttl()))]
}

/// Validates the purchase form and keeps it for the payment step
pub async fn submit_application(
    State(state): State<AppState>,
    session: CheckoutSession,
    Json(draft): Json<DraftPolicyApplication>,
) -> Result<impl IntoResponse, ApiError> {
    let navigation = state.forms.submit(session.id, draft).await?;
    Ok((session_cookie(&state, &session), Json(ApplicationAccepted::from(navigation))))
}

/// Returns the self-submitting bank redirect page
pub async fn initiate_payment(
    State(state): State<AppState>,
    session: CheckoutSession,
    Json(request): Json<PaymentRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let redirect = state.payments.initiate(session.id, request.method).await?;
    Ok((session_cookie(&state, &session), Html(redirect.to_html())))
}

/// Bank return URL
pub async fn payment_return(
    State(state): State<AppState>,
    session: CheckoutSession,
    Query(query): Query<ReturnQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let callback = PaymentCallback::try_from(query)?;
    let outcome = state.returns.handle(session.id, callback).await?;
    Ok((session_cookie(&state, &session), Json(CheckoutCompleted::from(outcome))))
}

/// Formats the confirmation values for display
pub async fn receipt(Json(confirmation): Json<ConfirmationState>) -> Json<Receipt> {
    Json(ConfirmationPresenter::present(&confirmation))
}

/// Confirmation page "save" action
pub async fn save_confirmation(
    State(state): State<AppState>,
    session: CheckoutSession,
    Json(confirmation): Json<ConfirmationState>,
) -> impl IntoResponse {
    let outcome: SaveOutcome = state.confirmations.save(session.id, &confirmation).await;
    (session_cookie(&state, &session), Json(outcome))
}
