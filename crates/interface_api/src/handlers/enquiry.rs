//! Public contact and inquiry submissions

use axum::{extract::State, http::StatusCode, Json};

use domain_checkout::{ContactMessage, Inquiry, NewContactMessage, NewInquiry};

use crate::error::ApiError;
use crate::AppState;

pub async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<NewContactMessage>,
) -> Result<(StatusCode, Json<ContactMessage>), ApiError> {
    let message = state.enquiries.submit_contact(request).await?;
    Ok((StatusCode::CREATED, Json(message)))
}

pub async fn submit_inquiry(
    State(state): State<AppState>,
    Json(request): Json<NewInquiry>,
) -> Result<(StatusCode, Json<Inquiry>), ApiError> {
    let inquiry = state.enquiries.submit_inquiry(request).await?;
    Ok((StatusCode::CREATED, Json(inquiry)))
}
