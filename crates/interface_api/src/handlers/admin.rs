//! Back-office handlers

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};

use core_kernel::{InquiryId, OrderId};
use domain_checkout::{ContactMessage, Inquiry, Page};

use crate::auth::Claims;
use crate::dto::admin::*;
use crate::error::ApiError;
use crate::AppState;

fn order_id(raw: &str) -> Result<OrderId, ApiError> {
    OrderId::parse(raw).ok_or_else(|| ApiError::BadRequest("Order id must not be blank".to_string()))
}

/// Lists policy records, newest first
pub async fn list_policies(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<PolicyRecordResponse>>, ApiError> {
    let page = Page::from(query);
    let records = state.back_office.policies(page).await?;
    Ok(Json(ListResponse::new(
        records.into_iter().map(PolicyRecordResponse::summary).collect(),
        page,
    )))
}

/// Gets one policy record with its raw payloads
pub async fn get_policy(
    State(state): State<AppState>,
    Path(raw_order_id): Path<String>,
) -> Result<Json<PolicyRecordResponse>, ApiError> {
    let record = state.back_office.policy(&order_id(&raw_order_id)?).await?;
    Ok(Json(PolicyRecordResponse::detailed(record)))
}

/// Moves a policy record through its review states
pub async fn update_policy_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(raw_order_id): Path<String>,
    Json(request): Json<UpdatePolicyStatusRequest>,
) -> Result<Json<PolicyRecordResponse>, ApiError> {
    let record = state
        .back_office
        .set_policy_status(&order_id(&raw_order_id)?, request.status, &claims.sub)
        .await?;
    Ok(Json(PolicyRecordResponse::summary(record)))
}

pub async fn list_inquiries(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<Inquiry>>, ApiError> {
    let page = Page::from(query);
    let inquiries = state.enquiries.inquiries(page).await?;
    Ok(Json(ListResponse::new(inquiries, page)))
}

pub async fn update_inquiry_status(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Json(request): Json<UpdateInquiryStatusRequest>,
) -> Result<Json<Inquiry>, ApiError> {
    let id: InquiryId = raw_id
        .parse()
        .map_err(|_| ApiError::BadRequest(format!("Invalid inquiry id: {raw_id}")))?;
    let inquiry = state.enquiries.set_inquiry_status(id, request.status).await?;
    Ok(Json(inquiry))
}

pub async fn list_contacts(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<ListResponse<ContactMessage>>, ApiError> {
    let page = Page::from(query);
    let contacts = state.enquiries.contacts(page).await?;
    Ok(Json(ListResponse::new(contacts, page)))
}
