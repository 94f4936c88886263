//! API error handling

use std::collections::BTreeMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use domain_checkout::{CheckoutError, Navigation, ValidationReport};

use crate::auth::AuthError;

/// API error types
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Validation error: {0}")]
    Validation(String),

    /// Purchase form errors, keyed by field
    #[error("Application is invalid")]
    InvalidApplication(ValidationReport),

    #[error("Bad gateway: {0}")]
    BadGateway(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// A checkout step failed in a way the client should route on
    #[error("{message}")]
    CheckoutFailed {
        status: StatusCode,
        kind: &'static str,
        message: String,
        navigation: Option<Navigation>,
    },
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<BTreeMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub navigation: Option<Navigation>,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Validation(_) | ApiError::InvalidApplication(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::CheckoutFailed { status, .. } => *status,
        }
    }

    fn terminal(status: StatusCode, kind: &'static str, err: &CheckoutError) -> Self {
        ApiError::CheckoutFailed {
            status,
            kind,
            message: err.to_string(),
            navigation: err.navigation(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::InvalidApplication(report) => ErrorResponse {
                error: "invalid_application".to_string(),
                message: "Please correct the highlighted fields".to_string(),
                details: Some(report.toasts),
                fields: Some(report.field_errors),
                navigation: None,
            },
            ApiError::CheckoutFailed {
                kind,
                message,
                navigation,
                ..
            } => ErrorResponse {
                error: kind.to_string(),
                message,
                details: None,
                fields: None,
                navigation,
            },
            other => {
                let (error_type, message) = match &other {
                    ApiError::NotFound(msg) => ("not_found", msg.clone()),
                    ApiError::BadRequest(msg) => ("bad_request", msg.clone()),
                    ApiError::Unauthorized => ("unauthorized", "Unauthorized".to_string()),
                    ApiError::Forbidden(msg) => ("forbidden", msg.clone()),
                    ApiError::Conflict(msg) => ("conflict", msg.clone()),
                    ApiError::Internal(msg) => ("internal_error", msg.clone()),
                    ApiError::Validation(msg) => ("validation_error", msg.clone()),
                    ApiError::BadGateway(msg) => ("bad_gateway", msg.clone()),
                    ApiError::ServiceUnavailable(msg) => ("service_unavailable", msg.clone()),
                    ApiError::InvalidApplication(_) | ApiError::CheckoutFailed { .. } => {
                        ("internal_error", other.to_string())
                    }
                };
                ErrorResponse {
                    error: error_type.to_string(),
                    message,
                    details: None,
                    fields: None,
                    navigation: None,
                }
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::InvalidApplication(report) => ApiError::InvalidApplication(report),
            CheckoutError::NoPendingPayment => ApiError::Conflict(err.to_string()),
            CheckoutError::PaymentInitiationFailed(message) => ApiError::BadGateway(message),
            CheckoutError::PaymentVerificationFailed { .. } => {
                ApiError::terminal(StatusCode::PAYMENT_REQUIRED, "payment_verification_failed", &err)
            }
            CheckoutError::MissingDraftData => {
                ApiError::terminal(StatusCode::NOT_FOUND, "missing_application", &err)
            }
            CheckoutError::PolicyIssuanceFailed(_) => {
                ApiError::terminal(StatusCode::BAD_GATEWAY, "policy_issuance_failed", &err)
            }
            CheckoutError::OrderAlreadyFulfilled(_) => {
                ApiError::terminal(StatusCode::CONFLICT, "order_already_fulfilled", &err)
            }
            CheckoutError::RecordNotFound(_) => ApiError::NotFound(err.to_string()),
            CheckoutError::InvalidStatusTransition { .. } => ApiError::Conflict(err.to_string()),
            CheckoutError::InvalidSubmission(message) => ApiError::Validation(message),
            CheckoutError::CorruptSession(_) => ApiError::BadRequest(err.to_string()),
            CheckoutError::Core(core_kernel::CoreError::Validation(message)) => ApiError::Validation(message),
            CheckoutError::Port(port) if port.is_not_found() => ApiError::NotFound(port.to_string()),
            CheckoutError::Port(port) if port.is_transient() => {
                error!(error = %port, "Backing service unavailable");
                ApiError::ServiceUnavailable(port.to_string())
            }
            other => {
                error!(error = %other, "Unhandled checkout error");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::MissingPermission(role) => ApiError::Forbidden(format!("Requires role {role}")),
            AuthError::InvalidToken | AuthError::TokenExpired | AuthError::InvalidCredentials => {
                ApiError::Unauthorized
            }
            AuthError::Signing(message) => ApiError::Internal(message),
        }
    }
}
