//! HTTP API Layer
//!
//! This crate provides the REST API for the travel insurance checkout using
//! Axum.
//!
//! # Architecture
//!
//! - **Handlers**: Checkout steps, public submissions, admin back office
//! - **Session**: Cookie that scopes the server-side transient store
//! - **Middleware**: Authentication, admin authorization, audit logging
//! - **DTOs**: Request/Response data transfer objects
//! - **Error Handling**: Consistent error responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, Adapters, AppState};
//!
//! let state = AppState::new(config, adapters);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod auth;
pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod session;

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use core_kernel::{HealthCheckable, Rate};
use domain_checkout::{
    BackOffice, ConfirmationPresenter, EnquiryService, EnquiryStore, FormCollector, PaymentGatewayPort,
    PaymentInitiator, PaymentVerificationPort, PolicyFinalizer, PolicyIssuancePort, PolicyRecordStore,
    ReturnHandler, TransientStore,
};

use crate::config::ApiConfig;
use crate::handlers::{admin, checkout, enquiry, health};
use crate::middleware::{audit_middleware, auth_middleware, require_admin};

/// Port implementations the API is wired with
pub struct Adapters {
    pub gateway: Arc<dyn PaymentGatewayPort>,
    pub verifier: Arc<dyn PaymentVerificationPort>,
    pub issuer: Arc<dyn PolicyIssuancePort>,
    pub records: Arc<dyn PolicyRecordStore>,
    pub enquiries: Arc<dyn EnquiryStore>,
    pub sessions: Arc<dyn TransientStore>,
    /// Checked by `/health/ready`
    pub readiness: Vec<Arc<dyn HealthCheckable>>,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub forms: FormCollector,
    pub payments: PaymentInitiator,
    pub returns: ReturnHandler,
    pub confirmations: ConfirmationPresenter,
    pub back_office: BackOffice,
    pub enquiries: EnquiryService,
    pub readiness: Arc<Vec<Arc<dyn HealthCheckable>>>,
}

impl AppState {
    pub fn new(config: ApiConfig, adapters: Adapters) -> Self {
        let tax_rate = Rate::from_percentage(config.tax_rate_percent);
        let finalizer = PolicyFinalizer::new(adapters.records.clone());

        Self {
            forms: FormCollector::new(adapters.sessions.clone()),
            payments: PaymentInitiator::new(adapters.gateway, adapters.sessions.clone()),
            returns: ReturnHandler::new(
                adapters.verifier,
                adapters.issuer,
                finalizer.clone(),
                adapters.sessions.clone(),
                tax_rate,
            ),
            confirmations: ConfirmationPresenter::new(finalizer, adapters.sessions),
            back_office: BackOffice::new(adapters.records),
            enquiries: EnquiryService::new(adapters.enquiries),
            readiness: Arc::new(adapters.readiness),
            config,
        }
    }
}

fn cors_layer(config: &ApiConfig) -> CorsLayer {
    let permissive = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let Some(origin) = config.allowed_origin.as_deref().filter(|o| !o.trim().is_empty()) else {
        return permissive;
    };

    match origin.trim().parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                axum::http::Method::GET,
                axum::http::Method::POST,
                axum::http::Method::PUT,
            ])
            .allow_headers([axum::http::header::CONTENT_TYPE, axum::http::header::AUTHORIZATION])
            .allow_credentials(true),
        Err(e) => {
            warn!(origin, error = %e, "Ignoring unparsable allowed origin");
            permissive
        }
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/payment/return", get(checkout::payment_return));

    let checkout_routes = Router::new()
        .route("/application", post(checkout::submit_application))
        .route("/payment", post(checkout::initiate_payment))
        .route("/receipt", post(checkout::receipt))
        .route("/confirmation/save", post(checkout::save_confirmation));

    let admin_routes = Router::new()
        .route("/policies", get(admin::list_policies))
        .route("/policies/:order_id", get(admin::get_policy))
        .route("/policies/:order_id/status", put(admin::update_policy_status))
        .route("/inquiries", get(admin::list_inquiries))
        .route("/inquiries/:id/status", put(admin::update_inquiry_status))
        .route("/contacts", get(admin::list_contacts))
        .layer(axum_middleware::from_fn(require_admin))
        .layer(axum_middleware::from_fn(audit_middleware))
        .layer(axum_middleware::from_fn_with_state(state.clone(), auth_middleware));

    let api_routes = Router::new()
        .nest("/checkout", checkout_routes)
        .route("/contact", post(enquiry::submit_contact))
        .route("/inquiries", post(enquiry::submit_inquiry))
        .route("/auth/login", post(handlers::auth::login))
        .nest("/admin", admin_routes);

    let cors = cors_layer(&state.config);

    // Combine all routes
    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
