//! API Tests
//!
//! Exercises the router end to end with in-memory ports:
//! - `checkout` - cookie-scoped purchase flow and the bank return contract
//! - `admin` - login, role checks and the back-office endpoints
//! - `public` - contact and inquiry submissions
//! - `health` - liveness and readiness

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use tower::ServiceExt;

use core_kernel::{AdapterHealth, HealthCheckResult, HealthCheckable};
use domain_checkout::{GatewayReply, InMemoryTransientStore, PolicyRecordStore};
use interface_api::auth::create_token;
use interface_api::config::ApiConfig;
use interface_api::{create_router, Adapters, AppState};
use test_utils::{
    DraftBuilder, DraftFixtures, InMemoryEnquiryStore, InMemoryPolicyRecordStore, MockGateway, MockIssuer,
    MockVerifier, RecordFixtures, ReplyFixtures,
};

const JWT_SECRET: &str = "api-test-secret";
const ADMIN_PASSWORD: &str = "correct horse";

// ============================================================================
// HARNESS
// ============================================================================

struct Harness {
    app: Router,
    gateway: Arc<MockGateway>,
    verifier: Arc<MockVerifier>,
    issuer: Arc<MockIssuer>,
    records: Arc<InMemoryPolicyRecordStore>,
    enquiries: Arc<InMemoryEnquiryStore>,
}

impl Harness {
    fn new(verifier: MockVerifier, issuer: MockIssuer, readiness: Vec<Arc<dyn HealthCheckable>>) -> Self {
        let config = ApiConfig {
            jwt_secret: JWT_SECRET.to_string(),
            admin_password: ADMIN_PASSWORD.to_string(),
            ..ApiConfig::default()
        };

        let gateway = Arc::new(MockGateway::replying(GatewayReply::Redirect(ReplyFixtures::redirect_form())));
        let verifier = Arc::new(verifier);
        let issuer = Arc::new(issuer);
        let records = Arc::new(InMemoryPolicyRecordStore::new());
        let enquiries = Arc::new(InMemoryEnquiryStore::new());

        let adapters = Adapters {
            gateway: gateway.clone(),
            verifier: verifier.clone(),
            issuer: issuer.clone(),
            records: records.clone(),
            enquiries: enquiries.clone(),
            sessions: Arc::new(InMemoryTransientStore::new(config.session_ttl())),
            readiness,
        };

        Self {
            app: create_router(AppState::new(config, adapters)),
            gateway,
            verifier,
            issuer,
            records,
            enquiries,
        }
    }

    fn happy() -> Self {
        Self::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            Vec::new(),
        )
    }

    async fn send(&self, request: Request<Body>) -> Response {
        self.app.clone().oneshot(request).await.unwrap()
    }

    /// Submits a valid application and returns the session cookie
    async fn start_checkout(&self) -> String {
        self.start_checkout_for(DraftFixtures::individual()).await
    }

    async fn start_checkout_for(&self, draft: domain_checkout::DraftPolicyApplication) -> String {
        let draft = serde_json::to_value(draft).unwrap();
        let response = self
            .send(post_json("/api/v1/checkout/application", &draft, None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        session_cookie(&response)
    }

    fn admin_token(&self) -> String {
        create_token("admin", vec!["admin".to_string()], JWT_SECRET, 300).unwrap()
    }
}

fn post_json(uri: &str, body: &Value, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::post(uri), cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    with_cookie(Request::get(uri), cookie).body(Body::empty()).unwrap()
}

fn with_cookie(builder: axum::http::request::Builder, cookie: Option<&str>) -> axum::http::request::Builder {
    match cookie {
        Some(cookie) => builder.header(header::COOKIE, cookie),
        None => builder,
    }
}

fn authorized(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
    let builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"));
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie")
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

async fn body_json(response: Response) -> Value {
    serde_json::from_str(&body_text(response).await).unwrap()
}

// ============================================================================
// CHECKOUT
// ============================================================================

mod checkout {
    use super::*;

    #[tokio::test]
    async fn test_full_purchase_flow_persists_one_record() {
        let h = Harness::happy();
        let cookie = h.start_checkout().await;
        assert!(cookie.starts_with("checkout_session="));

        let response = h
            .send(post_json("/api/v1/checkout/payment", &json!({"method": "3"}), Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
        assert!(content_type.starts_with("text/html"));
        let html = body_text(response).await;
        assert!(html.contains("action=\"https://bank.example.com/SSO/SSO/SSO\""));
        assert!(html.contains("name=\"AuthToken\" value=\"tok-123\""));

        let requests = h.gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(serde_json::to_value(&requests[0]).unwrap(), json!({"amount": 15000, "type": "3"}));

        let response = h
            .send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00&RD=Approved", Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["persisted"], json!(true));
        assert_eq!(body["navigation"], json!({"step": "confirmation", "after_secs": 5}));
        assert_eq!(body["redirect_to"], json!("/confirmation"));
        assert_eq!(body["receipt"]["policy_number"], json!("TRV-2024-000123"));
        assert_eq!(body["receipt"]["premium"], json!("Rs. 12931.03"));
        assert_eq!(body["receipt"]["tax"], json!("Rs. 2068.97"));
        assert_eq!(body["receipt"]["total"], json!("Rs. 15000.00"));

        assert_eq!(h.verifier.orders()[0].as_str(), "ORD-1001");
        let records = h.records.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].order_id.as_str(), "ORD-1001");
        assert_eq!(records[0].bank_transaction_id.as_deref(), Some("TXN-778899"));
    }

    #[tokio::test]
    async fn test_refreshing_return_url_does_not_duplicate_record() {
        let h = Harness::happy();
        let cookie = h.start_checkout().await;

        let first = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&cookie))).await;
        assert_eq!(first.status(), StatusCode::OK);

        // The draft was cleared by the first return
        let second = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&cookie))).await;
        assert_eq!(second.status(), StatusCode::NOT_FOUND);
        let body = body_json(second).await;
        assert_eq!(body["error"], json!("missing_application"));
        assert_eq!(body["navigation"], json!({"step": "home"}));

        assert_eq!(h.records.records().len(), 1);
    }

    #[tokio::test]
    async fn test_order_reused_by_another_traveler_is_refused() {
        let h = Harness::happy();
        let first = h.start_checkout().await;
        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&first))).await;
        assert_eq!(response.status(), StatusCode::OK);

        let other = DraftBuilder::new().with_name("Bilal Ahmed").with_cnic("4210198765432").build();
        let second = h.start_checkout_for(other).await;
        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&second))).await;

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("order_already_fulfilled"));
        assert_eq!(body["navigation"], json!({"step": "home"}));

        assert_eq!(h.issuer.calls(), 1);
        let records = h.records.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].traveler_name, "Ali Khan");
    }

    #[tokio::test]
    async fn test_return_without_order_id_is_rejected_before_verification() {
        let h = Harness::happy();
        let cookie = h.start_checkout().await;

        let response = h.send(get("/payment/return?TS=Paid&RC=00", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.verifier.calls(), 0);

        // Parameter names are case-sensitive
        let response = h.send(get("/payment/return?o=ORD-1001", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(h.verifier.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_verification_routes_home_without_issuing() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::not_verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            Vec::new(),
        );
        let cookie = h.start_checkout().await;

        let response = h.send(get("/payment/return?O=ORD-1001&TS=Failed&RC=05", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::PAYMENT_REQUIRED);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("payment_verification_failed"));
        assert_eq!(body["navigation"], json!({"step": "home"}));

        assert_eq!(h.issuer.calls(), 0);
        assert!(h.records.records().is_empty());
    }

    #[tokio::test]
    async fn test_issuance_failure_routes_home() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issuance_declined()),
            Vec::new(),
        );
        let cookie = h.start_checkout().await;

        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("policy_issuance_failed"));
        assert!(body["message"].as_str().unwrap().contains("Destination not covered"));
        assert!(h.records.records().is_empty());
    }

    #[tokio::test]
    async fn test_return_without_session_reports_missing_application() {
        let h = Harness::happy();

        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(h.verifier.calls(), 1);
        assert_eq!(h.issuer.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_application_returns_field_errors() {
        let h = Harness::happy();
        let draft = serde_json::to_value(DraftBuilder::new().with_cnic("35202-12345").build()).unwrap();

        let response = h.send(post_json("/api/v1/checkout/application", &draft, None)).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], json!("invalid_application"));
        assert!(body["fields"]["traveler.cnic"].is_string());
        assert!(!body["details"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_payment_without_application_is_a_conflict() {
        let h = Harness::happy();

        let response = h
            .send(post_json("/api/v1/checkout/payment", &json!({"method": "1"}), None))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
        assert!(h.gateway.requests().is_empty());
    }

    #[tokio::test]
    async fn test_save_confirms_stored_record() {
        let h = Harness::happy();
        let cookie = h.start_checkout().await;

        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&cookie))).await;
        let confirmation = body_json(response).await["confirmation"].clone();

        let response = h
            .send(post_json("/api/v1/checkout/confirmation/save", &confirmation, Some(&cookie)))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["state"], json!("saved"));
        assert_eq!(
            body["document_url"],
            json!("https://insurer.example.com/certificates/TRV-2024-000123.pdf")
        );
        assert_eq!(h.records.records().len(), 1);
    }

    #[tokio::test]
    async fn test_receipt_formats_confirmation() {
        let h = Harness::happy();
        let cookie = h.start_checkout().await;
        let response = h.send(get("/payment/return?O=ORD-1001&TS=Paid&RC=00", Some(&cookie))).await;
        let confirmation = body_json(response).await["confirmation"].clone();

        let response = h.send(post_json("/api/v1/checkout/receipt", &confirmation, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["tax_rate"], json!("16%"));
        assert_eq!(body["traveler_name"], json!("Ali Khan"));
    }
}

// ============================================================================
// ADMIN
// ============================================================================

mod admin {
    use super::*;

    #[tokio::test]
    async fn test_admin_routes_require_token() {
        let h = Harness::happy();
        let response = h.send(get("/api/v1/admin/policies", None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = h
            .send(authorized("GET", "/api/v1/admin/policies", "not-a-jwt", None))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_routes_require_admin_role() {
        let h = Harness::happy();
        let token = create_token("clerk", vec!["viewer".to_string()], JWT_SECRET, 300).unwrap();

        let response = h.send(authorized("GET", "/api/v1/admin/policies", &token, None)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_login_issues_usable_token() {
        let h = Harness::happy();

        let response = h
            .send(post_json(
                "/api/v1/auth/login",
                &json!({"username": "admin", "password": ADMIN_PASSWORD}),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["token_type"], json!("Bearer"));
        let token = body["access_token"].as_str().unwrap().to_string();

        let response = h.send(authorized("GET", "/api/v1/admin/contacts", &token, None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password() {
        let h = Harness::happy();
        let response = h
            .send(post_json(
                "/api/v1/auth/login",
                &json!({"username": "admin", "password": "guess"}),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_list_and_review_policies() {
        let h = Harness::happy();
        h.records
            .insert_if_absent(&RecordFixtures::policy_record("ORD-2001"))
            .await
            .unwrap();
        let token = h.admin_token();

        let response = h
            .send(authorized("GET", "/api/v1/admin/policies?limit=10", &token, None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["limit"], json!(10));
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
        assert_eq!(body["items"][0]["status"], json!("pending_review"));
        assert!(body["items"][0].get("issuer_payload").is_none());

        let response = h
            .send(authorized("GET", "/api/v1/admin/policies/ORD-2001", &token, None))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["issuer_payload"].is_object());

        let response = h
            .send(authorized(
                "PUT",
                "/api/v1/admin/policies/ORD-2001/status",
                &token,
                Some(&json!({"status": "approved"})),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("approved"));

        let response = h
            .send(authorized(
                "PUT",
                "/api/v1/admin/policies/ORD-2001/status",
                &token,
                Some(&json!({"status": "pending_review"})),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_unknown_policy_is_not_found() {
        let h = Harness::happy();
        let token = h.admin_token();
        let response = h
            .send(authorized("GET", "/api/v1/admin/policies/ORD-404", &token, None))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}

// ============================================================================
// PUBLIC SUBMISSIONS
// ============================================================================

mod public {
    use super::*;

    #[tokio::test]
    async fn test_contact_message_is_stored() {
        let h = Harness::happy();
        let response = h
            .send(post_json(
                "/api/v1/contact",
                &json!({
                    "name": "Sara Ahmed",
                    "email": "sara@example.com",
                    "subject": "Visa help",
                    "message": "Do you handle Schengen visas?"
                }),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(h.enquiries.contacts().len(), 1);
    }

    #[tokio::test]
    async fn test_contact_with_bad_email_is_rejected() {
        let h = Harness::happy();
        let response = h
            .send(post_json(
                "/api/v1/contact",
                &json!({"name": "Sara", "email": "nope", "subject": "Hi", "message": "Hello"}),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(h.enquiries.contacts().is_empty());
    }

    #[tokio::test]
    async fn test_inquiry_status_can_be_updated_by_admin() {
        let h = Harness::happy();
        let response = h
            .send(post_json(
                "/api/v1/inquiries",
                &json!({
                    "name": "Bilal Raza",
                    "email": "bilal@example.com",
                    "phone": "03001234567",
                    "reference": "package:umrah-14",
                    "travelers": 3
                }),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        let body = body_json(response).await;
        assert_eq!(body["status"], json!("new"));
        let id = body["id"].as_str().unwrap().to_string();

        let token = h.admin_token();
        let response = h
            .send(authorized(
                "PUT",
                &format!("/api/v1/admin/inquiries/{id}/status"),
                &token,
                Some(&json!({"status": "contacted"})),
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(h.enquiries.inquiries()[0].status.as_str(), "contacted");

        let response = h.send(authorized("GET", "/api/v1/admin/inquiries", &token, None)).await;
        assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 1);
    }
}

// ============================================================================
// HEALTH
// ============================================================================

mod health {
    use super::*;

    struct StaticCheck(AdapterHealth);

    #[async_trait]
    impl HealthCheckable for StaticCheck {
        async fn health_check(&self) -> HealthCheckResult {
            HealthCheckResult {
                adapter_id: "static".to_string(),
                status: self.0,
                latency_ms: 0,
                message: None,
                checked_at: Utc::now(),
            }
        }
    }

    #[tokio::test]
    async fn test_liveness() {
        let h = Harness::happy();
        let response = h.send(get("/health", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], json!("healthy"));
    }

    #[tokio::test]
    async fn test_readiness_reflects_adapters() {
        let ready = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            vec![Arc::new(StaticCheck(AdapterHealth::Healthy)) as Arc<dyn HealthCheckable>],
        );
        assert_eq!(ready.send(get("/health/ready", None)).await.status(), StatusCode::OK);

        let not_ready = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            vec![
                Arc::new(StaticCheck(AdapterHealth::Healthy)) as Arc<dyn HealthCheckable>,
                Arc::new(StaticCheck(AdapterHealth::Unhealthy)),
            ],
        );
        let response = not_ready.send(get("/health/ready", None)).await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body_json(response).await["checks"].as_array().unwrap().len(), 2);
    }
}
