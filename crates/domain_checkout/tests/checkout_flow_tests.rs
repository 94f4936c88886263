//! Checkout Flow Tests
//!
//! Drives the four pipeline steps against in-memory ports:
//! - `form_collection` - validation gate and what lands in the session
//! - `payment_initiation` - gateway request shape and failure messages
//! - `bank_return` - ordering of verify / issue / persist and session cleanup
//! - `confirmation` - receipt formatting and the save state machine

use std::sync::Arc;

use rust_decimal_macros::dec;

use core_kernel::{OrderId, SessionId};
use domain_checkout::pricing::default_tax_rate;
use domain_checkout::session::{get_json, put_json, CUSTOMER_KEY, DRAFT_KEY, PENDING_RECORD_KEY};
use domain_checkout::{
    CheckoutError, ConfirmationPresenter, CustomerPaymentInfo, DraftPolicyApplication, FinalizeOutcome,
    FormCollector, GatewayReply, InMemoryTransientStore, Navigation, PaymentCallback, PaymentInitiator, PaymentMethod,
    PolicyFinalizer, ReturnHandler, SaveState, TransientStore,
};
use test_utils::{
    assert_field_error, assert_invalid_application, DraftBuilder, DraftFixtures, InMemoryPolicyRecordStore,
    MockGateway, MockIssuer, MockVerifier, RecordFixtures, ReplyFixtures,
};

// ============================================================================
// HARNESS
// ============================================================================

struct Harness {
    store: Arc<InMemoryTransientStore>,
    records: Arc<InMemoryPolicyRecordStore>,
    verifier: Arc<MockVerifier>,
    issuer: Arc<MockIssuer>,
    session: SessionId,
}

impl Harness {
    fn new(verifier: MockVerifier, issuer: MockIssuer, records: InMemoryPolicyRecordStore) -> Self {
        Self {
            store: Arc::new(InMemoryTransientStore::default()),
            records: Arc::new(records),
            verifier: Arc::new(verifier),
            issuer: Arc::new(issuer),
            session: SessionId::new(),
        }
    }

    fn happy() -> Self {
        Self::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::new(),
        )
    }

    fn collector(&self) -> FormCollector {
        FormCollector::new(self.store.clone())
    }

    fn finalizer(&self) -> PolicyFinalizer {
        PolicyFinalizer::new(self.records.clone())
    }

    fn return_handler(&self) -> ReturnHandler {
        ReturnHandler::new(
            self.verifier.clone(),
            self.issuer.clone(),
            self.finalizer(),
            self.store.clone(),
            default_tax_rate(),
        )
    }

    fn presenter(&self) -> ConfirmationPresenter {
        ConfirmationPresenter::new(self.finalizer(), self.store.clone())
    }

    async fn submit_valid_draft(&self) {
        self.collector()
            .submit(self.session, DraftFixtures::individual())
            .await
            .expect("valid draft should be accepted");
    }

    async fn keys(&self) -> Vec<String> {
        self.store.keys(self.session).await
    }
}

fn callback(order: &str) -> PaymentCallback {
    PaymentCallback {
        order_id: OrderId::parse(order).unwrap(),
        transaction_status: Some("P".to_string()),
        response_code: Some("00".to_string()),
        response_description: Some("Transaction Successful".to_string()),
    }
}

// ============================================================================
// FORM COLLECTION
// ============================================================================

mod form_collection {
    use super::*;

    #[tokio::test]
    async fn test_valid_draft_stores_exactly_two_objects_and_goes_to_payment() {
        let h = Harness::happy();

        let nav = h
            .collector()
            .submit(h.session, DraftFixtures::family())
            .await
            .unwrap();

        assert_eq!(nav, Navigation::Payment);
        assert_eq!(h.keys().await, vec![CUSTOMER_KEY.to_string(), DRAFT_KEY.to_string()]);

        let customer: CustomerPaymentInfo = get_json(h.store.as_ref(), h.session, CUSTOMER_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(customer.amount.amount(), dec!(32000));
        assert_eq!(customer.email, "ali.khan@example.com");
    }

    #[tokio::test]
    async fn test_dashed_cnic_is_normalized_before_storage() {
        let h = Harness::happy();
        let draft = DraftBuilder::new().with_cnic("35202-1234567-1").build();

        h.collector().submit(h.session, draft).await.unwrap();

        let stored: DraftPolicyApplication = get_json(h.store.as_ref(), h.session, DRAFT_KEY)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.traveler.cnic, "3520212345671");
    }

    #[tokio::test]
    async fn test_short_cnic_blocks_submission() {
        let h = Harness::happy();
        let draft = DraftBuilder::new().with_cnic("352021234567").build();

        let err = h.collector().submit(h.session, draft).await.unwrap_err();

        let report = assert_invalid_application(err);
        assert_field_error(&report, "traveler.cnic");
        assert!(h.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_each_invalid_field_is_marked() {
        let h = Harness::happy();
        let draft = DraftBuilder::new()
            .with_name("X")
            .with_passport("123")
            .with_email("not-an-email")
            .with_mobile("12345")
            .with_address("short")
            .with_duration(0)
            .with_amount(dec!(0))
            .build();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        for field in [
            "traveler.full_name",
            "traveler.passport_number",
            "traveler.email",
            "traveler.mobile",
            "traveler.address",
            "trip.duration_days",
            "amount",
        ] {
            assert_field_error(&report, field);
        }
        assert!(!report.toasts.is_empty());
        assert!(h.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_family_plan_requires_members() {
        let h = Harness::happy();
        let draft = DraftBuilder::family().with_spouse(None).with_children(vec![]).build();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        assert_field_error(&report, "plan");
    }

    #[tokio::test]
    async fn test_family_member_fields_are_checked() {
        let h = Harness::happy();
        let mut draft = DraftFixtures::family();
        draft.spouse.as_mut().unwrap().cnic = None;
        draft.children[0].passport_number = "bad".to_string();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        assert_field_error(&report, "spouse.cnic");
        assert_field_error(&report, "children[0].passport_number");
    }

    #[tokio::test]
    async fn test_individual_plan_rejects_family_members() {
        let h = Harness::happy();
        let family = DraftFixtures::family();
        let draft = DraftBuilder::new().with_spouse(family.spouse).build();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        assert_field_error(&report, "plan");
    }

    #[tokio::test]
    async fn test_fractional_amount_is_rejected_before_payment() {
        let h = Harness::happy();
        let draft = DraftBuilder::new().with_amount(dec!(15000.50)).build();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        assert_field_error(&report, "amount");
        assert!(h.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_past_trip_start_is_rejected() {
        let h = Harness::happy();
        let yesterday = chrono::Utc::now().date_naive() - chrono::Duration::days(1);
        let draft = DraftBuilder::new().with_trip_start(yesterday).build();

        let report = assert_invalid_application(h.collector().submit(h.session, draft).await.unwrap_err());

        assert_field_error(&report, "trip.start_date");
    }
}

// ============================================================================
// PAYMENT INITIATION
// ============================================================================

mod payment_initiation {
    use super::*;

    #[tokio::test]
    async fn test_card_payment_posts_amount_and_type_then_redirects() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let gateway = Arc::new(MockGateway::replying(GatewayReply::Redirect(ReplyFixtures::redirect_form())));
        let initiator = PaymentInitiator::new(gateway.clone(), h.store.clone());

        let redirect = initiator.initiate(h.session, PaymentMethod::Card).await.unwrap();

        let requests = gateway.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            serde_json::to_value(&requests[0]).unwrap(),
            serde_json::json!({"amount": 15000, "type": "3"})
        );

        assert_eq!(redirect.form.action_url, "https://bank.example.com/SSO/SSO/SSO");
        let html = redirect.to_html();
        assert!(html.contains("action=\"https://bank.example.com/SSO/SSO/SSO\""));
        assert!(html.contains("name=\"AuthToken\" value=\"tok-123\""));
        assert!(html.contains("document.forms[0].submit()"));
    }

    #[tokio::test]
    async fn test_gateway_message_is_surfaced() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let gateway = Arc::new(MockGateway::replying(GatewayReply::Rejected {
            message: Some("Merchant temporarily disabled".to_string()),
        }));
        let initiator = PaymentInitiator::new(gateway, h.store.clone());

        let err = initiator.initiate(h.session, PaymentMethod::Wallet).await.unwrap_err();

        match err {
            CheckoutError::PaymentInitiationFailed(msg) => assert_eq!(msg, "Merchant temporarily disabled"),
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_connection_failure_gives_generic_message_and_no_retry() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let gateway = Arc::new(MockGateway::unreachable());
        let initiator = PaymentInitiator::new(gateway.clone(), h.store.clone());

        let err = initiator.initiate(h.session, PaymentMethod::BankAccount).await.unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::PaymentInitiationFailed(ref msg) if msg == "Unable to connect to payment gateway"
        ));
        assert_eq!(gateway.requests().len(), 1);
        // Session is untouched so the traveler can click again
        assert_eq!(h.keys().await.len(), 2);
    }

    #[tokio::test]
    async fn test_no_submitted_form_means_no_gateway_call() {
        let h = Harness::happy();
        let gateway = Arc::new(MockGateway::unreachable());
        let initiator = PaymentInitiator::new(gateway.clone(), h.store.clone());

        let err = initiator.initiate(h.session, PaymentMethod::Card).await.unwrap_err();

        assert!(matches!(err, CheckoutError::NoPendingPayment));
        assert!(gateway.requests().is_empty());
    }
}

// ============================================================================
// BANK RETURN
// ============================================================================

mod bank_return {
    use super::*;

    #[tokio::test]
    async fn test_full_success_clears_session_and_writes_one_record() {
        let h = Harness::happy();
        h.submit_valid_draft().await;

        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        assert!(outcome.persisted);
        assert_eq!(outcome.navigation, Navigation::Confirmation { after_secs: 5 });
        assert_eq!(outcome.confirmation.policy_number, "TRV-2024-000123");
        assert_eq!(outcome.confirmation.breakdown.total.amount(), dec!(15000));
        assert!(h.keys().await.is_empty());

        let records = h.records.records();
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert_eq!(record.order_id.as_str(), "ORD-1001");
        assert_eq!(record.cnic, "3520212345671");
        assert_eq!(record.bank_transaction_id.as_deref(), Some("TXN-778899"));
        assert_eq!(record.issuer_payload, ReplyFixtures::issued().payload);
        assert_eq!(record.transaction.response_code.as_deref(), Some("00"));
        assert_eq!(record.transaction.amount, Some(core_kernel::Money::pkr(dec!(15000))));
    }

    #[tokio::test]
    async fn test_failed_verification_never_calls_insurer() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::not_verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::new(),
        );
        h.submit_valid_draft().await;

        let err = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentVerificationFailed { .. }));
        assert!(err.is_terminal());
        assert_eq!(err.navigation(), Some(Navigation::Home));
        assert_eq!(h.verifier.calls(), 1);
        assert_eq!(h.issuer.calls(), 0);
        assert_eq!(h.records.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_unreachable_verifier_is_a_verification_failure() {
        let h = Harness::new(
            MockVerifier::unreachable(),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::new(),
        );
        h.submit_valid_draft().await;

        let err = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::PaymentVerificationFailed { .. }));
        assert_eq!(h.issuer.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_draft_is_terminal() {
        let h = Harness::happy();

        let err = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::MissingDraftData));
        assert_eq!(h.verifier.calls(), 1);
        assert_eq!(h.issuer.calls(), 0);
    }

    #[tokio::test]
    async fn test_failed_issuance_keeps_draft() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issuance_declined()),
            InMemoryPolicyRecordStore::new(),
        );
        h.submit_valid_draft().await;

        let err = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap_err();

        match err {
            CheckoutError::PolicyIssuanceFailed(msg) => assert_eq!(msg, "Destination not covered"),
            other => panic!("unexpected error {other:?}"),
        }
        assert!(h.keys().await.contains(&DRAFT_KEY.to_string()));
        assert_eq!(h.records.insert_calls(), 0);
    }

    #[tokio::test]
    async fn test_success_without_policy_number_is_an_issuance_failure() {
        let mut reply = ReplyFixtures::issued();
        reply.policy_number = None;
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(reply),
            InMemoryPolicyRecordStore::new(),
        );
        h.submit_valid_draft().await;

        let err = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::PolicyIssuanceFailed(_)));
        assert!(h.keys().await.contains(&DRAFT_KEY.to_string()));
    }

    #[tokio::test]
    async fn test_persistence_failure_still_reports_success_and_stashes_record() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::failing(),
        );
        h.submit_valid_draft().await;

        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        assert!(!outcome.persisted);
        assert_eq!(outcome.navigation, Navigation::confirmation());
        assert!(h.records.records().is_empty());
        assert_eq!(h.keys().await, vec![PENDING_RECORD_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_issuer_receives_the_stored_draft() {
        let h = Harness::happy();
        h.submit_valid_draft().await;

        h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let drafts = h.issuer.drafts();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0], DraftFixtures::individual().normalized());
        assert_eq!(h.verifier.orders(), vec![OrderId::parse("ORD-1001").unwrap()]);
    }

    #[tokio::test]
    async fn test_replayed_callback_reuses_issued_policy() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let first = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        // Same tab resubmits the form and the bank callback is replayed
        h.submit_valid_draft().await;
        let second = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        assert!(second.persisted);
        assert_eq!(second.confirmation, first.confirmation);
        assert_eq!(h.issuer.calls(), 1);
        assert_eq!(h.records.insert_calls(), 1);
        assert_eq!(h.records.records().len(), 1);
        assert!(h.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_order_replayed_from_other_session_is_not_reissued() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let other = SessionId::new();
        h.collector().submit(other, DraftFixtures::individual()).await.unwrap();
        let outcome = h.return_handler().handle(other, callback("ORD-1001")).await.unwrap();

        assert_eq!(outcome.confirmation.policy_number, "TRV-2024-000123");
        assert_eq!(h.issuer.calls(), 1);
        assert_eq!(h.records.records().len(), 1);
    }

    #[tokio::test]
    async fn test_order_reused_by_another_traveler_is_terminal() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let other = SessionId::new();
        let draft = DraftBuilder::new().with_name("Bilal Ahmed").with_cnic("4210198765432").build();
        h.collector().submit(other, draft).await.unwrap();
        let err = h.return_handler().handle(other, callback("ORD-1001")).await.unwrap_err();

        assert!(matches!(err, CheckoutError::OrderAlreadyFulfilled(ref order) if order == "ORD-1001"));
        assert_eq!(err.navigation(), Some(Navigation::Home));
        assert_eq!(h.issuer.calls(), 1);
        let records = h.records.records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].traveler_name, "Ali Khan");
        // The other traveler's application is left alone
        assert_eq!(h.store.keys(other).await.len(), 2);
    }

    #[tokio::test]
    async fn test_replay_after_failed_write_uses_stashed_record() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::failing(),
        );
        h.submit_valid_draft().await;
        h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        h.submit_valid_draft().await;
        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        assert!(!outcome.persisted);
        assert_eq!(h.issuer.calls(), 1);
        assert_eq!(h.keys().await, vec![PENDING_RECORD_KEY.to_string()]);
    }
}

// ============================================================================
// FINALIZE
// ============================================================================

mod finalize {
    use super::*;

    #[tokio::test]
    async fn test_same_policy_twice_is_already_recorded() {
        let h = Harness::happy();
        let record = RecordFixtures::policy_record("ORD-1001");

        assert_eq!(h.finalizer().finalize(&record).await.unwrap(), FinalizeOutcome::Recorded);
        assert_eq!(h.finalizer().finalize(&record).await.unwrap(), FinalizeOutcome::AlreadyRecorded);
        assert_eq!(h.records.records().len(), 1);
    }

    #[tokio::test]
    async fn test_different_policy_for_stored_order_is_a_conflict() {
        let h = Harness::happy();
        let stored = RecordFixtures::policy_record("ORD-1001");
        h.finalizer().finalize(&stored).await.unwrap();

        let mut second = RecordFixtures::policy_record("ORD-1001");
        second.policy_number = "TRV-SECOND".to_string();
        let outcome = h.finalizer().finalize(&second).await.unwrap();

        assert_eq!(outcome, FinalizeOutcome::Conflict);
        assert!(!outcome.is_stored());
        assert_eq!(h.records.records()[0].policy_number, stored.policy_number);
    }
}

// ============================================================================
// CONFIRMATION
// ============================================================================

mod confirmation {
    use super::*;

    #[tokio::test]
    async fn test_receipt_formats_breakdown() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let receipt = ConfirmationPresenter::present(&outcome.confirmation);

        assert_eq!(receipt.policy_number, "TRV-2024-000123");
        assert_eq!(receipt.premium, "Rs. 12931.03");
        assert_eq!(receipt.tax, "Rs. 2068.97");
        assert_eq!(receipt.total, "Rs. 15000.00");
        assert_eq!(receipt.tax_rate, "16%");
        assert_eq!(receipt.traveler_name, "Ali Khan");
    }

    #[tokio::test]
    async fn test_save_after_successful_return_is_saved_without_new_write() {
        let h = Harness::happy();
        h.submit_valid_draft().await;
        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let saved = h.presenter().save(h.session, &outcome.confirmation).await;

        assert_eq!(saved.state, SaveState::Saved);
        assert_eq!(saved.document_url, outcome.confirmation.certificate_url);
        assert_eq!(h.records.insert_calls(), 1);
        assert_eq!(h.records.records().len(), 1);
    }

    #[tokio::test]
    async fn test_save_retries_stashed_record() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::failing(),
        );
        h.submit_valid_draft().await;
        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        h.records.set_fail_writes(false);
        let saved = h.presenter().save(h.session, &outcome.confirmation).await;

        assert_eq!(saved.state, SaveState::Saved);
        assert_eq!(h.records.records().len(), 1);
        assert!(h.keys().await.is_empty());
    }

    #[tokio::test]
    async fn test_failed_save_still_opens_document() {
        let h = Harness::new(
            MockVerifier::replying(ReplyFixtures::verified()),
            MockIssuer::replying(ReplyFixtures::issued()),
            InMemoryPolicyRecordStore::failing(),
        );
        h.submit_valid_draft().await;
        let outcome = h.return_handler().handle(h.session, callback("ORD-1001")).await.unwrap();

        let saved = h.presenter().save(h.session, &outcome.confirmation).await;

        assert_eq!(saved.state, SaveState::Unsaved);
        assert!(saved.document_url.is_some());
        assert_eq!(h.keys().await, vec![PENDING_RECORD_KEY.to_string()]);
    }

    #[tokio::test]
    async fn test_save_for_policy_not_in_store_is_unsaved() {
        let h = Harness::happy();
        let stored = RecordFixtures::policy_record("ORD-1001");
        h.finalizer().finalize(&stored).await.unwrap();
        let mut state = domain_checkout::ConfirmationState::from(&stored);
        state.policy_number = "TRV-SECOND".to_string();

        let saved = h.presenter().save(h.session, &state).await;

        assert_eq!(saved.state, SaveState::Unsaved);
    }

    #[tokio::test]
    async fn test_pending_record_for_other_order_is_not_saved() {
        let h = Harness::happy();
        let other = RecordFixtures::policy_record("ORD-OTHER");
        put_json(h.store.as_ref(), h.session, PENDING_RECORD_KEY, &other).await.unwrap();
        let state = domain_checkout::ConfirmationState {
            order_id: RecordFixtures::order_id(),
            policy_number: "TRV-X".to_string(),
            certificate_url: None,
            breakdown: other.breakdown,
            traveler_name: other.traveler_name.clone(),
            cnic: other.cnic.clone(),
            bank_transaction_id: None,
        };

        let saved = h.presenter().save(h.session, &state).await;

        assert_eq!(saved.state, SaveState::Unsaved);
        assert!(saved.document_url.is_none());
        assert!(h.records.records().is_empty());
    }
}
