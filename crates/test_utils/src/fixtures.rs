//! Pre-built Test Fixtures

use chrono::{Duration, NaiveDate, Utc};
use rust_decimal_macros::dec;
use serde_json::json;

use core_kernel::{Money, OrderId, PolicyRecordId};
use domain_checkout::pricing::default_tax_rate;
use domain_checkout::{
    Beneficiary, DraftPolicyApplication, FamilyMember, IssuanceReply, PlanType, PolicyRecord,
    PolicyStatus, PremiumBreakdown, RedirectForm, TransactionRecord, Traveler, TripDetails,
    VerificationReply,
};

/// Fixture for draft application data
pub struct DraftFixtures;

impl DraftFixtures {
    /// A valid individual-plan draft for 15,000 rupees starting next month
    pub fn individual() -> DraftPolicyApplication {
        DraftPolicyApplication {
            traveler: Self::traveler(),
            beneficiary: Beneficiary {
                name: "Ayesha Khan".to_string(),
                relationship: "mother".to_string(),
            },
            trip: TripDetails {
                destination: "Turkey".to_string(),
                start_date: Self::trip_start(),
                duration_days: 14,
            },
            plan: PlanType::Individual,
            spouse: None,
            children: Vec::new(),
            amount: dec!(15000),
        }
    }

    /// A valid family-plan draft with a spouse and one child
    pub fn family() -> DraftPolicyApplication {
        DraftPolicyApplication {
            plan: PlanType::Family,
            spouse: Some(FamilyMember {
                name: "Sana Khan".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(1991, 6, 12).unwrap(),
                passport_number: "CD7654321".to_string(),
                cnic: Some("3520276543212".to_string()),
            }),
            children: vec![FamilyMember {
                name: "Omar Khan".to_string(),
                date_of_birth: NaiveDate::from_ymd_opt(2016, 2, 2).unwrap(),
                passport_number: "EF1122334".to_string(),
                cnic: None,
            }],
            amount: dec!(32000),
            ..Self::individual()
        }
    }

    pub fn traveler() -> Traveler {
        Traveler {
            full_name: "Ali Khan".to_string(),
            cnic: "3520212345671".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1990, 1, 15).unwrap(),
            passport_number: "AB1234567".to_string(),
            email: "ali.khan@example.com".to_string(),
            mobile: "03001234567".to_string(),
            address: "House 12, Street 4, Gulberg III, Lahore".to_string(),
        }
    }

    pub fn trip_start() -> NaiveDate {
        Utc::now().date_naive() + Duration::days(30)
    }
}

/// Fixture for external system replies
pub struct ReplyFixtures;

impl ReplyFixtures {
    pub fn redirect_form() -> RedirectForm {
        RedirectForm {
            action_url: "https://bank.example.com/SSO/SSO/SSO".to_string(),
            fields: [
                ("AuthToken".to_string(), "tok-123".to_string()),
                ("RequestHash".to_string(), "hash==".to_string()),
                ("TransactionReferenceNumber".to_string(), "ORD-1001".to_string()),
            ]
            .into_iter()
            .collect(),
        }
    }

    pub fn verified() -> VerificationReply {
        VerificationReply {
            success: true,
            bank_transaction_id: Some("TXN-778899".to_string()),
            amount: Some(Money::pkr(dec!(15000))),
            message: None,
            raw: json!({
                "TransactionStatus": "Paid",
                "ResponseCode": "00",
                "TransactionId": "TXN-778899",
                "TransactionAmount": "15000"
            }),
        }
    }

    pub fn not_verified() -> VerificationReply {
        VerificationReply {
            success: false,
            bank_transaction_id: None,
            amount: None,
            message: Some("Transaction failed".to_string()),
            raw: json!({"TransactionStatus": "Failed", "ResponseCode": "05"}),
        }
    }

    pub fn issued() -> IssuanceReply {
        IssuanceReply {
            success: true,
            policy_number: Some("TRV-2024-000123".to_string()),
            certificate_url: Some("https://insurer.example.com/certificates/TRV-2024-000123.pdf".to_string()),
            message: None,
            payload: json!({
                "success": true,
                "policy_number": "TRV-2024-000123",
                "certificate_url": "https://insurer.example.com/certificates/TRV-2024-000123.pdf",
                "underwriter": "Example General Insurance"
            }),
        }
    }

    pub fn issuance_declined() -> IssuanceReply {
        IssuanceReply {
            success: false,
            policy_number: None,
            certificate_url: None,
            message: Some("Destination not covered".to_string()),
            payload: json!({"success": false, "message": "Destination not covered"}),
        }
    }
}

/// Fixture for stored policy records
pub struct RecordFixtures;

impl RecordFixtures {
    pub fn order_id() -> OrderId {
        OrderId::parse("ORD-1001").unwrap()
    }

    pub fn policy_record(order_id: &str) -> PolicyRecord {
        PolicyRecord {
            id: PolicyRecordId::new_v7(),
            order_id: OrderId::parse(order_id).unwrap(),
            policy_number: format!("TRV-{order_id}"),
            certificate_url: Some(format!("https://insurer.example.com/certificates/{order_id}.pdf")),
            breakdown: PremiumBreakdown::from_total(Money::pkr(dec!(15000)), default_tax_rate()).unwrap(),
            traveler_name: "Ali Khan".to_string(),
            cnic: "3520212345671".to_string(),
            email: "ali.khan@example.com".to_string(),
            bank_transaction_id: Some("TXN-778899".to_string()),
            issuer_payload: json!({"policy_number": format!("TRV-{order_id}")}),
            transaction: TransactionRecord {
                order_id: OrderId::parse(order_id).unwrap(),
                transaction_status: Some("P".to_string()),
                response_code: Some("00".to_string()),
                bank_transaction_id: Some("TXN-778899".to_string()),
                amount: Some(Money::pkr(dec!(15000))),
                verified_at: Utc::now(),
                raw: json!({"TransactionStatus": "Paid", "ResponseCode": "00"}),
            },
            status: PolicyStatus::PendingReview,
            created_at: Utc::now(),
        }
    }
}
