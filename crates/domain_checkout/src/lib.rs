//! Travel Insurance Checkout Domain
//!
//! The purchase flow is a straight line with one hop through the bank:
//!
//! ```text
//! FormCollector ──(session)──> PaymentInitiator ──(browser POST)──> bank
//!                                                                    │
//! ConfirmationPresenter <──(navigation)── ReturnHandler <──(return URL)
//! ```
//!
//! The domain only talks to the outside world through the traits in
//! [`ports`]. Persistence of issued policies goes through a single idempotent
//! operation, [`PolicyFinalizer::finalize`], keyed by the bank order id.

pub mod backoffice;
pub mod confirmation;
pub mod draft;
pub mod enquiry;
pub mod error;
pub mod finalize;
pub mod form;
pub mod navigation;
pub mod payment;
pub mod ports;
pub mod pricing;
pub mod record;
pub mod return_handler;
pub mod session;
pub mod validation;

pub use backoffice::BackOffice;
pub use confirmation::{ConfirmationPresenter, Receipt, SaveOutcome, SaveState};
pub use draft::{Beneficiary, CustomerPaymentInfo, DraftPolicyApplication, FamilyMember, PlanType, Traveler, TripDetails};
pub use enquiry::{ContactMessage, EnquiryService, Inquiry, InquiryStatus, NewContactMessage, NewInquiry};
pub use error::CheckoutError;
pub use finalize::{FinalizeOutcome, PolicyFinalizer};
pub use form::FormCollector;
pub use navigation::Navigation;
pub use payment::{PaymentInitiator, PaymentRedirect};
pub use ports::{
    EnquiryStore, GatewayReply, GatewayRequest, IssuanceReply, Page, PaymentGatewayPort, PaymentMethod,
    PaymentVerificationPort, PolicyIssuancePort, PolicyRecordStore, RedirectForm, TransientStore,
    VerificationReply,
};
pub use pricing::PremiumBreakdown;
pub use record::{IssuedPolicy, PolicyRecord, PolicyStatus, TransactionRecord};
pub use return_handler::{ConfirmationState, PaymentCallback, ReturnHandler, ReturnOutcome};
pub use session::InMemoryTransientStore;
pub use validation::ValidationReport;
