//! Test Data Builders
//!
//! Start from a valid draft and change only what the test is about.

use chrono::NaiveDate;
use rust_decimal::Decimal;

use domain_checkout::{DraftPolicyApplication, FamilyMember, PlanType};

use crate::fixtures::DraftFixtures;

/// Builder for draft applications
pub struct DraftBuilder {
    draft: DraftPolicyApplication,
}

impl Default for DraftBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl DraftBuilder {
    /// Starts from the valid individual fixture
    pub fn new() -> Self {
        Self {
            draft: DraftFixtures::individual(),
        }
    }

    /// Starts from the valid family fixture
    pub fn family() -> Self {
        Self {
            draft: DraftFixtures::family(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.draft.traveler.full_name = name.into();
        self
    }

    pub fn with_cnic(mut self, cnic: impl Into<String>) -> Self {
        self.draft.traveler.cnic = cnic.into();
        self
    }

    pub fn with_passport(mut self, passport: impl Into<String>) -> Self {
        self.draft.traveler.passport_number = passport.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.draft.traveler.email = email.into();
        self
    }

    pub fn with_mobile(mut self, mobile: impl Into<String>) -> Self {
        self.draft.traveler.mobile = mobile.into();
        self
    }

    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.draft.traveler.address = address.into();
        self
    }

    pub fn with_date_of_birth(mut self, dob: NaiveDate) -> Self {
        self.draft.traveler.date_of_birth = dob;
        self
    }

    pub fn with_trip_start(mut self, start: NaiveDate) -> Self {
        self.draft.trip.start_date = start;
        self
    }

    pub fn with_duration(mut self, days: u32) -> Self {
        self.draft.trip.duration_days = days;
        self
    }

    pub fn with_amount(mut self, amount: Decimal) -> Self {
        self.draft.amount = amount;
        self
    }

    pub fn with_plan(mut self, plan: PlanType) -> Self {
        self.draft.plan = plan;
        self
    }

    pub fn with_spouse(mut self, spouse: Option<FamilyMember>) -> Self {
        self.draft.spouse = spouse;
        self
    }

    pub fn with_children(mut self, children: Vec<FamilyMember>) -> Self {
        self.draft.children = children;
        self
    }

    pub fn build(self) -> DraftPolicyApplication {
        self.draft
    }
}
