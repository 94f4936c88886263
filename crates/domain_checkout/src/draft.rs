//! Draft policy application
//!
//! The draft is what the traveler fills in before paying. It lives only in the
//! transient store between form submission and the bank's return callback,
//! and is sent verbatim to the insurer when the policy is issued.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

/// Coverage plan chosen by the traveler
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Covers the primary traveler only
    Individual,
    /// Covers the primary traveler plus spouse and/or children
    Family,
}

/// The primary traveler and policyholder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Traveler {
    pub full_name: String,
    /// National identity number (CNIC), 13 digits
    pub cnic: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
}

/// Person receiving benefits if the traveler dies during the trip
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub name: String,
    pub relationship: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripDetails {
    pub destination: String,
    pub start_date: NaiveDate,
    pub duration_days: u32,
}

/// Spouse or child covered under a family plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FamilyMember {
    pub name: String,
    pub date_of_birth: NaiveDate,
    pub passport_number: String,
    /// Required for the spouse, optional for children
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cnic: Option<String>,
}

/// Everything collected by the purchase form
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DraftPolicyApplication {
    pub traveler: Traveler,
    pub beneficiary: Beneficiary,
    pub trip: TripDetails,
    pub plan: PlanType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spouse: Option<FamilyMember>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<FamilyMember>,
    /// Quoted price in rupees
    pub amount: Decimal,
}

impl DraftPolicyApplication {
    /// Strips the separators people commonly type into identity numbers
    ///
    /// `12345-1234567-1` and `12345 1234567 1` both become `1234512345671`.
    pub fn normalized(mut self) -> Self {
        self.traveler.cnic = strip_separators(&self.traveler.cnic);
        self.traveler.passport_number = self.traveler.passport_number.trim().to_uppercase();
        self.traveler.email = self.traveler.email.trim().to_string();
        self.traveler.mobile = strip_separators(&self.traveler.mobile);
        if let Some(spouse) = self.spouse.as_mut() {
            normalize_member(spouse);
        }
        for child in &mut self.children {
            normalize_member(child);
        }
        self
    }

    /// Number of people covered by the policy
    pub fn insured_count(&self) -> usize {
        1 + usize::from(self.spouse.is_some()) + self.children.len()
    }

    pub fn quoted_amount(&self) -> Money {
        Money::pkr(self.amount)
    }
}

fn normalize_member(member: &mut FamilyMember) {
    member.passport_number = member.passport_number.trim().to_uppercase();
    member.cnic = member.cnic.as_deref().map(strip_separators);
}

fn strip_separators(value: &str) -> String {
    value.chars().filter(|c| !matches!(c, '-' | ' ')).collect()
}

/// The subset of the draft needed to start a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerPaymentInfo {
    pub amount: Money,
    pub name: String,
    pub email: String,
    pub mobile: String,
}

impl From<&DraftPolicyApplication> for CustomerPaymentInfo {
    fn from(draft: &DraftPolicyApplication) -> Self {
        Self {
            amount: draft.quoted_amount(),
            name: draft.traveler.full_name.clone(),
            email: draft.traveler.email.clone(),
            mobile: draft.traveler.mobile.clone(),
        }
    }
}
