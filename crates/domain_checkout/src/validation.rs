//! Purchase form validation
//!
//! Every rule here is a fixed pattern or bound; nothing is looked up
//! remotely. A failed validation produces a field-keyed error map for the
//! form markers plus the short messages the client shows as toasts.
//!
//! # Rules
//!
//! - Names: letters, spaces, `.`, `'` and `-`, 2-100 characters
//! - CNIC: exactly 13 digits (after separators are stripped)
//! - Passport: two letters followed by seven digits
//! - Email: `local@domain.tld`
//! - Mobile: Pakistani mobile, `03XXXXXXXXX` or `+923XXXXXXXXX`
//! - Address: 10-200 characters
//! - Family plan: a spouse or at least one child, each fully identified

use std::collections::BTreeMap;

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

use crate::draft::{DraftPolicyApplication, FamilyMember, PlanType};

static NAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z][A-Za-z .'-]{1,99}$").expect("valid name pattern"));
static CNIC_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{13}$").expect("valid cnic pattern"));
static PASSPORT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z]{2}\d{7}$").expect("valid passport pattern"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));
static MOBILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\+92|0)3\d{9}$").expect("valid mobile pattern"));

pub const ADDRESS_MIN_LEN: usize = 10;
pub const ADDRESS_MAX_LEN: usize = 200;
pub const MAX_TRIP_DAYS: u32 = 365;

pub fn is_valid_name(value: &str) -> bool {
    NAME_RE.is_match(value.trim())
}

pub fn is_valid_cnic(value: &str) -> bool {
    CNIC_RE.is_match(value)
}

pub fn is_valid_passport(value: &str) -> bool {
    PASSPORT_RE.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    EMAIL_RE.is_match(value)
}

pub fn is_valid_mobile(value: &str) -> bool {
    MOBILE_RE.is_match(value)
}

/// Result of validating a draft application
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    /// Error message per field path, e.g. `traveler.cnic` or `children[1].name`
    pub field_errors: BTreeMap<String, String>,
    /// Short notifications, one per distinct problem
    pub toasts: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.field_errors.is_empty()
    }

    /// Records an error against a field; the first error for a field wins
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let message = message.into();
        if !self.toasts.contains(&message) {
            self.toasts.push(message.clone());
        }
        self.field_errors.entry(field.into()).or_insert(message);
    }

    pub fn has_error(&self, field: &str) -> bool {
        self.field_errors.contains_key(field)
    }
}

/// Validates a normalized draft against the fixed form rules
///
/// `today` anchors the date-of-birth and trip-start checks.
pub fn validate_application(draft: &DraftPolicyApplication, today: NaiveDate) -> ValidationReport {
    let mut report = ValidationReport::default();
    let traveler = &draft.traveler;

    if !is_valid_name(&traveler.full_name) {
        report.add_error("traveler.full_name", "Please enter a valid full name");
    }
    if !is_valid_cnic(&traveler.cnic) {
        report.add_error("traveler.cnic", "CNIC must be exactly 13 digits");
    }
    if traveler.date_of_birth >= today {
        report.add_error("traveler.date_of_birth", "Date of birth must be in the past");
    }
    if !is_valid_passport(&traveler.passport_number) {
        report.add_error(
            "traveler.passport_number",
            "Passport number must be 2 letters followed by 7 digits",
        );
    }
    if !is_valid_email(&traveler.email) {
        report.add_error("traveler.email", "Please enter a valid email address");
    }
    if !is_valid_mobile(&traveler.mobile) {
        report.add_error("traveler.mobile", "Please enter a valid mobile number (03XXXXXXXXX)");
    }
    let address_len = traveler.address.trim().chars().count();
    if !(ADDRESS_MIN_LEN..=ADDRESS_MAX_LEN).contains(&address_len) {
        report.add_error(
            "traveler.address",
            format!("Address must be between {ADDRESS_MIN_LEN} and {ADDRESS_MAX_LEN} characters"),
        );
    }

    if !is_valid_name(&draft.beneficiary.name) {
        report.add_error("beneficiary.name", "Please enter the beneficiary's name");
    }
    if draft.beneficiary.relationship.trim().is_empty() {
        report.add_error("beneficiary.relationship", "Please select the beneficiary's relationship");
    }

    if draft.trip.destination.trim().is_empty() {
        report.add_error("trip.destination", "Please select a destination");
    }
    if draft.trip.start_date < today {
        report.add_error("trip.start_date", "Trip start date cannot be in the past");
    }
    if !(1..=MAX_TRIP_DAYS).contains(&draft.trip.duration_days) {
        report.add_error(
            "trip.duration_days",
            format!("Trip duration must be between 1 and {MAX_TRIP_DAYS} days"),
        );
    }

    let amount = draft.quoted_amount();
    if !amount.is_positive() {
        report.add_error("amount", "Please choose a plan before continuing");
    } else if !amount.is_whole_units() {
        // The gateway charges whole rupees; the receipt must match the charge
        report.add_error("amount", "Amount must be a whole number of rupees");
    }

    validate_family(draft, today, &mut report);

    report
}

fn validate_family(draft: &DraftPolicyApplication, today: NaiveDate, report: &mut ValidationReport) {
    match draft.plan {
        PlanType::Individual => {
            if draft.spouse.is_some() || !draft.children.is_empty() {
                report.add_error("plan", "Family members can only be added to a family plan");
            }
        }
        PlanType::Family => {
            if draft.spouse.is_none() && draft.children.is_empty() {
                report.add_error("plan", "A family plan needs a spouse or at least one child");
            }
            if let Some(spouse) = &draft.spouse {
                validate_member("spouse", spouse, today, report);
                match spouse.cnic.as_deref() {
                    Some(cnic) if is_valid_cnic(cnic) => {}
                    _ => report.add_error("spouse.cnic", "Spouse CNIC must be exactly 13 digits"),
                }
            }
            for (index, child) in draft.children.iter().enumerate() {
                validate_member(&format!("children[{index}]"), child, today, report);
            }
        }
    }
}

fn validate_member(prefix: &str, member: &FamilyMember, today: NaiveDate, report: &mut ValidationReport) {
    if !is_valid_name(&member.name) {
        report.add_error(format!("{prefix}.name"), "Please enter a valid name for each family member");
    }
    if member.date_of_birth >= today {
        report.add_error(
            format!("{prefix}.date_of_birth"),
            "Family member date of birth must be in the past",
        );
    }
    if !is_valid_passport(&member.passport_number) {
        report.add_error(
            format!("{prefix}.passport_number"),
            "Passport number must be 2 letters followed by 7 digits",
        );
    }
}
