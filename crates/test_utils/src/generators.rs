//! Property-Based Test Generators
//!
//! Strategies for identity values on both sides of the form rules.

use fake::faker::internet::en::SafeEmail;
use fake::faker::name::en::Name;
use fake::Fake;
use proptest::prelude::*;

/// Any 13-digit CNIC
pub fn valid_cnic_strategy() -> impl Strategy<Value = String> {
    "[0-9]{13}"
}

/// Digit strings that are not 13 long
pub fn wrong_length_cnic_strategy() -> impl Strategy<Value = String> {
    prop_oneof!["[0-9]{0,12}", "[0-9]{14,20}"]
}

/// 13 characters with at least one non-digit
pub fn non_numeric_cnic_strategy() -> impl Strategy<Value = String> {
    ("[0-9]{12}", "[a-zA-Z]", 0usize..13).prop_map(|(digits, letter, pos)| {
        let mut s = digits;
        s.insert_str(pos, &letter);
        s
    })
}

/// Passports of the form `AB1234567`
pub fn valid_passport_strategy() -> impl Strategy<Value = String> {
    "[A-Z]{2}[0-9]{7}"
}

/// Local-format mobile numbers
pub fn valid_mobile_strategy() -> impl Strategy<Value = String> {
    "03[0-9]{9}"
}

/// Realistic contact details for submission tests
pub fn fake_contact() -> (String, String) {
    let name: String = Name().fake();
    let email: String = SafeEmail().fake();
    (name, email)
}
