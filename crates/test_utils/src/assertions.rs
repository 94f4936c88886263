//! Assertion helpers for checkout results

use domain_checkout::{CheckoutError, ValidationReport};

/// Asserts the error is a validation failure and returns its report
pub fn assert_invalid_application(error: CheckoutError) -> ValidationReport {
    match error {
        CheckoutError::InvalidApplication(report) => report,
        other => panic!("Expected InvalidApplication, got {other:?}"),
    }
}

/// Asserts that validation flagged exactly the given field (and maybe others)
pub fn assert_field_error(report: &ValidationReport, field: &str) {
    assert!(
        report.has_error(field),
        "Expected an error on `{field}`, got {:?}",
        report.field_errors.keys().collect::<Vec<_>>()
    );
}
