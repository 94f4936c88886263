//! Premium, tax and total for an issued policy
//!
//! The amount charged at the bank is tax-inclusive. The premium is backed out
//! of that total so that `premium + tax == total` holds to the paisa.

use rust_decimal::RoundingStrategy;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{CoreError, Money, Rate};

/// Default sales tax on insurance premiums
pub fn default_tax_rate() -> Rate {
    Rate::from_percentage(dec!(16))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PremiumBreakdown {
    pub premium: Money,
    pub tax: Money,
    pub total: Money,
    pub tax_rate: Rate,
}

impl PremiumBreakdown {
    /// Splits a tax-inclusive total into premium and tax
    ///
    /// # Errors
    ///
    /// Returns a validation error for a non-positive total or a negative rate.
    pub fn from_total(total: Money, tax_rate: Rate) -> Result<Self, CoreError> {
        if !total.is_positive() {
            return Err(CoreError::validation(format!("total must be positive, got {total}")));
        }
        if tax_rate.as_decimal().is_sign_negative() {
            return Err(CoreError::validation(format!("tax rate cannot be negative: {tax_rate}")));
        }

        let total = total.round_to_currency();
        // Divide at full precision; Money::new would round to 4 dp first.
        let premium_amount = (total.amount() / (dec!(1) + tax_rate.as_decimal()))
            .round_dp_with_strategy(
                total.currency().decimal_places(),
                RoundingStrategy::MidpointAwayFromZero,
            );
        let premium = Money::new(premium_amount, total.currency());
        let tax = total.checked_sub(&premium)?;

        Ok(Self {
            premium,
            tax,
            total,
            tax_rate,
        })
    }
}
