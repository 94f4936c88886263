//! Unit tests for the Money module as used by checkout pricing

use core_kernel::{Currency, Money, MoneyError, Rate};
use rust_decimal_macros::dec;

mod creation {
    use super::*;

    #[test]
    fn test_new_rounds_to_four_decimal_places() {
        let m = Money::pkr(dec!(100.123456789));
        assert_eq!(m.amount(), dec!(100.1235));
    }

    #[test]
    fn test_zero_is_not_positive() {
        let m = Money::pkr(dec!(0));
        assert!(m.is_zero());
        assert!(!m.is_positive());
    }

    #[test]
    fn test_default_currency_is_rupee() {
        assert_eq!(Currency::default(), Currency::PKR);
    }
}

mod arithmetic {
    use super::*;

    #[test]
    fn test_tax_larger_than_total_is_rejected() {
        let total = Money::pkr(dec!(100));
        let err = total.checked_sub(&Money::pkr(dec!(116))).unwrap_err();
        assert!(matches!(err, MoneyError::InvalidAmount(_)));
    }

    #[test]
    fn test_round_to_currency() {
        let m = Money::pkr(dec!(12931.0344));
        assert_eq!(m.round_to_currency().amount(), dec!(12931.03));
    }

    #[test]
    fn test_rate_round_trip_percentage() {
        let rate = Rate::from_percentage(dec!(16));
        assert_eq!(rate.as_decimal(), dec!(0.16));
        assert_eq!(rate.as_percentage(), dec!(16));
    }
}

mod serialization {
    use super::*;

    #[test]
    fn test_currency_serializes_uppercase() {
        let json = serde_json::to_string(&Currency::PKR).unwrap();
        assert_eq!(json, "\"PKR\"");
    }
}
