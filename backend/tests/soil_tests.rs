//! Tests for soil report validation rules
//!
//! Verifies the range checks applied to AI-generated soil values and the
//! confidence clamping applied to fertilizer recommendations.

use proptest::prelude::*;
use shared::{clamp_confidence, validate_percent, validate_ph, NutrientLevels};

// =============================================================================
// Unit Tests
// =============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn ph_accepts_full_scale() {
        assert!(validate_ph(0.0).is_ok());
        assert!(validate_ph(6.8).is_ok());
        assert!(validate_ph(14.0).is_ok());
    }

    #[test]
    fn ph_rejects_out_of_scale() {
        assert!(validate_ph(-0.1).is_err());
        assert!(validate_ph(14.1).is_err());
        assert!(validate_ph(f64::NAN).is_err());
    }

    #[test]
    fn percent_bounds() {
        assert!(validate_percent(0.0).is_ok());
        assert!(validate_percent(100.0).is_ok());
        assert!(validate_percent(100.5).is_err());
        assert!(validate_percent(-1.0).is_err());
    }

    #[test]
    fn nutrient_levels_non_negative() {
        let ok = NutrientLevels {
            nitrogen: 280.0,
            phosphorus: 24.0,
            potassium: 210.0,
        };
        assert!(ok.non_negative());

        let bad = NutrientLevels {
            nitrogen: -1.0,
            ..ok
        };
        assert!(!bad.non_negative());
    }

    #[test]
    fn confidence_in_range_untouched() {
        assert_eq!(clamp_confidence(0.0), (0.0, false));
        assert_eq!(clamp_confidence(0.87), (0.87, false));
        assert_eq!(clamp_confidence(1.0), (1.0, false));
    }

    #[test]
    fn confidence_out_of_range_clamped() {
        assert_eq!(clamp_confidence(1.3), (1.0, true));
        assert_eq!(clamp_confidence(-0.2), (0.0, true));
    }

    #[test]
    fn confidence_nan_becomes_zero() {
        let (value, clamped) = clamp_confidence(f64::NAN);
        assert_eq!(value, 0.0);
        assert!(clamped);
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Clamped confidence always lands in [0, 1]
    #[test]
    fn clamp_result_always_in_unit_interval(raw in -10.0f64..10.0) {
        let (value, _) = clamp_confidence(raw);
        prop_assert!((0.0..=1.0).contains(&value));
    }

    /// Values already in [0, 1] pass through unchanged
    #[test]
    fn clamp_is_identity_inside_range(raw in 0.0f64..=1.0) {
        prop_assert_eq!(clamp_confidence(raw), (raw, false));
    }

    /// The clamped flag fires exactly when the input was out of range
    #[test]
    fn clamp_flag_matches_range_check(raw in -10.0f64..10.0) {
        let (_, clamped) = clamp_confidence(raw);
        prop_assert_eq!(clamped, !(0.0..=1.0).contains(&raw));
    }

    /// pH validation accepts exactly the 0-14 scale
    #[test]
    fn ph_validation_matches_scale(ph in -5.0f64..20.0) {
        prop_assert_eq!(validate_ph(ph).is_ok(), (0.0..=14.0).contains(&ph));
    }
}
