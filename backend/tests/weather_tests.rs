//! Tests for weather unit conversion and location handling
//!
//! Upstream forecast data arrives in Kelvin and must be converted to
//! Celsius before threshold evaluation or storage.

use proptest::prelude::*;
use shared::{kelvin_to_celsius, GeoPoint, Severity};

// =============================================================================
// Unit Tests
// =============================================================================

mod unit_tests {
    use super::*;

    #[test]
    fn known_conversions() {
        assert!((kelvin_to_celsius(273.15) - 0.0).abs() < 1e-9);
        assert!((kelvin_to_celsius(373.15) - 100.0).abs() < 1e-9);
        // A hot pre-monsoon afternoon in the Deccan
        assert!((kelvin_to_celsius(315.15) - 42.0).abs() < 1e-9);
    }

    #[test]
    fn absolute_zero() {
        assert!((kelvin_to_celsius(0.0) - (-273.15)).abs() < 1e-9);
    }

    #[test]
    fn geo_point_bounds() {
        // Nagpur
        assert!(GeoPoint::new(79.0882, 21.1458).is_valid());
        // Corner cases of the WGS84 grid
        assert!(GeoPoint::new(180.0, 90.0).is_valid());
        assert!(GeoPoint::new(-180.0, -90.0).is_valid());
        // Out of range
        assert!(!GeoPoint::new(180.1, 0.0).is_valid());
        assert!(!GeoPoint::new(0.0, 90.1).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }

    #[test]
    fn severity_ordering() {
        assert!(Severity::Low < Severity::Medium);
        assert!(Severity::Medium < Severity::High);
    }
}

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    /// Conversion preserves ordering: warmer in Kelvin stays warmer in Celsius
    #[test]
    fn conversion_is_monotonic(a in 150.0f64..350.0, b in 150.0f64..350.0) {
        if a < b {
            prop_assert!(kelvin_to_celsius(a) < kelvin_to_celsius(b));
        }
    }

    /// Conversion preserves differences exactly (it is a pure offset)
    #[test]
    fn conversion_preserves_differences(k in 150.0f64..350.0, delta in 0.0f64..50.0) {
        let diff = kelvin_to_celsius(k + delta) - kelvin_to_celsius(k);
        prop_assert!((diff - delta).abs() < 1e-9);
    }

    /// Any physically plausible surface temperature converts below 100 C
    #[test]
    fn plausible_surface_temps(k in 180.0f64..330.0) {
        let c = kelvin_to_celsius(k);
        prop_assert!(c > -100.0 && c < 60.0);
    }
}
