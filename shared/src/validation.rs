//! Validation utilities for the Agri Advisory Platform

use crate::types::GeoPoint;

// ============================================================================
// Agronomy Validations
// ============================================================================

/// Validate pH is a physically possible value
pub fn validate_ph(ph: f64) -> Result<(), &'static str> {
    if !(0.0..=14.0).contains(&ph) {
        return Err("pH must be between 0 and 14");
    }
    Ok(())
}

/// Validate a percentage field (humidity, soil moisture, organic carbon)
pub fn validate_percent(value: f64) -> Result<(), &'static str> {
    if !(0.0..=100.0).contains(&value) {
        return Err("Percentage must be between 0 and 100");
    }
    Ok(())
}

/// Clamp a model-reported confidence score into [0,1]
///
/// Returns the clamped value and whether clamping was necessary, so callers
/// can log out-of-range model output.
pub fn clamp_confidence(confidence: f64) -> (f64, bool) {
    if confidence.is_nan() {
        return (0.0, true);
    }
    let clamped = confidence.clamp(0.0, 1.0);
    (clamped, clamped != confidence)
}

/// Validate a geographic point lies within WGS84 bounds
pub fn validate_location(point: &GeoPoint) -> Result<(), &'static str> {
    if !point.is_valid() {
        return Err("Coordinates out of range");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength (8+ characters)
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ph_range() {
        assert!(validate_ph(6.5).is_ok());
        assert!(validate_ph(0.0).is_ok());
        assert!(validate_ph(14.0).is_ok());
        assert!(validate_ph(-0.1).is_err());
        assert!(validate_ph(14.5).is_err());
    }

    #[test]
    fn test_clamp_confidence_in_range() {
        assert_eq!(clamp_confidence(0.87), (0.87, false));
        assert_eq!(clamp_confidence(0.0), (0.0, false));
        assert_eq!(clamp_confidence(1.0), (1.0, false));
    }

    #[test]
    fn test_clamp_confidence_out_of_range() {
        assert_eq!(clamp_confidence(1.3), (1.0, true));
        assert_eq!(clamp_confidence(-0.5), (0.0, true));
        assert_eq!(clamp_confidence(f64::NAN), (0.0, true));
    }

    #[test]
    fn test_email_validation() {
        assert!(validate_email("farmer@example.com").is_ok());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("a@b").is_err());
    }

    #[test]
    fn test_password_validation() {
        assert!(validate_password("longenough1").is_ok());
        assert!(validate_password("short").is_err());
    }
}
