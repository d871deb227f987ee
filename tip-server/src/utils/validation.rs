//! Input validation helpers
//!
//! Centralized text length constants and validation functions
//! shared by the engine and the HTTP handlers.

use rust_decimal::Decimal;

use crate::utils::AppError;

// ── Text length limits ──────────────────────────────────────────────

/// Entity names: role, employee
pub const MAX_NAME_LEN: usize = 200;

/// Short identifiers: phone, tax id, table, transaction reference
pub const MAX_SHORT_TEXT_LEN: usize = 100;

/// Email addresses (RFC 5321)
pub const MAX_EMAIL_LEN: usize = 254;

// ── Numeric limits ──────────────────────────────────────────────────

/// Upper bound for a single payment amount
pub const MAX_PAYMENT_AMOUNT: Decimal = Decimal::from_parts(1_000_000, 0, 0, false, 0);

/// Largest page size accepted by the history view
pub const MAX_PER_PAGE: u32 = 200;

// ── Validation helpers ──────────────────────────────────────────────

/// Validate that a required string is non-empty and within the length limit.
pub fn validate_required_text(value: &str, field: &str, max_len: usize) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} must not be empty")));
    }
    if value.len() > max_len {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            value.len()
        )));
    }
    Ok(())
}

/// Validate that an optional string, if present, is within the length limit.
pub fn validate_optional_text(
    value: &Option<String>,
    field: &str,
    max_len: usize,
) -> Result<(), AppError> {
    if let Some(v) = value
        && v.len() > max_len
    {
        return Err(AppError::validation(format!(
            "{field} is too long ({} chars, max {max_len})",
            v.len()
        )));
    }
    Ok(())
}

/// Validate a display color in `#RRGGBB` form.
pub fn validate_color(value: &str) -> Result<(), AppError> {
    let valid = value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit());
    if !valid {
        return Err(AppError::validation(format!(
            "color must be #RRGGBB, got '{value}'"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_text() {
        assert!(validate_required_text("Mozo", "name", MAX_NAME_LEN).is_ok());
        assert!(validate_required_text("   ", "name", MAX_NAME_LEN).is_err());
        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert!(validate_required_text(&long, "name", MAX_NAME_LEN).is_err());
    }

    #[test]
    fn test_optional_text() {
        assert!(validate_optional_text(&None, "phone", MAX_SHORT_TEXT_LEN).is_ok());
        let long = Some("9".repeat(MAX_SHORT_TEXT_LEN + 1));
        assert!(validate_optional_text(&long, "phone", MAX_SHORT_TEXT_LEN).is_err());
    }

    #[test]
    fn test_color() {
        assert!(validate_color("#FF8800").is_ok());
        assert!(validate_color("#ff8800").is_ok());
        assert!(validate_color("FF8800").is_err());
        assert!(validate_color("#FF88").is_err());
        assert!(validate_color("#GG8800").is_err());
    }

    #[test]
    fn test_max_amount_constant() {
        assert_eq!(MAX_PAYMENT_AMOUNT, Decimal::from(1_000_000));
    }
}
