//! Input checks applied before any gateway call is made.

use log::*;
use rust_decimal::Decimal;

use crate::error::{validation_error, Error};

const PHONE_DIGITS: usize = 10;

/// A phone number is exactly ten ASCII digits, with no prefix or separators.
pub fn is_valid_phone(phone: &str) -> bool {
    phone.len() == PHONE_DIGITS && phone.bytes().all(|b| b.is_ascii_digit())
}

pub fn validate_phone(phone: &str) -> Result<(), Error> {
    if is_valid_phone(phone) {
        Ok(())
    } else {
        warn!("Rejected malformed phone number");
        Err(validation_error(format!(
            "Invalid phone number. Must be {PHONE_DIGITS} digits."
        )))
    }
}

/// True when a text field is absent or only whitespace.
pub fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

/// A zero amount counts as missing, matching how the gateway treats it.
pub fn is_missing_amount(value: Option<Decimal>) -> bool {
    value.map_or(true, |v| v.is_zero())
}

/// Fail with every missing field named, in the order given.
pub fn require_fields(fields: &[(&str, bool)]) -> Result<(), Error> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, is_missing)| *is_missing)
        .map(|(name, _)| *name)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        debug!("Request is missing fields: {:?}", missing);
        Err(validation_error(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

pub fn require_positive(amount: Decimal, field: &str) -> Result<(), Error> {
    if amount > Decimal::ZERO {
        Ok(())
    } else {
        Err(validation_error(format!("{field} must be greater than zero")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DomainErrorKind, InternalErrorKind};

    #[test]
    fn test_phone_must_be_exactly_ten_ascii_digits() {
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("987654321"));
        assert!(!is_valid_phone("98765432100"));
        assert!(!is_valid_phone("+919876543"));
        assert!(!is_valid_phone("98765 4321"));
        // Non-ASCII digits are not accepted even though they are numeric
        assert!(!is_valid_phone("٩٨٧٦٥٤٣٢١٠"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn test_require_fields_lists_every_missing_field() {
        let err = require_fields(&[("customerName", true), ("phone", false), ("totalAmount", true)])
            .unwrap_err();
        assert_eq!(
            err.error_kind,
            DomainErrorKind::Internal(InternalErrorKind::Validation(
                "Missing required fields: customerName, totalAmount".to_string()
            ))
        );
    }

    #[test]
    fn test_blank_and_zero_count_as_missing() {
        assert!(is_blank(None));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("Asha")));
        assert!(is_missing_amount(Some(Decimal::ZERO)));
        assert!(!is_missing_amount(Some(Decimal::ONE)));
    }

    #[test]
    fn test_require_positive() {
        assert!(require_positive(Decimal::ONE, "amount").is_ok());
        assert!(require_positive(Decimal::NEGATIVE_ONE, "amount").is_err());
    }
}
