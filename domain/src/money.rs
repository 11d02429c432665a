//! Currency amounts.
//!
//! Amounts arrive in decimal currency units (rupees) and leave for the gateway as
//! integer minor units (paise).

use log::*;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{validation_error, Error};

/// Currency code sent with every amount.
pub const CURRENCY: &str = "INR";

const MINOR_UNITS_PER_MAJOR: Decimal = Decimal::ONE_HUNDRED;

/// Convert a decimal amount to integer minor units.
///
/// Multiplies by 100 and rounds half away from zero, so `100.125` becomes `10013`.
/// Negative amounts and amounts that do not fit in an `i64` are rejected.
pub fn to_minor_units(amount: Decimal) -> Result<i64, Error> {
    if amount.is_sign_negative() && !amount.is_zero() {
        warn!("Rejected negative amount {}", amount);
        return Err(validation_error("Amount must not be negative"));
    }

    amount
        .checked_mul(MINOR_UNITS_PER_MAJOR)
        .map(|minor| minor.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|minor| minor.to_i64())
        .ok_or_else(|| {
            warn!("Rejected amount {} that overflows minor units", amount);
            validation_error("Amount is too large")
        })
}
