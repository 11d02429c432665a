//! Subscription calendar arithmetic and generated identifiers.

use chrono::{DateTime, Months, NaiveDate, TimeDelta, Utc};

use crate::error::{validation_error, Error};

/// Wire format of every date sent to the gateway.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// How long a setup order stays payable, in minutes.
pub const ORDER_EXPIRY_MINUTES: i64 = 10;

/// Days counted per installment when expressing a mandate lifetime in milliseconds.
const DAYS_PER_INSTALLMENT: i64 = 30;

/// Last date of a monthly mandate: `start` plus `installments` calendar months.
///
/// A start on a day the target month lacks is clamped to that month's last day,
/// so 31 January plus one month is 28 or 29 February.
pub fn end_date(start: NaiveDate, installments: u32) -> Result<NaiveDate, Error> {
    start
        .checked_add_months(Months::new(installments))
        .ok_or_else(|| validation_error("Subscription end date is out of range"))
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Absolute expiry, in epoch milliseconds, of a setup order created at `now`.
pub fn order_expire_at(now: DateTime<Utc>) -> i64 {
    (now + TimeDelta::minutes(ORDER_EXPIRY_MINUTES)).timestamp_millis()
}

/// Absolute expiry, in epoch milliseconds, of a mandate spanning `installments` periods.
pub fn mandate_expire_at(now: DateTime<Utc>, installments: u32) -> Result<i64, Error> {
    TimeDelta::try_days(DAYS_PER_INSTALLMENT * i64::from(installments))
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .map(|expiry| expiry.timestamp_millis())
        .ok_or_else(|| validation_error("Mandate expiry is out of range"))
}

/// Merchant-side identifier: `prefix` followed by the epoch milliseconds of `now`.
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    format!("{}{}", prefix, now.timestamp_millis())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(value: &str) -> NaiveDate {
        NaiveDate::parse_from_str(value, DATE_FORMAT).unwrap()
    }

    #[test]
    fn test_end_date_is_calendar_months_later() {
        assert_eq!(end_date(date("2024-03-15"), 12).unwrap(), date("2025-03-15"));
        assert_eq!(end_date(date("2024-11-01"), 3).unwrap(), date("2025-02-01"));
    }

    #[test]
    fn test_end_date_clamps_to_month_end() {
        assert_eq!(end_date(date("2024-01-31"), 1).unwrap(), date("2024-02-29"));
        assert_eq!(end_date(date("2023-01-31"), 1).unwrap(), date("2023-02-28"));
    }

    #[test]
    fn test_expiry_offsets() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert_eq!(order_expire_at(now), 1_700_000_000_000 + 600_000);
        assert_eq!(
            mandate_expire_at(now, 12).unwrap(),
            1_700_000_000_000 + 12 * 30 * 86_400_000
        );
    }

    #[test]
    fn test_unrepresentable_mandate_expiry_is_a_validation_error() {
        let now = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
        assert!(mandate_expire_at(now, u32::MAX).unwrap_err().is_validation());
        assert!(mandate_expire_at(now, 4_000_000).unwrap_err().is_validation());
    }

    #[test]
    fn test_end_date_past_the_calendar_is_a_validation_error() {
        assert!(end_date(date("2024-03-15"), u32::MAX).unwrap_err().is_validation());
    }

    #[test]
    fn test_generate_id_uses_epoch_millis() {
        let now = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(generate_id("MO", now), "MO1700000000123");
    }
}
