//! SLA interval arithmetic.
//!
//! The allowed gap between two verified cleanings assumes cleanings are
//! spread uniformly over the day. Building cleaning windows are not taken
//! into account.

use chrono::TimeDelta;
use tracing::warn;

/// Milliseconds in one day.
pub const DAY_MS: i64 = 86_400_000;

/// Milliseconds in one hour.
pub const HOUR_MS: i64 = 3_600_000;

/// Maximum tolerated interval between two verified cleanings, in
/// milliseconds.
///
/// A non-positive `required_cleanings_per_day` is a building configuration
/// error; it is logged and treated as one cleaning per day.
///
/// # Examples
/// ```
/// use vericlean::domain::sla::{max_gap_ms, HOUR_MS};
///
/// assert_eq!(max_gap_ms(6), 4 * HOUR_MS);
/// assert_eq!(max_gap_ms(0), 24 * HOUR_MS);
/// ```
#[must_use]
pub fn max_gap_ms(required_cleanings_per_day: i64) -> i64 {
    let required = if required_cleanings_per_day <= 0 {
        warn!(
            required_cleanings_per_day,
            "invalid required_cleanings_per_day; defaulting to 1"
        );
        1
    } else {
        required_cleanings_per_day
    };
    DAY_MS / required
}

/// [`max_gap_ms`] as a [`TimeDelta`].
#[must_use]
pub fn max_gap(required_cleanings_per_day: i64) -> TimeDelta {
    TimeDelta::milliseconds(max_gap_ms(required_cleanings_per_day))
}

/// Round a millisecond duration to hours with two decimal places.
///
/// # Examples
/// ```
/// use vericlean::domain::sla::hours_rounded;
///
/// assert_eq!(hours_rounded(5 * 3_600_000), 5.0);
/// assert_eq!(hours_rounded(3_600_000 / 3), 0.33);
/// ```
#[must_use]
pub fn hours_rounded(duration_ms: i64) -> f64 {
    #[allow(
        clippy::cast_precision_loss,
        reason = "cleaning gaps are far below 2^52 milliseconds"
    )]
    let hours = duration_ms as f64 / HOUR_MS as f64;
    (hours * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, DAY_MS)]
    #[case(2, 12 * HOUR_MS)]
    #[case(3, 8 * HOUR_MS)]
    #[case(6, 4 * HOUR_MS)]
    #[case(7, 12_342_857)]
    fn divides_the_day_evenly(#[case] required: i64, #[case] expected: i64) {
        assert_eq!(max_gap_ms(required), expected);
    }

    #[rstest]
    #[case(0)]
    #[case(-3)]
    fn non_positive_requirement_defaults_to_one(#[case] required: i64) {
        assert_eq!(max_gap_ms(required), DAY_MS);
    }

    #[test]
    fn max_gap_matches_millis() {
        assert_eq!(max_gap(6), TimeDelta::hours(4));
    }

    #[rstest]
    #[case(0, 0.0)]
    #[case(HOUR_MS / 2, 0.5)]
    #[case(18_000_000, 5.0)]
    #[case(18_018_000, 5.01)]
    #[case(18_017_999, 5.0)]
    fn rounds_to_two_decimals(#[case] ms: i64, #[case] expected: f64) {
        assert!((hours_rounded(ms) - expected).abs() < f64::EPSILON);
    }
}
