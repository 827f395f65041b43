//! Worked-hours computation from daily time-clock punches
//!
//! Deterministic arithmetic over check-in/check-out and break punches.
//! A day splits into a regular portion (capped at the standard 8 hours) and
//! an overtime portion; the overtime portion feeds its own payroll event
//! downstream.

use chrono::NaiveTime;

/// Standard contracted hours per day
pub const STANDARD_DAILY_HOURS: f64 = 8.0;

/// Overtime pay multiplier (50% premium)
pub const OVERTIME_MULTIPLIER: f64 = 1.5;

/// Regular/overtime split of one day's worked hours
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HoursSplit {
    pub regular: f64,
    pub overtime: f64,
}

/// Compute total worked hours for a day: (checkout - checkin) minus the break
/// span, clamped to >= 0. Missing punches yield 0.
pub fn compute_worked_hours(
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    break_start: Option<NaiveTime>,
    break_end: Option<NaiveTime>,
) -> f64 {
    let (check_in, check_out) = match (check_in, check_out) {
        (Some(ci), Some(co)) => (ci, co),
        _ => return 0.0,
    };

    let mut minutes = (check_out - check_in).num_minutes() as f64;

    if let (Some(bs), Some(be)) = (break_start, break_end) {
        minutes -= (be - bs).num_minutes() as f64;
    }

    (minutes / 60.0).max(0.0)
}

/// Split total worked hours into regular (capped at 8h) and overtime portions
pub fn split_hours(worked: f64) -> HoursSplit {
    HoursSplit {
        regular: worked.min(STANDARD_DAILY_HOURS),
        overtime: (worked - STANDARD_DAILY_HOURS).max(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> Option<NaiveTime> {
        NaiveTime::from_hms_opt(h, m, 0)
    }

    #[test]
    fn test_regular_day_with_break() {
        // 08:00-17:00 with 12:00-13:00 break = 8h
        let worked = compute_worked_hours(t(8, 0), t(17, 0), t(12, 0), t(13, 0));
        assert_eq!(worked, 8.0);

        let split = split_hours(worked);
        assert_eq!(split.regular, 8.0);
        assert_eq!(split.overtime, 0.0);
    }

    #[test]
    fn test_overtime_day_splits() {
        // 08:00-19:00 with 12:00-13:00 break = 10h -> 8h regular + 2h overtime
        let worked = compute_worked_hours(t(8, 0), t(19, 0), t(12, 0), t(13, 0));
        assert_eq!(worked, 10.0);

        let split = split_hours(worked);
        assert_eq!(split.regular, 8.0);
        assert_eq!(split.overtime, 2.0);
    }

    #[test]
    fn test_no_break_punches() {
        let worked = compute_worked_hours(t(9, 0), t(15, 30), None, None);
        assert_eq!(worked, 6.5);
    }

    #[test]
    fn test_missing_punch_yields_zero() {
        assert_eq!(compute_worked_hours(t(8, 0), None, None, None), 0.0);
        assert_eq!(compute_worked_hours(None, t(17, 0), None, None), 0.0);
        assert_eq!(compute_worked_hours(None, None, None, None), 0.0);
    }

    #[test]
    fn test_inverted_punches_clamp_to_zero() {
        // Checkout before checkin cannot produce negative hours
        assert_eq!(compute_worked_hours(t(17, 0), t(8, 0), None, None), 0.0);
    }

    #[test]
    fn test_partial_day_has_no_overtime() {
        let split = split_hours(4.0);
        assert_eq!(split.regular, 4.0);
        assert_eq!(split.overtime, 0.0);
    }
}
