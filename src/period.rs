//! Payroll period handling
//!
//! A period is a calendar month identified by a "YYYY-MM" string. All raw-data
//! queries are scoped to the month's real date bounds (not a fixed day-31 cap).

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur when parsing a period string
#[derive(Debug, Error, PartialEq)]
pub enum PeriodError {
    #[error("Period must be formatted as YYYY-MM, got: {0}")]
    InvalidFormat(String),

    #[error("Period month must be between 01 and 12, got: {0}")]
    InvalidMonth(u32),
}

/// A parsed payroll period (one calendar month)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    /// Parse a "YYYY-MM" period string
    pub fn parse(s: &str) -> Result<Period, PeriodError> {
        let (year_part, month_part) = match s.split_once('-') {
            Some(parts) => parts,
            None => return Err(PeriodError::InvalidFormat(s.to_string())),
        };

        if year_part.len() != 4 || month_part.len() != 2 {
            return Err(PeriodError::InvalidFormat(s.to_string()));
        }

        let year: i32 = year_part
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;
        let month: u32 = month_part
            .parse()
            .map_err(|_| PeriodError::InvalidFormat(s.to_string()))?;

        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }

        Ok(Period { year, month })
    }

    /// First day of the month
    pub fn first_day(&self) -> NaiveDate {
        // Safe: month validated at parse time
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
            .unwrap_or_else(|| NaiveDate::from_ymd_opt(self.year, 1, 1).expect("valid date"))
    }

    /// Last day of the month (handles 28/29/30/31-day months)
    pub fn last_day(&self) -> NaiveDate {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };

        NaiveDate::from_ymd_opt(next_year, next_month, 1)
            .expect("valid date")
            .pred_opt()
            .expect("valid date")
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_period() {
        let period = Period::parse("2024-03").unwrap();
        assert_eq!(period.year, 2024);
        assert_eq!(period.month, 3);
        assert_eq!(period.to_string(), "2024-03");
    }

    #[test]
    fn test_parse_rejects_bad_format() {
        assert_eq!(
            Period::parse("202403"),
            Err(PeriodError::InvalidFormat("202403".to_string()))
        );
        assert_eq!(
            Period::parse("2024-3"),
            Err(PeriodError::InvalidFormat("2024-3".to_string()))
        );
        assert_eq!(
            Period::parse("abcd-ef"),
            Err(PeriodError::InvalidFormat("abcd-ef".to_string()))
        );
    }

    #[test]
    fn test_parse_rejects_bad_month() {
        assert_eq!(Period::parse("2024-13"), Err(PeriodError::InvalidMonth(13)));
        assert_eq!(Period::parse("2024-00"), Err(PeriodError::InvalidMonth(0)));
    }

    #[test]
    fn test_month_bounds() {
        let march = Period::parse("2024-03").unwrap();
        assert_eq!(march.first_day(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(march.last_day(), NaiveDate::from_ymd_opt(2024, 3, 31).unwrap());

        // Leap-year February
        let feb = Period::parse("2024-02").unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        // December rolls into the next year
        let dec = Period::parse("2023-12").unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    }
}
