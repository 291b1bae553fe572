use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// An inclusive date range. Dates are compared as `NaiveDate`, which orders
/// identically to the ISO "YYYY-MM-DD" string comparison the stored form uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Monday-to-Sunday week containing `date`.
    pub fn week_of(date: NaiveDate) -> Self {
        let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
        DateRange {
            start: monday,
            end: monday + Duration::days(6),
        }
    }

    /// Calendar month containing `date`.
    pub fn month_of(date: NaiveDate) -> Self {
        let start = NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap();
        let next_month = if date.month() == 12 {
            NaiveDate::from_ymd_opt(date.year() + 1, 1, 1).unwrap()
        } else {
            NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1).unwrap()
        };
        DateRange {
            start,
            end: next_month - Duration::days(1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn contains_is_inclusive_on_both_ends() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 12, 31));
        assert!(range.contains(date(2024, 6, 15)));
        assert!(range.contains(date(2024, 1, 1)));
        assert!(range.contains(date(2024, 12, 31)));
        assert!(!range.contains(date(2023, 12, 31)));
        assert!(!range.contains(date(2025, 1, 1)));
    }

    #[test]
    fn week_of_runs_monday_to_sunday() {
        // 2024-06-12 is a Wednesday.
        let range = DateRange::week_of(date(2024, 6, 12));
        assert_eq!(range.start, date(2024, 6, 10));
        assert_eq!(range.end, date(2024, 6, 16));
    }

    #[test]
    fn week_of_a_monday_starts_that_day() {
        let range = DateRange::week_of(date(2024, 6, 10));
        assert_eq!(range.start, date(2024, 6, 10));
    }

    #[test]
    fn month_of_handles_month_lengths() {
        let feb = DateRange::month_of(date(2024, 2, 14));
        assert_eq!(feb.start, date(2024, 2, 1));
        assert_eq!(feb.end, date(2024, 2, 29));

        let dec = DateRange::month_of(date(2023, 12, 5));
        assert_eq!(dec.start, date(2023, 12, 1));
        assert_eq!(dec.end, date(2023, 12, 31));
    }

    #[test]
    fn display_format() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 7));
        assert_eq!(range.to_string(), "2024-01-01 to 2024-01-07");
    }
}
