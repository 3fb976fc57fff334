// Copyright (c) 2024-2025 Jesse Morgan / Morgan Forge
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Calendar month planning.
//!
//! A run processes a closed range of months. [`month_range`] walks the range
//! one first-of-month at a time and [`month_bounds`] turns each month into the
//! inclusive UTC window used to select assets.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// A calendar month, stored as the first day of that month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth(NaiveDate);

/// Error returned when a month string is not `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseMonthError(String);

impl fmt::Display for ParseMonthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid month '{}': expected YYYY-MM (e.g. 2026-01)", self.0)
    }
}

impl std::error::Error for ParseMonthError {}

impl YearMonth {
    /// Create a month from its year and 1-based month number.
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(Self)
    }

    pub fn year(&self) -> i32 {
        self.0.year()
    }

    pub fn month(&self) -> u32 {
        self.0.month()
    }

    /// First day of the month.
    pub fn first_day(&self) -> NaiveDate {
        self.0
    }

    /// The following month, or `None` past the end of the representable calendar.
    pub fn next(&self) -> Option<Self> {
        self.0.checked_add_months(Months::new(1)).map(Self)
    }

    /// The `YYYY-MM` tag used for output subdirectories.
    pub fn tag(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m"))
    }
}

impl FromStr for YearMonth {
    type Err = ParseMonthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (year, month) = trimmed
            .split_once('-')
            .ok_or_else(|| ParseMonthError(s.to_string()))?;

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if year.len() != 4 || month.len() != 2 || !all_digits(year) || !all_digits(month) {
            return Err(ParseMonthError(s.to_string()));
        }

        let year: i32 = year.parse().map_err(|_| ParseMonthError(s.to_string()))?;
        let month: u32 = month.parse().map_err(|_| ParseMonthError(s.to_string()))?;

        Self::new(year, month).ok_or_else(|| ParseMonthError(s.to_string()))
    }
}

/// Inclusive UTC window covering one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthBounds {
    /// Day 1, 00:00:00 UTC.
    pub first: DateTime<Utc>,
    /// Last day of the month, 23:59:59 UTC.
    pub last: DateTime<Utc>,
}

impl MonthBounds {
    /// Whether `instant` falls inside the window (both ends inclusive).
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        self.first <= *instant && *instant <= self.last
    }
}

/// Compute the inclusive bounds of `month`.
pub fn month_bounds(month: YearMonth) -> MonthBounds {
    let first = Utc.from_utc_datetime(&month.first_day().and_time(NaiveTime::MIN));
    let last = match month.next() {
        Some(next) => Utc.from_utc_datetime(&next.first_day().and_time(NaiveTime::MIN)) - Duration::seconds(1),
        None => Utc.from_utc_datetime(&NaiveDateTime::MAX),
    };
    MonthBounds { first, last }
}

/// Iterator over consecutive months, both ends inclusive.
///
/// Cloning the iterator restarts the walk from the clone's position.
#[derive(Debug, Clone)]
pub struct MonthRange {
    next: Option<YearMonth>,
    end: YearMonth,
}

impl Iterator for MonthRange {
    type Item = YearMonth;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next.filter(|m| *m <= self.end)?;
        self.next = current.next();
        Some(current)
    }
}

/// Months from `start` to `end` inclusive. Empty when `start > end`.
pub fn month_range(start: YearMonth, end: YearMonth) -> MonthRange {
    MonthRange {
        next: Some(start),
        end,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn ym(s: &str) -> YearMonth {
        s.parse().unwrap()
    }

    #[test]
    fn test_parse_and_display() {
        let month = ym("2026-01");
        assert_eq!(month.year(), 2026);
        assert_eq!(month.month(), 1);
        assert_eq!(month.tag(), "2026-01");
        assert_eq!(ym(" 1999-12 ").to_string(), "1999-12");
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for bad in [
            "2026-13", "2026-00", "2026-1", "26-01", "2026/01", "", "abcd-ef", "2026-01-05", "2026-+1", "+202-01",
            "-202-01",
        ] {
            assert!(bad.parse::<YearMonth>().is_err(), "{bad} should not parse");
        }
    }

    #[test]
    fn test_range_is_inclusive_and_ordered() {
        let months: Vec<_> = month_range(ym("2026-01"), ym("2026-03"))
            .map(|m| m.first_day())
            .collect();
        assert_eq!(
            months,
            vec![
                NaiveDate::from_ymd_opt(2026, 1, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 2, 1).unwrap(),
                NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            ]
        );
    }

    #[test]
    fn test_range_crosses_year_boundary() {
        let tags: Vec<_> = month_range(ym("2025-11"), ym("2026-02")).map(|m| m.tag()).collect();
        assert_eq!(tags, vec!["2025-11", "2025-12", "2026-01", "2026-02"]);
    }

    #[test]
    fn test_range_single_month() {
        assert_eq!(month_range(ym("2026-01"), ym("2026-01")).count(), 1);
    }

    #[test]
    fn test_range_empty_when_start_after_end() {
        assert_eq!(month_range(ym("2026-03"), ym("2026-01")).count(), 0);
    }

    #[test]
    fn test_range_is_restartable() {
        let range = month_range(ym("2026-01"), ym("2026-04"));
        let first_pass: Vec<_> = range.clone().collect();
        let second_pass: Vec<_> = range.collect();
        assert_eq!(first_pass, second_pass);
        assert_eq!(first_pass.len(), 4);
    }

    #[test]
    fn test_bounds_leap_february() {
        let bounds = month_bounds(ym("2024-02"));
        assert_eq!(bounds.last.day(), 29);
        assert_eq!(bounds.last.month(), 2);
        assert_eq!((bounds.last.hour(), bounds.last.minute(), bounds.last.second()), (23, 59, 59));
    }

    #[test]
    fn test_bounds_non_leap_february() {
        assert_eq!(month_bounds(ym("2023-02")).last.day(), 28);
        assert_eq!(month_bounds(ym("1900-02")).last.day(), 28);
        assert_eq!(month_bounds(ym("2000-02")).last.day(), 29);
    }

    #[test]
    fn test_last_representable_month_has_bounds() {
        let month = YearMonth(NaiveDate::MAX.with_day(1).unwrap());
        let bounds = month_bounds(month);
        assert_eq!(bounds.last.date_naive(), NaiveDate::MAX);
        assert!(bounds.first < bounds.last);
    }

    #[test]
    fn test_bounds_first_instant_and_month_lengths() {
        let bounds = month_bounds(ym("2026-04"));
        assert_eq!(bounds.first.to_rfc3339(), "2026-04-01T00:00:00+00:00");
        assert_eq!(bounds.last.to_rfc3339(), "2026-04-30T23:59:59+00:00");
        assert_eq!(month_bounds(ym("2026-12")).last.to_rfc3339(), "2026-12-31T23:59:59+00:00");
    }

    #[test]
    fn test_bounds_contains_is_inclusive() {
        let bounds = month_bounds(ym("2026-01"));
        assert!(bounds.contains(&bounds.first));
        assert!(bounds.contains(&bounds.last));
        assert!(!bounds.contains(&(bounds.first - Duration::seconds(1))));
        assert!(!bounds.contains(&(bounds.last + Duration::seconds(1))));
    }
}
