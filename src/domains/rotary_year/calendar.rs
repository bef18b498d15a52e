//! Rotary-year calendar arithmetic.
//!
//! A rotary (fiscal) year runs from July 1 to June 30 and is identified by a
//! `"YYYY-YYYY"` label whose second year is the first plus one. Everything in
//! here is pure; the only clock read is in [`current_fiscal_year`], which takes
//! the club's UTC offset so that "today" is the club's local today.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::{DomainError, DomainResult};
use crate::types::DateRange;
use crate::validation::fiscal_year_label_regex;

/// First month (1-based) of a rotary year
pub const FISCAL_YEAR_START_MONTH: u32 = 7;

const MIN_START_YEAR: i32 = 1000;
const MAX_START_YEAR: i32 = 9998;

/// A validated rotary year, identified by the calendar year it starts in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FiscalYear {
    start_year: i32,
}

impl FiscalYear {
    pub fn from_start_year(start_year: i32) -> DomainResult<Self> {
        if !(MIN_START_YEAR..=MAX_START_YEAR).contains(&start_year) {
            return Err(DomainError::InvalidFiscalYear(format!(
                "start year {} is outside {}..={}",
                start_year, MIN_START_YEAR, MAX_START_YEAR
            )));
        }
        Ok(Self { start_year })
    }

    /// Parse a `"YYYY-YYYY"` label
    pub fn parse(label: &str) -> DomainResult<Self> {
        if !fiscal_year_label_regex().is_match(label) {
            return Err(DomainError::InvalidFiscalYear(label.to_string()));
        }
        let invalid = || DomainError::InvalidFiscalYear(label.to_string());
        let (first, second) = label.split_once('-').ok_or_else(invalid)?;
        let first: i32 = first.parse().map_err(|_| invalid())?;
        let second: i32 = second
            .parse()
            .map_err(|_| invalid())?;
        if second != first + 1 {
            return Err(invalid());
        }
        Self::from_start_year(first)
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn end_year(&self) -> i32 {
        self.start_year + 1
    }

    pub fn label(&self) -> String {
        format!("{:04}-{:04}", self.start_year, self.end_year())
    }

    /// July 1 of the start year. Saturates at the ends of chrono's range.
    pub fn start_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.start_year, FISCAL_YEAR_START_MONTH, 1).unwrap_or(NaiveDate::MIN)
    }

    /// June 30 of the end year. Saturates at the ends of chrono's range.
    pub fn end_date(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.end_year(), 6, 30).unwrap_or(NaiveDate::MAX)
    }

    pub fn bounds(&self) -> DateRange {
        DateRange::new(self.start_date(), self.end_date())
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.bounds().contains(date)
    }

    /// Timestamp variant of [`contains`](Self::contains). The end bound is
    /// inclusive to the end of June 30.
    pub fn contains_datetime(&self, at: NaiveDateTime) -> bool {
        at.date() >= self.start_date() && at.date() <= self.end_date()
    }

    pub fn previous(&self) -> DomainResult<Self> {
        Self::from_start_year(self.start_year - 1)
    }

    pub fn next(&self) -> DomainResult<Self> {
        Self::from_start_year(self.start_year + 1)
    }
}

impl fmt::Display for FiscalYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

impl FromStr for FiscalYear {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for FiscalYear {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.label())
    }
}

impl<'de> Deserialize<'de> for FiscalYear {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        FiscalYear::parse(&label).map_err(serde::de::Error::custom)
    }
}

/// The rotary year a calendar date falls in
pub fn fiscal_year_of(date: NaiveDate) -> FiscalYear {
    let start_year = if date.month() >= FISCAL_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };
    FiscalYear { start_year }
}

/// The rotary year of `now`, read in the club's local offset
pub fn fiscal_year_at(now: DateTime<Utc>, offset: FixedOffset) -> FiscalYear {
    fiscal_year_of(now.with_timezone(&offset).date_naive())
}

pub fn current_fiscal_year(offset: FixedOffset) -> FiscalYear {
    fiscal_year_at(Utc::now(), offset)
}

// --- Label-level API used at the host boundary ---

pub fn is_valid(label: &str) -> bool {
    FiscalYear::parse(label).is_ok()
}

pub fn bounds_of(label: &str) -> DomainResult<DateRange> {
    Ok(FiscalYear::parse(label)?.bounds())
}

pub fn contains(date: NaiveDate, label: &str) -> DomainResult<bool> {
    Ok(FiscalYear::parse(label)?.contains(date))
}

pub fn previous(label: &str) -> DomainResult<String> {
    Ok(FiscalYear::parse(label)?.previous()?.label())
}

pub fn next(label: &str) -> DomainResult<String> {
    Ok(FiscalYear::parse(label)?.next()?.label())
}

/// Rotary years starting between `from_start_year` and `to_start_year`
/// inclusive, most recent first. Empty when the bounds are reversed.
pub fn list_years(from_start_year: i32, to_start_year: i32) -> DomainResult<Vec<FiscalYear>> {
    if from_start_year > to_start_year {
        return Ok(Vec::new());
    }
    FiscalYear::from_start_year(from_start_year)?;
    FiscalYear::from_start_year(to_start_year)?;
    Ok((from_start_year..=to_start_year)
        .rev()
        .map(|start_year| FiscalYear { start_year })
        .collect())
}

/// [`list_years`] up to and including the current rotary year
pub fn list_years_until_current(from_start_year: i32, offset: FixedOffset) -> DomainResult<Vec<FiscalYear>> {
    list_years(from_start_year, current_fiscal_year(offset).start_year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_second_half_of_calendar_year_starts_fiscal_year() {
        for month in 7..=12 {
            for year in [1999, 2024, 2025] {
                let fy = fiscal_year_of(date(year, month, 1));
                assert_eq!(fy.label(), format!("{}-{}", year, year + 1));
            }
        }
    }

    #[test]
    fn test_first_half_of_calendar_year_ends_fiscal_year() {
        for month in 1..=6 {
            for year in [2000, 2024, 2025] {
                let fy = fiscal_year_of(date(year, month, 28));
                assert_eq!(fy.label(), format!("{}-{}", year - 1, year));
            }
        }
    }

    #[test]
    fn test_boundary_dates() {
        assert_eq!(fiscal_year_of(date(2025, 6, 30)).label(), "2024-2025");
        assert_eq!(fiscal_year_of(date(2025, 7, 1)).label(), "2025-2026");
        assert_eq!(fiscal_year_of(date(2024, 12, 31)).label(), "2024-2025");
        assert_eq!(fiscal_year_of(date(2025, 1, 1)).label(), "2024-2025");
    }

    #[test]
    fn test_every_date_is_contained_in_its_own_fiscal_year() {
        let mut day = date(2023, 1, 1);
        let last = date(2026, 12, 31);
        while day <= last {
            let label = fiscal_year_of(day).label();
            assert!(contains(day, &label).unwrap(), "{} not in {}", day, label);
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_bounds() {
        let range = bounds_of("2024-2025").unwrap();
        assert_eq!(range.start, date(2024, 7, 1));
        assert_eq!(range.end, date(2025, 6, 30));
        assert!(!contains(date(2024, 6, 30), "2024-2025").unwrap());
        assert!(!contains(date(2025, 7, 1), "2024-2025").unwrap());
    }

    #[test]
    fn test_end_of_day_is_inclusive() {
        let fy = FiscalYear::parse("2024-2025").unwrap();
        let last_second = date(2025, 6, 30).and_hms_opt(23, 59, 59).unwrap();
        let next_midnight = date(2025, 7, 1).and_hms_opt(0, 0, 0).unwrap();
        assert!(fy.contains_datetime(last_second));
        assert!(!fy.contains_datetime(next_midnight));
    }

    #[test]
    fn test_previous_and_next_are_inverse() {
        for label in ["1999-2000", "2024-2025", "2030-2031"] {
            assert_eq!(previous(&next(label).unwrap()).unwrap(), label);
            assert_eq!(next(&previous(label).unwrap()).unwrap(), label);
        }
        assert_eq!(next("2024-2025").unwrap(), "2025-2026");
        assert_eq!(previous("2024-2025").unwrap(), "2023-2024");
    }

    #[test]
    fn test_is_valid() {
        assert!(is_valid("2024-2025"));
        assert!(!is_valid("2024-2026"));
        assert!(!is_valid("2025-2024"));
        assert!(!is_valid("abc"));
        assert!(!is_valid("2024-25"));
        assert!(!is_valid(""));
        // Non-ASCII digits must be rejected, not panic on a char boundary
        assert!(!is_valid("२०२४-२०२५"));
        assert!(FiscalYear::parse("٢٠٢٤-٢٠٢٥").is_err());
    }

    #[test]
    fn test_extreme_dates_do_not_panic() {
        let last = fiscal_year_of(NaiveDate::MAX);
        assert_eq!(last.end_date(), NaiveDate::MAX);
        assert!(last.contains(NaiveDate::MAX));
        assert_eq!(fiscal_year_of(NaiveDate::MIN).start_date(), NaiveDate::MIN);
    }

    #[test]
    fn test_malformed_labels_fail_loudly() {
        assert!(matches!(bounds_of("2025-2027"), Err(DomainError::InvalidFiscalYear(_))));
        assert!(matches!(contains(date(2025, 1, 1), "nope"), Err(DomainError::InvalidFiscalYear(_))));
        assert!(matches!(previous("2024"), Err(DomainError::InvalidFiscalYear(_))));
        assert!(matches!(next("9998-9999"), Err(DomainError::InvalidFiscalYear(_))));
    }

    #[test]
    fn test_list_years_is_descending_and_inclusive() {
        let labels: Vec<String> = list_years(2021, 2024).unwrap().iter().map(|fy| fy.label()).collect();
        assert_eq!(labels, vec!["2024-2025", "2023-2024", "2022-2023", "2021-2022"]);
        assert!(list_years(2025, 2024).unwrap().is_empty());
        assert_eq!(list_years(2024, 2024).unwrap().len(), 1);
    }

    #[test]
    fn test_current_year_uses_club_offset() {
        // 2025-06-30T20:00Z is already July 1 in UTC+08:00
        let now = Utc.with_ymd_and_hms(2025, 6, 30, 20, 0, 0).unwrap();
        let utc = FixedOffset::east_opt(0).unwrap();
        let myt = FixedOffset::east_opt(8 * 3600).unwrap();
        assert_eq!(fiscal_year_at(now, utc).label(), "2024-2025");
        assert_eq!(fiscal_year_at(now, myt).label(), "2025-2026");
    }

    #[test]
    fn test_serde_uses_label() {
        let fy = FiscalYear::parse("2024-2025").unwrap();
        assert_eq!(serde_json::to_string(&fy).unwrap(), "\"2024-2025\"");
        let back: FiscalYear = serde_json::from_str("\"2024-2025\"").unwrap();
        assert_eq!(back, fy);
        assert!(serde_json::from_str::<FiscalYear>("\"2024-2026\"").is_err());
    }
}
