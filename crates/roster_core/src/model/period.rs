//! Date ranges used for planning, exporting and fairness accounting.

use chrono::{DateTime, Datelike, Months, NaiveDate};
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("period start {start} is after end {end}")]
    Reversed { start: NaiveDate, end: NaiveDate },
    #[error("cannot parse `{0}` as YYYY-MM-DD or RFC 3339 date")]
    Unparseable(String),
    #[error("date {0} is outside the supported calendar range")]
    OutOfRange(NaiveDate),
}

/// Inclusive date range `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Period {
    start: NaiveDate,
    end: NaiveDate,
}

impl Period {
    /// Builds a period, rejecting ranges whose start lies after their end.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Reversed { start, end });
        }
        Ok(Self { start, end })
    }

    /// Parses both bounds from `YYYY-MM-DD` or RFC 3339 text.
    pub fn parse(start: &str, end: &str) -> Result<Self, PeriodError> {
        Self::new(parse_date(start)?, parse_date(end)?)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }
}

/// Half-open range `[start, end)` over which prior assignments are counted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FairnessWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FairnessWindow {
    /// The calendar month that contains `date`.
    pub fn month_containing(date: NaiveDate) -> Result<Self, PeriodError> {
        let start = date
            .with_day(1)
            .ok_or(PeriodError::OutOfRange(date))?;
        let end = start
            .checked_add_months(Months::new(1))
            .ok_or(PeriodError::OutOfRange(date))?;
        Ok(Self { start, end })
    }
}

/// Accepts `2024-03-01` as well as `2024-03-01T10:00:00+01:00`; the time part
/// is dropped after applying the given offset.
pub fn parse_date(value: &str) -> Result<NaiveDate, PeriodError> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|timestamp| timestamp.date_naive())
        .map_err(|_| PeriodError::Unparseable(value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn new_rejects_reversed_range() {
        let err = Period::new(date(2024, 3, 2), date(2024, 3, 1)).unwrap_err();
        assert!(matches!(err, PeriodError::Reversed { .. }));
    }

    #[test]
    fn single_day_period_is_valid() {
        let period = Period::new(date(2024, 3, 1), date(2024, 3, 1)).unwrap();
        assert_eq!(period.start(), period.end());
    }

    #[test]
    fn parse_accepts_date_and_rfc3339() {
        let period = Period::parse("2024-03-01", "2024-03-31T23:00:00Z").unwrap();
        assert_eq!(period.start(), date(2024, 3, 1));
        assert_eq!(period.end(), date(2024, 3, 31));

        let err = Period::parse("01.03.2024", "2024-03-31").unwrap_err();
        assert_eq!(err, PeriodError::Unparseable("01.03.2024".to_string()));
    }

    #[test]
    fn fairness_window_is_half_open_month() {
        let window = FairnessWindow::month_containing(date(2024, 2, 15)).unwrap();
        assert_eq!(window.start, date(2024, 2, 1));
        assert_eq!(window.end, date(2024, 3, 1));

        let december = FairnessWindow::month_containing(date(2024, 12, 31)).unwrap();
        assert_eq!(december.end, date(2025, 1, 1));
    }
}
