use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidInput {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    Date(String),
    #[error("invalid month '{0}', expected YYYY-MM")]
    Month(String),
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, InvalidInput> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).map_err(|_| InvalidInput::Date(raw.to_string()))
}

/// Parses `YYYY-MM` into the first day of that month.
pub fn parse_month(raw: &str) -> Result<NaiveDate, InvalidInput> {
    let invalid = || InvalidInput::Month(raw.to_string());
    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year = year.parse::<i32>().map_err(|_| invalid())?;
    let month = month.parse::<u32>().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}

pub fn date_key(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Every day of the month containing `date`, ascending.
pub fn days_in_month(date: NaiveDate) -> Vec<NaiveDate> {
    let Some(first) = date.with_day(1) else {
        return Vec::new();
    };
    first
        .iter_days()
        .take_while(|day| day.month() == first.month())
        .collect()
}

/// Completion dates of a single habit.
///
/// Stored as a set of calendar dates so duplicates and input order never
/// reach the statistics code. Strings that do not parse are dropped on
/// construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompletionDates(BTreeSet<NaiveDate>);

impl CompletionDates {
    pub fn parse<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        raw.into_iter()
            .filter_map(|value| parse_date(value.as_ref()).ok())
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.0.contains(&date)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Dates on or before `today`, most recent first.
    pub fn newest_first_until(&self, today: NaiveDate) -> impl Iterator<Item = NaiveDate> + '_ {
        self.0.range(..=today).rev().copied()
    }
}

impl FromIterator<NaiveDate> for CompletionDates {
    fn from_iter<T: IntoIterator<Item = NaiveDate>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn parse_date_accepts_iso_dates() {
        assert_eq!(parse_date("2024-01-03"), Ok(ymd(2024, 1, 3)));
        assert_eq!(parse_date(" 2024-02-29 "), Ok(ymd(2024, 2, 29)));
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2023-02-29").is_err());
        assert!(parse_date("yesterday").is_err());
        assert!(parse_date("").is_err());
        assert!(parse_date("2024-01-03T10:00:00Z").is_err());
    }

    #[test]
    fn parse_month_returns_first_day() {
        assert_eq!(parse_month("2024-02"), Ok(ymd(2024, 2, 1)));
        assert_eq!(parse_month("2024-13"), Err(InvalidInput::Month("2024-13".into())));
        assert!(parse_month("202402").is_err());
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(ymd(2024, 2, 17)).len(), 29);
        assert_eq!(days_in_month(ymd(2023, 2, 1)).len(), 28);
        let december = days_in_month(ymd(2024, 12, 31));
        assert_eq!(december.first(), Some(&ymd(2024, 12, 1)));
        assert_eq!(december.last(), Some(&ymd(2024, 12, 31)));
    }

    #[test]
    fn completion_dates_dedupe_and_drop_malformed() {
        let dates = CompletionDates::parse(["2024-01-02", "bogus", "2024-01-02", "2024-01-01"]);
        assert_eq!(dates.len(), 2);
        assert!(dates.contains(ymd(2024, 1, 1)));
        assert!(!dates.contains(ymd(2024, 1, 3)));
    }

    #[test]
    fn newest_first_skips_future_dates() {
        let dates = CompletionDates::parse(["2024-01-01", "2024-01-05", "2024-01-03"]);
        let seen: Vec<_> = dates.newest_first_until(ymd(2024, 1, 4)).collect();
        assert_eq!(seen, vec![ymd(2024, 1, 3), ymd(2024, 1, 1)]);
    }

    #[test]
    fn keys_are_zero_padded() {
        assert_eq!(date_key(ymd(2024, 3, 7)), "2024-03-07");
        assert_eq!(month_key(ymd(2024, 3, 7)), "2024-03");
    }
}
