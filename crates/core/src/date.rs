//! DD/MM/YYYY date handling.
//!
//! Dates are typed as raw digits and masked into `DD/MM/YYYY` as the user types. A masked
//! string is only accepted as a date when the day, month and year survive a round trip
//! through calendar date construction, which rejects impossible dates such as 31/02.

use crate::constants::MONTH_NAMES;
use crate::words::parse_leading_int;
use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

const DAY_PLACEHOLDER: &str = "__";
const MONTH_PLACEHOLDER: &str = "______";
const YEAR_PLACEHOLDER: &str = "____";

fn date_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^[0-9]{2}/[0-9]{2}/[0-9]{4}$").expect("static date pattern"))
}

/// Masks raw input into `DD/MM/YYYY`.
///
/// Every non-digit is dropped, a `/` is inserted after the second digit once a third is
/// typed, and a second `/` after the fourth once a fifth is typed. At most eight digits
/// are kept.
pub fn mask_date_input(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        0..=2 => digits,
        3..=4 => format!("{}/{}", &digits[..2], &digits[2..]),
        len => format!(
            "{}/{}/{}",
            &digits[..2],
            &digits[2..4],
            &digits[4..len.min(8)]
        ),
    }
}

/// Returns `true` if `value` is a real calendar date in `DD/MM/YYYY` form.
///
/// Years below 100 are rejected: two-digit-era years never round-trip through the
/// calendar construction the masking was designed against.
pub fn is_valid_date(value: &str) -> bool {
    parse_date(value).is_some()
}

/// Parses a `DD/MM/YYYY` string into a calendar date.
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    if !date_pattern().is_match(value) {
        return None;
    }

    let mut parts = value.split('/').map(str::parse::<u32>);
    let (Some(Ok(day)), Some(Ok(month)), Some(Ok(year))) = (parts.next(), parts.next(), parts.next())
    else {
        return None;
    };

    if year < 100 {
        return None;
    }

    let year = i32::try_from(year).ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
        .filter(|date| date.day() == day && date.month() == month && date.year() == year)
}

/// Formats a calendar date as `DD/MM/YYYY`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

/// Today's local date as `DD/MM/YYYY`.
pub fn today() -> String {
    format_date(Local::now().date_naive())
}

/// Validation state of an optional date field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStatus {
    /// Nothing entered yet. Not an error.
    Empty,
    Valid,
    Invalid,
}

impl DateStatus {
    pub fn of(value: &str) -> Self {
        if value.is_empty() {
            DateStatus::Empty
        } else if is_valid_date(value) {
            DateStatus::Valid
        } else {
            DateStatus::Invalid
        }
    }

    pub fn is_invalid(self) -> bool {
        self == DateStatus::Invalid
    }
}

/// A date split for the certificate footer: `"{day} de {month} de {year}"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LongDate {
    pub day: String,
    pub month: String,
    pub year: String,
}

impl LongDate {
    /// Splits a `DD/MM/YYYY` string, substituting underscores for anything missing.
    ///
    /// Strings shorter than ten characters or without exactly three parts produce the
    /// full placeholder. An out-of-range month only blanks the month.
    pub fn from_masked(value: &str) -> Self {
        if value.chars().count() < 10 {
            return Self::placeholder();
        }

        let parts: Vec<&str> = value.split('/').collect();
        let [day, month, year] = parts.as_slice() else {
            return Self::placeholder();
        };

        let month_name = parse_leading_int(month)
            .and_then(|m| usize::try_from(m - 1).ok())
            .and_then(|index| MONTH_NAMES.get(index))
            .copied()
            .unwrap_or(MONTH_PLACEHOLDER);

        Self {
            day: (*day).to_string(),
            month: month_name.to_string(),
            year: (*year).to_string(),
        }
    }

    fn placeholder() -> Self {
        Self {
            day: DAY_PLACEHOLDER.into(),
            month: MONTH_PLACEHOLDER.into(),
            year: YEAR_PLACEHOLDER.into(),
        }
    }
}

impl std::fmt::Display for LongDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} de {} de {}", self.day, self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_inserts_separators_as_digits_arrive() {
        assert_eq!(mask_date_input(""), "");
        assert_eq!(mask_date_input("1"), "1");
        assert_eq!(mask_date_input("18"), "18");
        assert_eq!(mask_date_input("181"), "18/1");
        assert_eq!(mask_date_input("1810"), "18/10");
        assert_eq!(mask_date_input("18102"), "18/10/2");
        assert_eq!(mask_date_input("18102026"), "18/10/2026");
    }

    #[test]
    fn test_mask_drops_non_digits_and_extra_digits() {
        assert_eq!(mask_date_input("18/10/2026"), "18/10/2026");
        assert_eq!(mask_date_input("18-10-2026"), "18/10/2026");
        assert_eq!(mask_date_input("1810202699"), "18/10/2026");
        assert_eq!(mask_date_input("ab"), "");
    }

    #[test]
    fn test_valid_dates_round_trip() {
        assert!(is_valid_date("29/02/2024"));
        assert!(is_valid_date("31/12/1999"));
        assert!(is_valid_date("01/01/2026"));
    }

    #[test]
    fn test_impossible_dates_are_rejected() {
        assert!(!is_valid_date("31/02/2024"));
        assert!(!is_valid_date("29/02/2023"));
        assert!(!is_valid_date("31/04/2026"));
        assert!(!is_valid_date("00/01/2026"));
        assert!(!is_valid_date("10/13/2026"));
    }

    #[test]
    fn test_malformed_dates_are_rejected() {
        assert!(!is_valid_date(""));
        assert!(!is_valid_date("1/1/2026"));
        assert!(!is_valid_date("18/10/26"));
        assert!(!is_valid_date("18-10-2026"));
        assert!(!is_valid_date("18/10/2026 "));
        assert!(!is_valid_date("01/01/0050"));
    }

    #[test]
    fn test_date_status() {
        assert_eq!(DateStatus::of(""), DateStatus::Empty);
        assert_eq!(DateStatus::of("18/10/2026"), DateStatus::Valid);
        assert_eq!(DateStatus::of("18/10"), DateStatus::Invalid);
        assert!(!DateStatus::Empty.is_invalid());
        assert!(DateStatus::Invalid.is_invalid());
    }

    #[test]
    fn test_format_date_zero_pads() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(format_date(date), "07/03/2026");
    }

    #[test]
    fn test_today_is_a_valid_masked_date() {
        let today = today();
        assert!(is_valid_date(&today));
        assert_eq!(mask_date_input(&today), today);
    }

    #[test]
    fn test_long_date() {
        let long = LongDate::from_masked("18/10/2026");
        assert_eq!(long.to_string(), "18 de outubro de 2026");
    }

    #[test]
    fn test_long_date_placeholders() {
        assert_eq!(
            LongDate::from_masked("18/10").to_string(),
            "__ de ______ de ____"
        );
        assert_eq!(
            LongDate::from_masked("18/13/2026").to_string(),
            "18 de ______ de 2026"
        );
        assert_eq!(
            LongDate::from_masked("1810202600").to_string(),
            "__ de ______ de ____"
        );
    }
}
