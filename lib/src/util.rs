use crate::ArcStr;
use chrono::{NaiveDate, NaiveDateTime};
use std::{fs, io, path::Path};

/// Converts a not found error to Ok(false)
pub fn path_exists(path: &Path) -> io::Result<bool> {
    match fs::metadata(path) {
        Ok(_) => Ok(true),
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound) => Ok(false),
        Err(e) => Err(e),
    }
}

// Helpers to parse fields with quirks.

/// Map the empty string and "null"/"nan" to `None`.
pub fn optional_string(s: &str) -> Option<ArcStr> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") || s.eq_ignore_ascii_case("nan") {
        None
    } else {
        Some(s.into())
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

const SLASH_DATETIME_MONTH_FIRST: &[&str] = &["%m/%d/%Y %H:%M:%S", "%m/%d/%Y %H:%M"];
const SLASH_DATETIME_DAY_FIRST: &[&str] = &["%d/%m/%Y %H:%M:%S", "%d/%m/%Y %H:%M"];

/// Parse a collection timestamp, returning `None` when it is blank or in no format we know.
///
/// Slash dates are ambiguous, so `day_first` decides between `dd/mm/yyyy` and `mm/dd/yyyy`.
/// Dates without a time are taken at midnight.
pub fn parse_timestamp(s: &str, day_first: bool) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (slash_datetime, slash_date) = if day_first {
        (SLASH_DATETIME_DAY_FIRST, "%d/%m/%Y")
    } else {
        (SLASH_DATETIME_MONTH_FIRST, "%m/%d/%Y")
    };
    DATETIME_FORMATS
        .iter()
        .chain(slash_datetime)
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .chain(Some(&slash_date))
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Title-case a string: the first cased character of each word is upper case, the rest lower.
///
/// A "word" starts after any character that is not alphabetic, so `"non-susceptible"` becomes
/// `"Non-Susceptible"`.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for ch in s.chars() {
        if prev_alpha {
            out.extend(ch.to_lowercase());
        } else {
            out.extend(ch.to_uppercase());
        }
        prev_alpha = ch.is_alphabetic();
    }
    out
}

// error printing helper.
//
pub trait ResultExt {
    fn print_error(self) -> Self;
}

impl<T> ResultExt for Result<T, anyhow::Error> {
    fn print_error(self) -> Self {
        match self {
            Ok(v) => Ok(v),
            Err(error) => {
                println!("error building antibiogram: {}", error);
                let mut err: &dyn std::error::Error = error.as_ref();
                while let Some(cause) = err.source() {
                    println!("caused by: {}", cause);
                    err = cause;
                }
                Err(error)
            }
        }
    }
}

pub fn header(header: &str) {
    let len = header.len();
    print!("\n{}\n", header);
    for _ in 0..len {
        print!("=");
    }
    println!("\n")
}

#[cfg(test)]
mod test {
    use super::{optional_string, parse_timestamp, title_case};
    use chrono::NaiveDate;

    #[test]
    fn title_case_interpretations() {
        assert_eq!(title_case("susceptible"), "Susceptible");
        assert_eq!(title_case("SUSCEPTIBLE"), "Susceptible");
        assert_eq!(title_case("sUsCePtIbLe"), "Susceptible");
        assert_eq!(title_case("non-susceptible"), "Non-Susceptible");
        assert_eq!(title_case("susceptible dose dependent"), "Susceptible Dose Dependent");
        assert_eq!(title_case(""), "");
    }

    #[test]
    fn timestamps() {
        let jan_5 = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
        assert_eq!(
            parse_timestamp("2024-01-05", false),
            jan_5.and_hms_opt(0, 0, 0)
        );
        assert_eq!(
            parse_timestamp("2024-01-05 13:45:10", false),
            jan_5.and_hms_opt(13, 45, 10)
        );
        assert_eq!(
            parse_timestamp("01/05/2024 08:30", false),
            jan_5.and_hms_opt(8, 30, 0)
        );
        assert_eq!(
            parse_timestamp("05/01/2024", true),
            jan_5.and_hms_opt(0, 0, 0)
        );
    }

    #[test]
    fn bad_timestamps_are_null() {
        assert_eq!(parse_timestamp("", false), None);
        assert_eq!(parse_timestamp("not a date", false), None);
        assert_eq!(parse_timestamp("2024-13-45", false), None);
        assert_eq!(parse_timestamp("31/01/2024", false), None);
    }

    #[test]
    fn missing_strings() {
        assert_eq!(optional_string("  "), None);
        assert_eq!(optional_string("NULL"), None);
        assert_eq!(optional_string("nan"), None);
        assert_eq!(optional_string(" Blood ").as_deref(), Some("Blood"));
    }
}
