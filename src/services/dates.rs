//! Free-text timestamp normalization.
//!
//! Listing rows carry dates like `Posted by Anonymous at 05 Mar 2024 13:45:00 UTC`.
//! [`normalize`] strips the noise around the timestamp, swaps the month name for
//! its number and parses the residue as `DD-MM-YYYY HH:mm:ss` in UTC.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use regex::Regex;

use crate::error::{AppError, Result};

/// Words removed (as whole words) before parsing.
pub const NOISE_WORDS: [&str; 4] = ["posted by", "at", "utc", "anonymous"];

/// Month names in scan order. Only the first match is replaced.
pub const MONTHS: [(&str, &str); 12] = [
    ("jan", "01"),
    ("feb", "02"),
    ("mar", "03"),
    ("apr", "04"),
    ("may", "05"),
    ("jun", "06"),
    ("jul", "07"),
    ("aug", "08"),
    ("sep", "09"),
    ("oct", "10"),
    ("nov", "11"),
    ("dec", "12"),
];

/// Residual shape after cleanup.
pub const DATE_FORMAT: &str = "%d-%m-%Y %H:%M:%S";

static NOISE: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives = NOISE_WORDS
        .iter()
        .map(|w| regex::escape(w))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"\b(?:{alternatives})\b")).expect("noise pattern is valid")
});

static SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\d{2}-\d{2}-\d{4} \d{2}:\d{2}:\d{2}$").expect("shape pattern is valid")
});

/// Parse a listing date text into a UTC instant.
pub fn normalize(raw: &str) -> Result<DateTime<Utc>> {
    let cleaned = clean(raw);
    if !SHAPE.is_match(&cleaned) {
        return Err(AppError::invalid_date(raw));
    }
    NaiveDateTime::parse_from_str(&cleaned, DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| AppError::invalid_date(raw))
}

/// Reduce raw text to the `DD-MM-YYYY HH:mm:ss` candidate.
fn clean(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let stripped = NOISE.replace_all(&lowered, " ").replace(',', " ");
    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    substitute_month(&collapsed)
}

fn substitute_month(text: &str) -> String {
    for (name, number) in MONTHS {
        if text.contains(name) {
            return text.replacen(&format!(" {name} "), &format!("-{number}-"), 1);
        }
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_anonymous_posting() {
        let parsed = normalize("Posted by Anonymous at 05 Mar 2024 13:45:00 UTC").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 5, 13, 45, 0).unwrap());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let raw = "Posted by Anonymous at 05 Mar 2024 13:45:00 UTC";
        assert_eq!(normalize(raw).unwrap(), normalize(raw).unwrap());
    }

    #[test]
    fn test_normalize_trailing_text_node() {
        // Author sits in its own link; the date node keeps the tail.
        let parsed = normalize("\n      at 31 Dec 2023, 23:59:59 UTC\n    ").unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2023, 12, 31, 23, 59, 59).unwrap());
    }

    #[test]
    fn test_normalize_every_month() {
        for (i, (name, _)) in MONTHS.iter().enumerate() {
            let raw = format!("at 01 {name} 2020 00:00:00 UTC");
            let parsed = normalize(&raw).unwrap();
            assert_eq!(
                parsed,
                Utc.with_ymd_and_hms(2020, i as u32 + 1, 1, 0, 0, 0).unwrap(),
                "{raw}"
            );
        }
    }

    #[test]
    fn test_normalize_rejects_unknown_month() {
        assert!(matches!(
            normalize("Posted by Anonymous at 05 Foo 2024 13:45:00 UTC"),
            Err(AppError::InvalidDateFormat { .. })
        ));
    }

    #[test]
    fn test_normalize_rejects_single_digit_day() {
        assert!(normalize("at 5 Mar 2024 13:45:00 UTC").is_err());
    }

    #[test]
    fn test_normalize_rejects_out_of_range_values() {
        assert!(normalize("at 31 Feb 2024 13:45:00 UTC").is_err());
        assert!(normalize("at 05 Mar 2024 25:00:00 UTC").is_err());
    }

    #[test]
    fn test_normalize_rejects_empty() {
        let err = normalize("").unwrap_err();
        assert!(matches!(err, AppError::InvalidDateFormat { raw } if raw.is_empty()));
    }

    #[test]
    fn test_clean_keeps_only_timestamp() {
        assert_eq!(
            clean("Posted by Anonymous at 05 Mar 2024 13:45:00 UTC"),
            "05-03-2024 13:45:00"
        );
    }
}
