// src/services/parser.rs

//! Count parser.
//!
//! Turns stats text such as `"1,652,234 listings"` into an integer.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{AppError, Result};

/// First run of digits and commas, followed by an optional label word.
static COUNT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<number>\d[\d,]*)(?:\s*(?P<label>[^\W\d_]+))?")
        .expect("count pattern is valid")
});

/// A count read from text, with the word that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCount {
    pub value: u64,
    pub label: Option<String>,
}

/// Parse the first count in `text`.
///
/// The whole digit run is read; commas inside it are dropped wherever they
/// sit, so `"1,65"` is 165. Fails on empty text, text without digits, and values that do not fit in
/// a `u64`.
pub fn parse_count(text: &str) -> Result<ParsedCount> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(AppError::parse(text));
    }

    let caps = COUNT_PATTERN
        .captures(trimmed)
        .ok_or_else(|| AppError::parse(trimmed))?;

    let digits: String = caps["number"]
        .trim_end_matches(',')
        .chars()
        .filter(|c| *c != ',')
        .collect();
    let value = digits.parse::<u64>().map_err(|_| AppError::parse(trimmed))?;
    let label = caps.name("label").map(|m| m.as_str().to_string());

    Ok(ParsedCount { value, label })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_count_with_label() {
        let parsed = parse_count("123 results").unwrap();
        assert_eq!(parsed.value, 123);
        assert_eq!(parsed.label.as_deref(), Some("results"));
    }

    #[test]
    fn test_grouped_count() {
        assert_eq!(parse_count("1,652,234 listings").unwrap().value, 1_652_234);
    }

    #[test]
    fn test_empty_and_whitespace_fail() {
        assert!(matches!(parse_count(""), Err(AppError::Parse { .. })));
        assert!(matches!(parse_count("   \n"), Err(AppError::Parse { .. })));
    }

    #[test]
    fn test_label_without_digits_fails() {
        assert!(matches!(
            parse_count("no numbers here"),
            Err(AppError::Parse { .. })
        ));
    }

    #[test]
    fn test_first_number_wins() {
        assert_eq!(parse_count("42 items of 1,000 total").unwrap().value, 42);
    }

    #[test]
    fn test_irregular_groups_read_the_whole_run() {
        assert_eq!(parse_count("1,2345 items").unwrap().value, 12_345);
        assert_eq!(parse_count("1,65 results").unwrap().value, 165);
        assert_eq!(parse_count("12345,678 listings").unwrap().value, 12_345_678);
    }

    #[test]
    fn test_trailing_comma_is_dropped() {
        let parsed = parse_count("Found 1,200, listings").unwrap();
        assert_eq!(parsed.value, 1_200);
        assert_eq!(parsed.label.as_deref(), Some("listings"));
    }

    #[test]
    fn test_label_is_optional() {
        let parsed = parse_count("987").unwrap();
        assert_eq!(parsed.value, 987);
        assert_eq!(parsed.label, None);
    }

    #[test]
    fn test_leading_text_is_skipped() {
        assert_eq!(parse_count("Showing 2,500 results").unwrap().value, 2_500);
    }

    #[test]
    fn test_surrounding_whitespace() {
        assert_eq!(parse_count("\n  17 listings found \n").unwrap().value, 17);
    }

    #[test]
    fn test_overflow_is_an_error() {
        assert!(parse_count("99999999999999999999999 results").is_err());
    }

    #[test]
    fn test_large_counts_fit() {
        assert_eq!(
            parse_count("4,000,000,000 listings").unwrap().value,
            4_000_000_000
        );
    }
}
