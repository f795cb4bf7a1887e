//! Date-of-birth text pattern.

use lazy_static::lazy_static;
use regex::Regex;

use super::DateOfBirth;

lazy_static! {
    // Two digits, `-` or `/`, two digits, `-` or `/`, four digits. Unanchored.
    // ASCII digits only.
    pub static ref DOB_PATTERN: Regex = Regex::new(
        r"[0-9]{2}[-/][0-9]{2}[-/][0-9]{4}"
    ).unwrap();

    pub(crate) static ref DOB_EXACT: Regex = Regex::new(
        r"^[0-9]{2}[-/][0-9]{2}[-/][0-9]{4}$"
    ).unwrap();
}

/// Find the first date-like substring in `text`, left to right.
///
/// The match is returned verbatim: separators are not normalized and day/month
/// order is not interpreted. Unrelated numbers shaped like a date win if they
/// come first.
pub fn find_date_of_birth(text: &str) -> Option<DateOfBirth> {
    DOB_PATTERN
        .find(text)
        .map(|m| DateOfBirth::from_match(m.as_str()))
}

/// Find every non-overlapping date-like substring in `text`, left to right.
pub fn find_all_dates(text: &str) -> Vec<DateOfBirth> {
    DOB_PATTERN
        .find_iter(text)
        .map(|m| DateOfBirth::from_match(m.as_str()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn first(text: &str) -> Option<String> {
        find_date_of_birth(text).map(|d| d.to_string())
    }

    #[test]
    fn test_slash_and_hyphen_dates() {
        assert_eq!(first("15/08/1995"), Some("15/08/1995".to_string()));
        assert_eq!(first("15-08-1995"), Some("15-08-1995".to_string()));
    }

    #[test]
    fn test_separators_not_normalized() {
        assert_eq!(first("DOB: 01/02/1990"), Some("01/02/1990".to_string()));
    }

    #[test]
    fn test_mixed_separators_match() {
        assert_eq!(first("issued 12-34/5678"), Some("12-34/5678".to_string()));
    }

    #[test]
    fn test_first_match_wins() {
        assert_eq!(
            first("ID# 12-34-5678 DOB 05-06-1990"),
            Some("12-34-5678".to_string())
        );
    }

    #[test]
    fn test_no_calendar_validation() {
        assert_eq!(first("32/13/9999"), Some("32/13/9999".to_string()));
    }

    #[test]
    fn test_unanchored_inside_longer_numbers() {
        assert_eq!(first("123/45/67890"), Some("23/45/6789".to_string()));
        assert_eq!(first("DOB15/08/1995X"), Some("15/08/1995".to_string()));
    }

    #[test]
    fn test_no_match() {
        assert_eq!(first(""), None);
        assert_eq!(first("JANE DOE\nNATIONALITY: XYZ"), None);
        assert_eq!(first("1/2/1990"), None);
        assert_eq!(first("15.08.1995"), None);
        assert_eq!(first("15/08/95"), None);
        assert_eq!(first("1995-08-15"), None);
    }

    #[test]
    fn test_non_ascii_digits_do_not_match() {
        // Arabic-Indic digits
        assert_eq!(first("١٥/٠٨/١٩٩٥"), None);
    }

    #[test]
    fn test_find_all_in_order() {
        let all: Vec<String> = find_all_dates("ID# 12-34-5678 DOB 05-06-1990 EXP 01/01/2030")
            .into_iter()
            .map(|d| d.to_string())
            .collect();

        assert_eq!(all, vec!["12-34-5678", "05-06-1990", "01/01/2030"]);
    }
}
