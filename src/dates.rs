use chrono::NaiveDate;

/// `DD-MM-YYYY`, the format interactive front ends ask for
pub const DEFAULT_DATE_FORMAT: &str = "%d-%m-%Y";

/// Returns whether `text` is a real calendar date in `DD-MM-YYYY` form
#[must_use]
pub fn is_valid_date(text: &str) -> bool {
    is_valid_date_with_format(text, DEFAULT_DATE_FORMAT)
}

/// Returns whether `text` is a real calendar date in the given `chrono` strftime `format`
#[must_use]
pub fn is_valid_date_with_format(text: &str, format: &str) -> bool {
    NaiveDate::parse_from_str(text, format).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_format() {
        assert!(is_valid_date("01-01-2024"));
        assert!(is_valid_date("29-02-2024"));
        assert!(!is_valid_date("29-02-2023"));
        assert!(!is_valid_date("31-04-2024"));
        assert!(!is_valid_date("2024-01-01"));
        assert!(!is_valid_date(""));
    }

    #[test]
    fn test_custom_format() {
        assert!(is_valid_date_with_format("2024-02-29", "%Y-%m-%d"));
        assert!(!is_valid_date_with_format("14-02-2020", "%Y-%m-%d"));
    }
}
