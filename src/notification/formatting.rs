//! Locale-aware date formatting for template parameters

use chrono::{DateTime, Locale, Utc};

const US_LONG_DATE_TIME: &str = "%A, %B %-d, %Y %-I:%M:%S %p";
const GERMAN_LONG_DATE_TIME: &str = "%A, %-d. %B %Y %H:%M:%S";
const DEFAULT_LONG_DATE_TIME: &str = "%A, %-d %B %Y %H:%M:%S";

/// Map a culture code such as "en-US" to a chrono locale ("en_US")
pub fn locale_for(culture: &str) -> Option<Locale> {
    let name = culture.trim().replace('-', "_");
    Locale::try_from(name.as_str()).ok()
}

/// Format a timestamp as a long date and time for the culture.
///
/// Unknown cultures use `fallback_culture`, then the POSIX locale.
pub fn format_long_date_time(
    value: &DateTime<Utc>,
    culture: &str,
    fallback_culture: &str,
) -> String {
    let (locale, culture) = match locale_for(culture) {
        Some(locale) => (locale, culture),
        None => match locale_for(fallback_culture) {
            Some(locale) => (locale, fallback_culture),
            None => (Locale::POSIX, fallback_culture),
        },
    };

    value
        .format_localized(long_date_time_pattern(culture), locale)
        .to_string()
}

fn long_date_time_pattern(culture: &str) -> &'static str {
    let culture = culture.trim();
    if culture.eq_ignore_ascii_case("en-US") || culture.eq_ignore_ascii_case("en_US") {
        return US_LONG_DATE_TIME;
    }

    let language = culture
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();

    match language.as_str() {
        "de" => GERMAN_LONG_DATE_TIME,
        _ => DEFAULT_LONG_DATE_TIME,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn march_first() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap()
    }

    #[test]
    fn test_en_us_long_date_time() {
        let formatted = format_long_date_time(&march_first(), "en-US", "en-US");
        assert_eq!(formatted, "Friday, March 1, 2024 10:00:00 AM");
    }

    #[test]
    fn test_other_culture_uses_own_locale() {
        let formatted = format_long_date_time(&march_first(), "pl-PL", "en-US");
        assert!(formatted.contains("2024"));
        assert!(formatted.contains("10:00:00"));
        assert!(!formatted.contains("Friday"));
    }

    #[test]
    fn test_unknown_culture_falls_back() {
        let formatted = format_long_date_time(&march_first(), "xx-XX", "en-US");
        assert_eq!(formatted, "Friday, March 1, 2024 10:00:00 AM");
    }

    #[test]
    fn test_locale_mapping() {
        assert!(locale_for("en-US").is_some());
        assert!(locale_for("de-DE").is_some());
        assert!(locale_for("not-a-culture").is_none());
    }

    #[test]
    fn test_pattern_selection() {
        assert_eq!(long_date_time_pattern("en-US"), US_LONG_DATE_TIME);
        assert_eq!(long_date_time_pattern("de-AT"), GERMAN_LONG_DATE_TIME);
        assert_eq!(long_date_time_pattern("en-GB"), DEFAULT_LONG_DATE_TIME);
    }
}
