// src/services/platform.rs

//! Streaming platform classification.

use crate::models::Platform;

/// Keyword table, searched in order. Substring containment, not whole words.
const PLATFORM_KEYWORDS: &[(&str, Platform)] = &[
    ("netflix", Platform::Netflix),
    ("amazon prime", Platform::AmazonPrimeVideo),
    ("prime video", Platform::AmazonPrimeVideo),
    ("disney+", Platform::DisneyPlus),
    ("disney plus", Platform::DisneyPlus),
    ("hbo max", Platform::HboMax),
    ("hbo", Platform::Hbo),
    ("hulu", Platform::Hulu),
    ("apple tv", Platform::AppleTvPlus),
    ("paramount+", Platform::ParamountPlus),
    ("peacock", Platform::Peacock),
    ("bbc iplayer", Platform::BbcIplayer),
    ("itv hub", Platform::ItvHub),
    ("all 4", Platform::All4),
    ("channel 4", Platform::All4),
    ("sky", Platform::Sky),
    ("now tv", Platform::NowTv),
    ("britbox", Platform::BritBox),
    ("youtube", Platform::YouTube),
    ("crunchyroll", Platform::Crunchyroll),
];

/// Classify free text by the first matching platform keyword.
pub fn classify_platform(text: &str) -> Platform {
    let lower = text.to_lowercase();
    PLATFORM_KEYWORDS
        .iter()
        .find(|(keyword, _)| lower.contains(keyword))
        .map(|(_, platform)| *platform)
        .unwrap_or(Platform::Unspecified)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disney_plus_spelled_out() {
        assert_eq!(
            classify_platform("Available on Disney Plus now"),
            Platform::DisneyPlus
        );
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(classify_platform("NETFLIX original"), Platform::Netflix);
        assert_eq!(classify_platform("on BBC iPlayer"), Platform::BbcIplayer);
    }

    #[test]
    fn test_table_order_wins() {
        // "hbo max" is listed before "hbo"; "netflix" before "apple tv".
        assert_eq!(classify_platform("HBO Max"), Platform::HboMax);
        assert_eq!(
            classify_platform("Apple TV+ and also Netflix"),
            Platform::Netflix
        );
    }

    #[test]
    fn test_substring_match_accepts_false_positives() {
        assert_eq!(classify_platform("a skydiving drama"), Platform::Sky);
    }

    #[test]
    fn test_no_match_is_unspecified() {
        assert_eq!(classify_platform(""), Platform::Unspecified);
        assert_eq!(classify_platform("in cinemas"), Platform::Unspecified);
    }
}
