//! Extracted show recommendation and its streaming platform.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Longest description kept, in characters.
pub const MAX_DESCRIPTION_CHARS: usize = 500;

/// Appended to a description cut at [`MAX_DESCRIPTION_CHARS`].
pub const ELLIPSIS: &str = "...";

/// Headings that are page furniture rather than shows.
pub const NOISE_PREFIXES: &[&str] = &[
    "privacy notice",
    "related:",
    "more on this story",
    "advertisement",
];

/// Marker for the highlighted show of the week.
pub const FEATURED_MARKER: &str = "pick of the week";

/// Streaming service a show is available on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum Platform {
    Netflix,
    AmazonPrimeVideo,
    DisneyPlus,
    HboMax,
    Hbo,
    Hulu,
    AppleTvPlus,
    ParamountPlus,
    Peacock,
    BbcIplayer,
    ItvHub,
    All4,
    Sky,
    NowTv,
    BritBox,
    YouTube,
    Crunchyroll,
    Unspecified,
}

impl Platform {
    /// Every platform, the unspecified sentinel last.
    pub const ALL: [Platform; 18] = [
        Platform::Netflix,
        Platform::AmazonPrimeVideo,
        Platform::DisneyPlus,
        Platform::HboMax,
        Platform::Hbo,
        Platform::Hulu,
        Platform::AppleTvPlus,
        Platform::ParamountPlus,
        Platform::Peacock,
        Platform::BbcIplayer,
        Platform::ItvHub,
        Platform::All4,
        Platform::Sky,
        Platform::NowTv,
        Platform::BritBox,
        Platform::YouTube,
        Platform::Crunchyroll,
        Platform::Unspecified,
    ];

    /// Display name, also the persisted form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Netflix => "Netflix",
            Platform::AmazonPrimeVideo => "Amazon Prime Video",
            Platform::DisneyPlus => "Disney+",
            Platform::HboMax => "HBO Max",
            Platform::Hbo => "HBO",
            Platform::Hulu => "Hulu",
            Platform::AppleTvPlus => "Apple TV+",
            Platform::ParamountPlus => "Paramount+",
            Platform::Peacock => "Peacock",
            Platform::BbcIplayer => "BBC iPlayer",
            Platform::ItvHub => "ITV Hub",
            Platform::All4 => "All 4",
            Platform::Sky => "Sky",
            Platform::NowTv => "NOW TV",
            Platform::BritBox => "BritBox",
            Platform::YouTube => "YouTube",
            Platform::Crunchyroll => "Crunchyroll",
            Platform::Unspecified => "Platform not specified",
        }
    }

    /// Look a platform up by display name, ignoring case.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Platform> for String {
    fn from(platform: Platform) -> Self {
        platform.as_str().to_string()
    }
}

impl From<String> for Platform {
    fn from(name: String) -> Self {
        Platform::from_name(&name).unwrap_or(Platform::Unspecified)
    }
}

/// One show extracted from an article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub platform: Platform,
    #[serde(rename = "pick_of_the_week")]
    pub is_featured: bool,
}

impl Recommendation {
    /// Build a recommendation, rejecting empty or noise titles.
    ///
    /// The description is capped at [`MAX_DESCRIPTION_CHARS`].
    pub fn new(
        title: &str,
        description: &str,
        platform: Platform,
        is_featured: bool,
    ) -> Option<Self> {
        let title = title.trim();
        if title.is_empty() || is_noise(title) {
            return None;
        }

        Some(Self {
            title: title.to_string(),
            description: truncate_description(description.trim()),
            platform,
            is_featured,
        })
    }

    /// Case-insensitive substring match over title and description.
    pub fn matches_text(&self, query_lower: &str) -> bool {
        self.title.to_lowercase().contains(query_lower)
            || self.description.to_lowercase().contains(query_lower)
    }
}

/// Whether a heading is navigational boilerplate.
pub fn is_noise(text: &str) -> bool {
    let lower = text.trim().to_lowercase();
    lower == FEATURED_MARKER
        || lower == "related"
        || NOISE_PREFIXES.iter().any(|p| lower.starts_with(p))
}

/// Cut text longer than the cap to `cap - 3` characters plus an ellipsis.
pub fn truncate_description(text: &str) -> String {
    if text.chars().count() <= MAX_DESCRIPTION_CHARS {
        return text.to_string();
    }
    let keep = MAX_DESCRIPTION_CHARS - ELLIPSIS.chars().count();
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str(ELLIPSIS);
    cut
}
