// src/services/extractor.rs

//! Recommendation extractor.
//!
//! Article markup is not stable week to week: shows may be introduced by
//! `h2` headings, numbered `h2`/`h3` headings, numbered bold runs, or only
//! by numbered lines of text. Each shape has its own [`Strategy`]; they are
//! tried in order and the first one producing at least one recommendation
//! wins.
//!
//! | Strategy            | Boundary                     | Description                |
//! |---------------------|------------------------------|----------------------------|
//! | `section_headings`  | every `h2` in the body       | up to 3 following `<p>`    |
//! | `numbered_headings` | `h2`/`h3` starting `N. `     | up to 3 following `<p>`    |
//! | `numbered_emphasis` | `strong`/`b` starting `N. `  | parent text minus boundary |
//! | `numbered_lines`    | text line starting `N. `     | fixed sentinel             |

use regex::Regex;
use scraper::{ElementRef, Html, Selector};

use crate::error::Result;
use crate::models::{FEATURED_MARKER, Recommendation, is_noise};
use crate::services::platform::classify_platform;
use crate::utils::html::{
    element_text, next_element_siblings, parent_element, parse_selector, text_lines,
};
use crate::utils::normalize_whitespace;

/// Description used by `section_headings` when no paragraph follows.
pub const NO_DESCRIPTION: &str = "No description available";

/// Description used by `numbered_lines`, which never looks at siblings.
pub const DESCRIPTION_UNAVAILABLE: &str = "Description not available";

const MAX_DESCRIPTION_PARAGRAPHS: usize = 3;

const HEADING_ELEMENTS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Paragraphs starting with these are links or boilerplate, not descriptions.
const SKIPPED_PARAGRAPH_PREFIXES: &[&str] = &["http", "www", "Related:", "More on this story"];

type StrategyFn = fn(&RecommendationExtractor, &Html) -> Vec<Recommendation>;

/// One extraction heuristic.
#[derive(Clone, Copy)]
pub struct Strategy {
    pub name: &'static str,
    run: StrategyFn,
}

impl Strategy {
    pub fn run(&self, extractor: &RecommendationExtractor, document: &Html) -> Vec<Recommendation> {
        (self.run)(extractor, document)
    }
}

/// The cascade, in the order it is attempted.
pub const STRATEGIES: [Strategy; 4] = [
    Strategy {
        name: "section_headings",
        run: RecommendationExtractor::section_headings,
    },
    Strategy {
        name: "numbered_headings",
        run: RecommendationExtractor::numbered_headings,
    },
    Strategy {
        name: "numbered_emphasis",
        run: RecommendationExtractor::numbered_emphasis,
    },
    Strategy {
        name: "numbered_lines",
        run: RecommendationExtractor::numbered_lines,
    },
];

/// Extracts show recommendations from article markup.
pub struct RecommendationExtractor {
    body_selector: Selector,
    article_body_selector: Selector,
    heading_selector: Selector,
    numbered_heading_selector: Selector,
    emphasis_selector: Selector,
    numbered: Regex,
    featured: Regex,
}

impl RecommendationExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            body_selector: parse_selector(r#"div[data-gu-name="body"]"#)?,
            article_body_selector: parse_selector(r#"div[class*="article-body"]"#)?,
            heading_selector: parse_selector("h2")?,
            numbered_heading_selector: parse_selector("h2, h3")?,
            emphasis_selector: parse_selector("strong, b")?,
            numbered: Regex::new(r"^\d+\.\s+(.+)$")?,
            featured: Regex::new(&format!("(?i){}", regex::escape(FEATURED_MARKER)))?,
        })
    }

    /// Recommendations in document order, possibly empty.
    pub fn extract_recommendations(&self, article_markup: &str) -> Vec<Recommendation> {
        let document = Html::parse_document(article_markup);
        self.extract_from(&document)
    }

    /// Run the cascade over a parsed document.
    pub fn extract_from(&self, document: &Html) -> Vec<Recommendation> {
        for strategy in &STRATEGIES {
            let found = strategy.run(self, document);
            if !found.is_empty() {
                log::info!(
                    "Extracted {} recommendations with {}",
                    found.len(),
                    strategy.name
                );
                return found;
            }
            log::debug!("Strategy {} found nothing", strategy.name);
        }

        log::warn!("No recommendations found by any strategy");
        Vec::new()
    }

    /// Main article container: the body marker, then any `article-body`
    /// class, then the whole document.
    fn container<'a>(&self, document: &'a Html) -> ElementRef<'a> {
        document
            .select(&self.body_selector)
            .next()
            .or_else(|| document.select(&self.article_body_selector).next())
            .unwrap_or_else(|| document.root_element())
    }

    /// Every `h2` in the container is a show boundary.
    pub fn section_headings(&self, document: &Html) -> Vec<Recommendation> {
        self.container(document)
            .select(&self.heading_selector)
            .filter_map(|heading| self.parse_section_heading(&heading))
            .collect()
    }

    fn parse_section_heading(&self, heading: &ElementRef<'_>) -> Option<Recommendation> {
        let raw_title = element_text(heading);
        if is_noise(&raw_title) {
            return None;
        }

        let (title, is_featured) = self.split_featured(&raw_title);
        let description = sibling_description(heading);
        let platform = classify_platform(&format!("{description} {title}"));

        if title.chars().count() <= 2 {
            return None;
        }

        let description = if description.is_empty() {
            NO_DESCRIPTION.to_string()
        } else {
            description
        };
        Recommendation::new(&title, &description, platform, is_featured)
    }

    /// `h2`/`h3` headings numbered `N. ` are show boundaries.
    pub fn numbered_headings(&self, document: &Html) -> Vec<Recommendation> {
        document
            .select(&self.numbered_heading_selector)
            .filter_map(|heading| {
                let raw_title = self.strip_number(&element_text(&heading))?;
                let (title, is_featured) = self.split_featured(&raw_title);
                let description = sibling_description(&heading);
                let platform = classify_platform(&format!("{description} {title}"));
                Recommendation::new(&title, &description, platform, is_featured)
            })
            .collect()
    }

    /// Bold runs numbered `N. ` are show boundaries; the rest of their parent
    /// is the description.
    pub fn numbered_emphasis(&self, document: &Html) -> Vec<Recommendation> {
        document
            .select(&self.emphasis_selector)
            .filter_map(|element| {
                let boundary_text = element_text(&element);
                let raw_title = self.strip_number(&boundary_text)?;
                let (title, is_featured) = self.split_featured(&raw_title);

                let description = parent_element(&element)
                    .map(|parent| {
                        let full_text = element_text(&parent);
                        normalize_whitespace(&full_text.replacen(&boundary_text, "", 1))
                    })
                    .unwrap_or_default();

                let platform = classify_platform(&format!("{description} {title}"));
                Recommendation::new(&title, &description, platform, is_featured)
            })
            .collect()
    }

    /// Last resort: numbered lines of the container's plain text.
    pub fn numbered_lines(&self, document: &Html) -> Vec<Recommendation> {
        text_lines(&self.container(document))
            .iter()
            .filter_map(|line| {
                let raw_title = self.strip_number(line)?;
                let (title, is_featured) = self.split_featured(&raw_title);
                let platform = classify_platform(&title);
                Recommendation::new(&title, DESCRIPTION_UNAVAILABLE, platform, is_featured)
            })
            .collect()
    }

    /// Text after a leading `N. `, if present.
    fn strip_number(&self, text: &str) -> Option<String> {
        self.numbered
            .captures(text)
            .map(|caps| caps[1].trim().to_string())
    }

    /// Detect and remove the "pick of the week" marker.
    fn split_featured(&self, raw_title: &str) -> (String, bool) {
        if !raw_title.to_lowercase().starts_with(FEATURED_MARKER) {
            return (raw_title.trim().to_string(), false);
        }

        let mut title = raw_title.to_string();
        while self.featured.is_match(&title) {
            title = normalize_whitespace(&self.featured.replace_all(&title, " "));
        }
        let title = title
            .trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | '–' | '—' | '|'))
            .trim()
            .to_string();
        (title, true)
    }
}

/// Up to three following paragraphs, stopping at the next heading.
fn sibling_description(heading: &ElementRef<'_>) -> String {
    let mut parts = Vec::new();

    for sibling in next_element_siblings(heading) {
        let name = sibling.value().name();
        if HEADING_ELEMENTS.contains(&name) {
            break;
        }
        if name != "p" {
            continue;
        }

        let text = element_text(&sibling);
        if text.is_empty() || SKIPPED_PARAGRAPH_PREFIXES.iter().any(|p| text.starts_with(p)) {
            continue;
        }
        parts.push(text);
        if parts.len() == MAX_DESCRIPTION_PARAGRAPHS {
            break;
        }
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MAX_DESCRIPTION_CHARS, Platform};

    fn extractor() -> RecommendationExtractor {
        RecommendationExtractor::new().unwrap()
    }

    fn body(inner: &str) -> String {
        format!(r#"<html><body><div data-gu-name="body">{inner}</div></body></html>"#)
    }

    #[test]
    fn test_pick_of_the_week_heading() {
        let html = body("<h2>Pick of the week Hostage</h2><p>A political thriller on Netflix.</p>");
        let recs = extractor().extract_recommendations(&html);

        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Hostage");
        assert!(recs[0].is_featured);
        assert_eq!(recs[0].platform, Platform::Netflix);
        assert_eq!(recs[0].description, "A political thriller on Netflix.");
    }

    #[test]
    fn test_marker_in_nested_markup() {
        let html = body(
            "<h2><strong>Pick of the week</strong><br>Slow Horses</h2><p>Spies on Apple TV+.</p>",
        );
        let recs = extractor().extract_recommendations(&html);
        assert_eq!(recs[0].title, "Slow Horses");
        assert!(recs[0].is_featured);
        assert_eq!(recs[0].platform, Platform::AppleTvPlus);
    }

    #[test]
    fn test_section_headings_skip_noise_and_collect_paragraphs() {
        let html = body(
            "<h2>Pick of the week</h2>\
             <h2>The Bear</h2>\
             <p>Kitchen chaos.</p><figure>img</figure><p>https://example.com</p>\
             <p>Second para.</p><p>Third para.</p><p>Fourth para.</p>\
             <h2>Advertisement</h2>\
             <h2>Related: more telly</h2>\
             <h2>Ok</h2><p>Too short a title.</p>\
             <h2>Andor</h2>",
        );
        let recs = extractor().section_headings(&Html::parse_document(&html));

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "The Bear");
        assert_eq!(
            recs[0].description,
            "Kitchen chaos. Second para. Third para."
        );
        assert!(!recs[0].is_featured);
        assert_eq!(recs[1].title, "Andor");
        assert_eq!(recs[1].description, NO_DESCRIPTION);
    }

    #[test]
    fn test_description_stops_at_next_heading() {
        let html = body("<h2>Severance</h2><p>Office.</p><h3>Aside</h3><p>Not this.</p>");
        let recs = extractor().extract_recommendations(&html);
        assert_eq!(recs[0].description, "Office.");
    }

    #[test]
    fn test_container_falls_back_to_article_body_class() {
        let html = r#"<html><body>
            <nav><h2>Most viewed</h2></nav>
            <div class="content article-body-commercial"><h2>Shogun</h2><p>On Disney+.</p></div>
        </body></html>"#;
        let recs = extractor().extract_recommendations(html);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Shogun");
        assert_eq!(recs[0].platform, Platform::DisneyPlus);
    }

    #[test]
    fn test_falls_through_to_numbered_headings() {
        // Container exists but holds no h2, so section_headings is empty.
        let html = r#"<html><body>
            <div data-gu-name="body"><p>Intro text.</p></div>
            <div class="list">
                <h3>1. Pick of the week The Penguin</h3><p>Crime on Sky.</p>
                <h3>2. Hacks</h3><p>Comedy.</p>
                <h3>Not numbered</h3>
            </div>
        </body></html>"#;
        let ex = extractor();
        let doc = Html::parse_document(html);
        assert!(ex.section_headings(&doc).is_empty());

        let recs = ex.extract_from(&doc);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "The Penguin");
        assert!(recs[0].is_featured);
        assert_eq!(recs[0].platform, Platform::Sky);
        assert_eq!(recs[1].title, "Hacks");
        assert_eq!(recs[1].description, "Comedy.");
        assert_eq!(recs[1].platform, Platform::Unspecified);
    }

    #[test]
    fn test_falls_through_to_numbered_emphasis() {
        let html = r#"<html><body><div data-gu-name="body">
            <p><strong>1. Baby Reindeer</strong> A stalker drama on Netflix.</p>
            <p><b>2. Ripley</b> Noir in black and white.</p>
            <p><strong>Not a show</strong> filler</p>
        </div></body></html>"#;
        let recs = extractor().extract_recommendations(html);

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Baby Reindeer");
        assert_eq!(recs[0].description, "A stalker drama on Netflix.");
        assert_eq!(recs[0].platform, Platform::Netflix);
        assert_eq!(recs[1].title, "Ripley");
        assert_eq!(recs[1].description, "Noir in black and white.");
    }

    #[test]
    fn test_falls_through_to_numbered_lines() {
        let html = r#"<html><body><div data-gu-name="body">
            <p>This week's picks:</p>
            <p>1. Mr Bates vs the Post Office on ITV Hub</p><p>2. Pick of the week: Fallout</p>
            <p>Not numbered</p>
        </div></body></html>"#;
        let recs = extractor().extract_recommendations(html);

        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].title, "Mr Bates vs the Post Office on ITV Hub");
        assert_eq!(recs[0].platform, Platform::ItvHub);
        assert_eq!(recs[0].description, DESCRIPTION_UNAVAILABLE);
        assert_eq!(recs[1].title, "Fallout");
        assert!(recs[1].is_featured);
    }

    #[test]
    fn test_first_non_empty_strategy_wins() {
        // Both an h2 and a numbered bold run exist: only section_headings runs.
        let html = body("<h2>Blue Lights</h2><p>BBC iPlayer.</p><p><b>1. Other</b> text</p>");
        let recs = extractor().extract_recommendations(&html);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].title, "Blue Lights");
        assert_eq!(recs[0].platform, Platform::BbcIplayer);
    }

    #[test]
    fn test_nothing_found() {
        let html = body("<p>No list this week.</p>");
        assert!(extractor().extract_recommendations(&html).is_empty());
        assert!(extractor().extract_recommendations("").is_empty());
    }

    #[test]
    fn test_long_description_truncated() {
        let long = "word ".repeat(200);
        let html = body(&format!("<h2>Dune: Prophecy</h2><p>{long}</p>"));
        let recs = extractor().extract_recommendations(&html);
        assert_eq!(recs[0].description.chars().count(), MAX_DESCRIPTION_CHARS);
        assert!(recs[0].description.ends_with("..."));
    }

    #[test]
    fn test_featured_titles_never_contain_marker() {
        let ex = extractor();
        for raw in [
            "Pick of the week Hostage",
            "PICK OF THE WEEK: Hostage",
            "pick of the week - pick of the week Hostage",
            "Pick of the week pick of the pick of the week week Hostage",
        ] {
            let (title, featured) = ex.split_featured(raw);
            assert!(featured);
            assert!(!title.to_lowercase().contains(FEATURED_MARKER), "{raw} -> {title}");
            assert!(title.ends_with("Hostage"));
        }
        assert_eq!(ex.split_featured("Hostage"), ("Hostage".to_string(), false));
    }

    #[test]
    fn test_strategy_order() {
        let names: Vec<_> = STRATEGIES.iter().map(|s| s.name).collect();
        assert_eq!(
            names,
            vec![
                "section_headings",
                "numbered_headings",
                "numbered_emphasis",
                "numbered_lines"
            ]
        );
    }
}
