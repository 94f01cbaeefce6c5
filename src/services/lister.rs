// src/services/lister.rs

//! Article lister.
//!
//! Finds the series' weekly articles among the links of the index page and
//! dates them from their `/YYYY/mon/DD/` URL segment.

use chrono::NaiveDate;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::Result;
use crate::models::{ArticleRef, SourceConfig};
use crate::utils::html::{element_text, parse_selector};
use crate::utils::resolve_url;

const MONTHS: [(&str, u32); 12] = [
    ("jan", 1),
    ("feb", 2),
    ("mar", 3),
    ("apr", 4),
    ("may", 5),
    ("jun", 6),
    ("jul", 7),
    ("aug", 8),
    ("sep", 9),
    ("oct", 10),
    ("nov", 11),
    ("dec", 12),
];

/// Lists candidate articles from the series index markup.
pub struct ArticleLister {
    base_url: Url,
    series_name: String,
    series_path_marker: String,
    marker_phrases: Vec<String>,
    slug_pattern: Option<Regex>,
    year_pattern: Regex,
    date_pattern: Regex,
    link_selector: Selector,
    nested_title_selector: Selector,
}

impl ArticleLister {
    /// Compile URL patterns from the source configuration.
    pub fn new(source: &SourceConfig) -> Result<Self> {
        let slug_pattern = if source.slug_keywords.is_empty() {
            None
        } else {
            let keywords = source
                .slug_keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            Some(Regex::new(&format!(
                r"/{}/\d{{4}}/\w{{3}}/\d{{2}}/.+(?:{})",
                regex::escape(&source.category),
                keywords
            ))?)
        };

        Ok(Self {
            base_url: Url::parse(&source.base_url)?,
            series_name: source.series_name.clone(),
            series_path_marker: source.series_path_marker.clone(),
            marker_phrases: source
                .marker_phrases
                .iter()
                .map(|p| p.to_lowercase())
                .collect(),
            slug_pattern,
            year_pattern: Regex::new(r"/\d{4}/")?,
            date_pattern: Regex::new(r"/(\d{4})/(\w{3})/(\d{2})/")?,
            link_selector: parse_selector("a[href]")?,
            nested_title_selector: parse_selector("h3, h2, span")?,
        })
    }

    /// Candidate articles, newest first. Never fails; markup without
    /// matching links yields an empty list.
    pub fn list_articles(&self, index_markup: &str) -> Vec<ArticleRef> {
        let document = Html::parse_document(index_markup);
        let mut articles = Vec::new();

        for link in document.select(&self.link_selector) {
            let Some(href) = link.value().attr("href") else {
                continue;
            };
            if href.is_empty() || !self.is_article_path(href) {
                continue;
            }

            let Some(published_date) = self.extract_date(href) else {
                log::debug!("Skipping article link without a usable date: {}", href);
                continue;
            };

            let title = self
                .extract_title(&link)
                .unwrap_or_else(|| format!("{} - {}", self.series_name, published_date));

            articles.push(ArticleRef {
                url: resolve_url(&self.base_url, href),
                title,
                published_date,
                source_path: href.to_string(),
            });
        }

        // Stable: same-day links keep their scan order.
        articles.sort_by(|a, b| b.published_date.cmp(&a.published_date));

        if articles.is_empty() {
            log::warn!("No series articles found in index markup");
        } else {
            log::info!("Found {} articles in series", articles.len());
        }
        articles
    }

    /// Whether a link path looks like one of the series' articles.
    pub fn is_article_path(&self, href: &str) -> bool {
        if self
            .slug_pattern
            .as_ref()
            .is_some_and(|pattern| pattern.is_match(href))
        {
            return true;
        }

        let lower = href.to_lowercase();
        self.marker_phrases.iter().any(|p| lower.contains(p))
            && !href.contains(&self.series_path_marker)
            && self.year_pattern.is_match(href)
    }

    /// Publication date from the `/YYYY/mon/DD/` path segment.
    pub fn extract_date(&self, href: &str) -> Option<NaiveDate> {
        let caps = self.date_pattern.captures(href)?;
        let year: i32 = caps[1].parse().ok()?;
        let month_abbr = caps[2].to_lowercase();
        let month = MONTHS
            .iter()
            .find(|(abbr, _)| *abbr == month_abbr)
            .map(|(_, m)| *m)?;
        let day: u32 = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    fn extract_title(&self, link: &ElementRef<'_>) -> Option<String> {
        let text = element_text(link);
        if !text.is_empty() {
            return Some(text);
        }
        link.select(&self.nested_title_selector)
            .next()
            .map(|el| element_text(&el))
            .filter(|t| !t.is_empty())
    }
}
