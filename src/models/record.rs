//! Persisted state records.
//!
//! Field names follow the on-disk JSON layout of the three state files
//! (`last_checked.json`, `processed_articles.json`, `shows_history.json`).

use std::collections::BTreeMap;

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::models::{ArticleRef, Recommendation};

/// Local wall-clock timestamp, stored as ISO 8601 without offset.
pub type Timestamp = NaiveDateTime;

/// Current local timestamp.
pub fn now() -> Timestamp {
    Local::now().naive_local()
}

/// Pointer to the most recently evaluated article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LastChecked {
    pub url: String,
    pub title: String,
    pub article_date: NaiveDate,
    pub checked_at: Timestamp,
    pub last_updated: Timestamp,
}

impl LastChecked {
    pub fn new(article: &ArticleRef, at: Timestamp) -> Self {
        Self {
            url: article.url.clone(),
            title: article.title.clone(),
            article_date: article.published_date,
            checked_at: at,
            last_updated: at,
        }
    }
}

/// Metadata kept for each processed article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProcessedInfo {
    pub title: String,
    pub date: NaiveDate,
    pub shows_count: usize,
    pub processed_at: Timestamp,
}

/// Contents of `processed_articles.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProcessedArticles {
    #[serde(default)]
    pub processed_urls: Vec<String>,
    #[serde(default)]
    pub articles_info: BTreeMap<String, ProcessedInfo>,
}

impl ProcessedArticles {
    pub fn contains(&self, url: &str) -> bool {
        self.processed_urls.iter().any(|u| u == url)
    }

    /// Insert a record unless the URL is already present. Returns whether
    /// anything changed.
    pub fn insert(&mut self, article: &ArticleRef, count: usize, at: Timestamp) -> bool {
        if self.contains(&article.url) {
            return false;
        }
        self.processed_urls.push(article.url.clone());
        self.articles_info.insert(
            article.url.clone(),
            ProcessedInfo {
                title: article.title.clone(),
                date: article.published_date,
                shows_count: count,
                processed_at: at,
            },
        );
        true
    }

    /// Flatten into records, in processing order.
    pub fn records(&self) -> Vec<ProcessedRecord> {
        self.processed_urls
            .iter()
            .filter_map(|url| {
                self.articles_info.get(url).map(|info| ProcessedRecord {
                    url: url.clone(),
                    title: info.title.clone(),
                    published_date: info.date,
                    recommendation_count: info.shows_count,
                    processed_at: info.processed_at,
                })
            })
            .collect()
    }
}

/// The fact that an article was fully handled.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ProcessedRecord {
    pub url: String,
    pub title: String,
    pub published_date: NaiveDate,
    pub recommendation_count: usize,
    pub processed_at: Timestamp,
}

/// One batch of recommendations tied to its source article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HistoryEntry {
    pub article_url: String,
    pub article_title: String,
    pub article_date: NaiveDate,
    pub saved_at: Timestamp,
    pub shows_count: usize,
    #[serde(default)]
    pub shows: Vec<Recommendation>,
}

impl HistoryEntry {
    pub fn new(article: &ArticleRef, shows: &[Recommendation], at: Timestamp) -> Self {
        Self {
            article_url: article.url.clone(),
            article_title: article.title.clone(),
            article_date: article.published_date,
            saved_at: at,
            shows_count: shows.len(),
            shows: shows.to_vec(),
        }
    }
}

/// A recommendation found by a history query, with its article context.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ShowMatch {
    #[serde(flatten)]
    pub show: Recommendation,
    pub article_title: String,
    pub article_date: NaiveDate,
}

impl ShowMatch {
    pub fn new(show: &Recommendation, entry: &HistoryEntry) -> Self {
        Self {
            show: show.clone(),
            article_title: entry.article_title.clone(),
            article_date: entry.article_date,
        }
    }
}
