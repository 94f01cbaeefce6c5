//! Candidate source article discovered on the series index.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One candidate article. Two refs with the same `url` are the same article.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleRef {
    /// Canonical absolute URL
    pub url: String,

    /// Link text, or a synthesized "<series> - <date>" title
    pub title: String,

    /// Publication date taken from the URL path
    pub published_date: NaiveDate,

    /// Link href as it appeared on the index page
    pub source_path: String,
}

impl ArticleRef {
    /// Publication date in `YYYY-MM-DD` form.
    pub fn date_string(&self) -> String {
        self.published_date.format("%Y-%m-%d").to_string()
    }
}
