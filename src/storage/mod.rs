//! Storage abstractions for monitor state.
//!
//! Three independent JSON records live under the data directory:
//!
//! ```text
//! data/
//! ├── last_checked.json        # Most recently evaluated article
//! ├── processed_articles.json  # Dedup set: URLs never to notify again
//! └── shows_history.json       # Extracted shows, newest article first
//! ```
//!
//! Every write is a full read-modify-write of one file. There is no
//! locking: at most one run may touch the directory at a time.

pub mod local;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::Result;
use crate::models::{ArticleRef, HistoryEntry, LastChecked, Platform, Recommendation, ShowMatch};

// Re-export for convenience
pub use local::LocalStorage;

/// Read-only aggregate of stored state.
#[derive(Debug, Clone, Serialize)]
pub struct StorageStats {
    pub data_dir: String,
    pub processed_count: usize,
    pub history_entry_count: usize,
    pub total_shows: usize,
    /// Size in bytes of each state file present on disk
    pub file_sizes: BTreeMap<String, u64>,
    pub last_checked: Option<LastChecked>,
}

/// Trait for monitor state backends.
///
/// Reads never fail: an unreadable record is logged and treated as empty.
/// Writes report failures to the caller.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Whether the article at `url` has been fully processed.
    async fn is_processed(&self, url: &str) -> bool;

    /// Mark an article processed. No-op if already recorded.
    async fn record_processed(&self, article: &ArticleRef, recommendation_count: usize)
    -> Result<()>;

    /// Prepend a history entry unless one exists for the article URL.
    async fn append_history(
        &self,
        article: &ArticleRef,
        recommendations: &[Recommendation],
    ) -> Result<()>;

    /// Overwrite the last-checked pointer.
    async fn set_last_checked(&self, article: &ArticleRef) -> Result<()>;

    async fn last_checked(&self) -> Option<LastChecked>;

    /// Newest `limit` history entries.
    async fn history(&self, limit: usize) -> Vec<HistoryEntry>;

    /// Shows whose title or description contains `query`, ignoring case.
    async fn search(&self, query: &str, limit: usize) -> Vec<ShowMatch>;

    /// Shows available on `platform`.
    async fn by_platform(&self, platform: Platform, limit: usize) -> Vec<ShowMatch>;

    async fn stats(&self) -> StorageStats;
}
