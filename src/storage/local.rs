//! Local filesystem storage implementation.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//! ├── last_checked.json
//! ├── processed_articles.json
//! └── shows_history.json
//! ```
//!
//! Files are replaced atomically (write to `*.tmp`, then rename). A file that
//! fails to parse is moved to `<name>.corrupt`, reported with a warning and
//! read as empty; the next successful write starts a fresh file.

use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Duration;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{
    ArticleRef, HistoryEntry, LastChecked, Platform, ProcessedArticles, ProcessedRecord,
    Recommendation, ShowMatch, now,
};
use crate::storage::{StateStore, StorageStats};

pub const LAST_CHECKED_KEY: &str = "last_checked.json";
pub const PROCESSED_KEY: &str = "processed_articles.json";
pub const HISTORY_KEY: &str = "shows_history.json";

const STATE_KEYS: [&str; 3] = [LAST_CHECKED_KEY, PROCESSED_KEY, HISTORY_KEY];

/// Where an unparseable state file is kept.
fn corrupt_key(key: &str) -> String {
    format!("{key}.corrupt")
}

/// Local filesystem storage backend.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    root_dir: PathBuf,
}

impl LocalStorage {
    /// Create a new LocalStorage rooted at the given directory.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    /// Get the full path for a relative key.
    fn path(&self, key: &str) -> PathBuf {
        self.root_dir.join(key)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(key);
        self.ensure_dir(&path).await?;

        let tmp = path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Write JSON data. Any failure becomes [`AppError::Persistence`].
    async fn write_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value).map_err(|e| AppError::persistence(key, e))?;
        self.write_bytes(key, &bytes)
            .await
            .map_err(|e| AppError::persistence(key, e))
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.path(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    /// Read JSON data.
    async fn read_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.read_bytes(key).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Read a record, degrading to empty on any failure.
    async fn load<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        self.load_optional(key).await.unwrap_or_default()
    }

    /// Read a record, degrading to `None` on any failure. A file that does
    /// not parse is moved aside to `<key>.corrupt` first, so the next write
    /// cannot destroy its contents.
    async fn load_optional<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.read_json(key).await {
            Ok(value) => value,
            Err(AppError::Json(e)) => {
                let aside = self.path(&corrupt_key(key));
                match tokio::fs::rename(self.path(key), &aside).await {
                    Ok(()) => log::warn!(
                        "Unparseable state file {}: {}. Moved to {} and treating as empty.",
                        key,
                        e,
                        aside.display()
                    ),
                    Err(rename_err) => log::warn!(
                        "Unparseable state file {}: {}. Could not move it aside: {}",
                        key,
                        e,
                        rename_err
                    ),
                }
                None
            }
            Err(e) => {
                log::warn!("Unreadable state file {}: {}. Treating as empty.", key, e);
                None
            }
        }
    }

    async fn load_processed(&self) -> ProcessedArticles {
        self.load(PROCESSED_KEY).await
    }

    async fn load_history(&self) -> Vec<HistoryEntry> {
        self.load(HISTORY_KEY).await
    }

    /// All processed records, in processing order.
    pub async fn records(&self) -> Vec<ProcessedRecord> {
        self.load_processed().await.records()
    }

    /// Drop history entries repeating an earlier `article_url`, keeping the
    /// first (newest). Returns the number removed.
    pub async fn remove_duplicate_history(&self) -> Result<usize> {
        let history = self.load_history().await;
        let original = history.len();

        let mut seen = HashSet::new();
        let cleaned: Vec<_> = history
            .into_iter()
            .filter(|entry| seen.insert(entry.article_url.clone()))
            .collect();

        let removed = original - cleaned.len();
        if removed > 0 {
            self.write_json(HISTORY_KEY, &cleaned).await?;
        }
        log::info!("Removed {} duplicate history entries", removed);
        Ok(removed)
    }

    /// Drop history entries saved more than `keep_days` days ago. Returns the
    /// number removed.
    pub async fn prune_history(&self, keep_days: u32) -> Result<usize> {
        let cutoff = now() - Duration::days(i64::from(keep_days));
        let mut history = self.load_history().await;
        let original = history.len();

        history.retain(|entry| entry.saved_at > cutoff);

        let removed = original - history.len();
        if removed > 0 {
            self.write_json(HISTORY_KEY, &history).await?;
        }
        log::info!("Removed {} history entries older than {} days", removed, keep_days);
        Ok(removed)
    }

    /// Keep only the `max_keep` most recently processed articles. Returns the
    /// number removed.
    pub async fn prune_processed(&self, max_keep: usize) -> Result<usize> {
        let mut processed = self.load_processed().await;
        let original = processed.processed_urls.len();
        if original <= max_keep {
            return Ok(0);
        }

        let mut records = processed.records();
        records.sort_by(|a, b| b.processed_at.cmp(&a.processed_at));
        let keep: HashSet<String> = records.into_iter().take(max_keep).map(|r| r.url).collect();

        processed.processed_urls.retain(|url| keep.contains(url));
        processed.articles_info.retain(|url, _| keep.contains(url));

        let removed = original - processed.processed_urls.len();
        self.write_json(PROCESSED_KEY, &processed).await?;
        log::info!("Removed {} processed articles, kept {}", removed, max_keep);
        Ok(removed)
    }

    /// Delete every state file.
    pub async fn reset(&self) -> Result<()> {
        for key in STATE_KEYS {
            match tokio::fs::remove_file(self.path(key)).await {
                Ok(()) => log::info!("Deleted {}", key),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(AppError::persistence(key, e)),
            }
        }
        Ok(())
    }

    async fn collect_shows<F>(&self, limit: usize, mut matches: F) -> Vec<ShowMatch>
    where
        F: FnMut(&Recommendation) -> bool + Send,
    {
        let history = self.load_history().await;
        let mut found = Vec::new();

        for entry in &history {
            for show in &entry.shows {
                if found.len() >= limit {
                    return found;
                }
                if matches(show) {
                    found.push(ShowMatch::new(show, entry));
                }
            }
        }
        found
    }
}

#[async_trait]
impl StateStore for LocalStorage {
    async fn is_processed(&self, url: &str) -> bool {
        self.load_processed().await.contains(url)
    }

    async fn record_processed(
        &self,
        article: &ArticleRef,
        recommendation_count: usize,
    ) -> Result<()> {
        let mut processed = self.load_processed().await;
        if !processed.insert(article, recommendation_count, now()) {
            log::debug!("Article already recorded as processed: {}", article.url);
            return Ok(());
        }

        self.write_json(PROCESSED_KEY, &processed).await?;
        log::info!(
            "Recorded processed article ({} total): {}",
            processed.processed_urls.len(),
            article.title
        );
        Ok(())
    }

    async fn append_history(
        &self,
        article: &ArticleRef,
        recommendations: &[Recommendation],
    ) -> Result<()> {
        let mut history = self.load_history().await;
        if history.iter().any(|entry| entry.article_url == article.url) {
            log::info!("History already holds {}, skipping", article.url);
            return Ok(());
        }

        history.insert(0, HistoryEntry::new(article, recommendations, now()));
        self.write_json(HISTORY_KEY, &history).await?;
        log::info!(
            "Saved {} shows to history ({} entries)",
            recommendations.len(),
            history.len()
        );
        Ok(())
    }

    async fn set_last_checked(&self, article: &ArticleRef) -> Result<()> {
        let record = LastChecked::new(article, now());
        self.write_json(LAST_CHECKED_KEY, &record).await?;
        log::debug!("Updated last checked article: {}", article.title);
        Ok(())
    }

    async fn last_checked(&self) -> Option<LastChecked> {
        self.load_optional(LAST_CHECKED_KEY).await
    }

    async fn history(&self, limit: usize) -> Vec<HistoryEntry> {
        let mut history = self.load_history().await;
        history.truncate(limit);
        history
    }

    async fn search(&self, query: &str, limit: usize) -> Vec<ShowMatch> {
        let query = query.to_lowercase();
        self.collect_shows(limit, |show| show.matches_text(&query))
            .await
    }

    async fn by_platform(&self, platform: Platform, limit: usize) -> Vec<ShowMatch> {
        self.collect_shows(limit, |show| show.platform == platform)
            .await
    }

    async fn stats(&self) -> StorageStats {
        let processed = self.load_processed().await;
        let history = self.load_history().await;

        let mut file_sizes = BTreeMap::new();
        for key in STATE_KEYS {
            if let Ok(meta) = tokio::fs::metadata(self.path(key)).await {
                file_sizes.insert(key.to_string(), meta.len());
            }
        }

        StorageStats {
            data_dir: self.root_dir.display().to_string(),
            processed_count: processed.processed_urls.len(),
            history_entry_count: history.len(),
            total_shows: history.iter().map(|e| e.shows.len()).sum(),
            file_sizes,
            last_checked: self.last_checked().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn article(url: &str, day: u32) -> ArticleRef {
        ArticleRef {
            url: url.to_string(),
            title: format!("Seven best shows {day}"),
            published_date: NaiveDate::from_ymd_opt(2025, 8, day).unwrap(),
            source_path: "/x".to_string(),
        }
    }

    fn shows() -> Vec<Recommendation> {
        vec![
            Recommendation::new("Hostage", "A political thriller.", Platform::Netflix, true)
                .unwrap(),
            Recommendation::new("Andor", "Rebels in space.", Platform::DisneyPlus, false).unwrap(),
        ]
    }

    #[tokio::test]
    async fn test_write_and_read() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.write_bytes("test.txt", b"hello").await.unwrap();
        let data = storage.read_bytes("test.txt").await.unwrap();
        assert_eq!(data, Some(b"hello".to_vec()));
        assert!(!tmp.path().join("test.tmp").exists());
    }

    #[tokio::test]
    async fn test_read_nonexistent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(storage.read_bytes("nope.txt").await.unwrap().is_none());
        assert!(storage.last_checked().await.is_none());
        assert!(storage.history(10).await.is_empty());
    }

    #[tokio::test]
    async fn test_record_and_append_are_idempotent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let a = article("https://g/a", 15);

        storage.record_processed(&a, 2).await.unwrap();
        storage.append_history(&a, &shows()).await.unwrap();
        let processed_once = std::fs::read(tmp.path().join(PROCESSED_KEY)).unwrap();
        let history_once = std::fs::read(tmp.path().join(HISTORY_KEY)).unwrap();

        storage.record_processed(&a, 2).await.unwrap();
        storage.append_history(&a, &shows()).await.unwrap();

        assert_eq!(std::fs::read(tmp.path().join(PROCESSED_KEY)).unwrap(), processed_once);
        assert_eq!(std::fs::read(tmp.path().join(HISTORY_KEY)).unwrap(), history_once);
        assert!(storage.is_processed("https://g/a").await);
        assert!(!storage.is_processed("https://g/b").await);
    }

    #[tokio::test]
    async fn test_history_newest_first() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.append_history(&article("https://g/a", 1), &shows()).await.unwrap();
        storage.append_history(&article("https://g/b", 8), &shows()).await.unwrap();

        let history = storage.history(10).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].article_url, "https://g/b");
        assert_eq!(history[0].shows_count, 2);
        assert_eq!(storage.history(1).await.len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_reads_as_empty() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(PROCESSED_KEY), b"{not json").unwrap();
        std::fs::write(tmp.path().join(LAST_CHECKED_KEY), b"[]").unwrap();
        let storage = LocalStorage::new(tmp.path());

        assert!(!storage.is_processed("https://g/a").await);
        assert!(storage.last_checked().await.is_none());

        // The next write replaces the corrupt file.
        storage.record_processed(&article("https://g/a", 15), 1).await.unwrap();
        assert!(storage.is_processed("https://g/a").await);
    }

    #[tokio::test]
    async fn test_unparseable_history_is_kept_aside_on_append() {
        let tmp = TempDir::new().unwrap();
        let seeded = r#"[
            {
                "article_url": "https://g/old1",
                "article_title": "Old week",
                "article_date": "2025-02-14",
                "saved_at": "2025-02-14T10:00:00",
                "shows_count": 0,
                "shows": []
            },
            {
                "article_url": "https://g/old2",
                "article_title": "Bad date",
                "article_date": "2025-02-30",
                "saved_at": "2025-02-28T10:00:00",
                "shows_count": 0,
                "shows": []
            }
        ]"#;
        std::fs::write(tmp.path().join(HISTORY_KEY), seeded).unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.append_history(&article("https://g/new", 15), &shows()).await.unwrap();

        let history = storage.history(10).await;
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].article_url, "https://g/new");

        let kept = std::fs::read_to_string(tmp.path().join(corrupt_key(HISTORY_KEY))).unwrap();
        assert_eq!(kept, seeded);
        assert!(kept.contains("https://g/old1"));
    }

    #[tokio::test]
    async fn test_write_failure_is_persistence_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        std::fs::write(&blocker, b"").unwrap();
        let storage = LocalStorage::new(&blocker);

        let err = storage
            .record_processed(&article("https://g/a", 15), 1)
            .await
            .unwrap_err();
        assert!(err.is_persistence());
    }

    #[tokio::test]
    async fn test_last_checked_overwritten() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        storage.set_last_checked(&article("https://g/a", 1)).await.unwrap();
        storage.set_last_checked(&article("https://g/b", 8)).await.unwrap();

        let last = storage.last_checked().await.unwrap();
        assert_eq!(last.url, "https://g/b");
        assert_eq!(last.article_date, NaiveDate::from_ymd_opt(2025, 8, 8).unwrap());
    }

    #[tokio::test]
    async fn test_search_and_platform_queries() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        storage.append_history(&article("https://g/a", 1), &shows()).await.unwrap();
        storage.append_history(&article("https://g/b", 8), &shows()).await.unwrap();

        let found = storage.search("THRILLER", 20).await;
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].show.title, "Hostage");
        assert_eq!(found[0].article_title, "Seven best shows 8");

        assert_eq!(storage.search("space", 1).await.len(), 1);
        assert!(storage.search("nothing like this", 20).await.is_empty());

        let disney = storage.by_platform(Platform::DisneyPlus, 20).await;
        assert_eq!(disney.len(), 2);
        assert!(disney.iter().all(|m| m.show.title == "Andor"));
        assert!(storage.by_platform(Platform::Hulu, 20).await.is_empty());
    }

    #[tokio::test]
    async fn test_stats() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let a = article("https://g/a", 15);
        storage.append_history(&a, &shows()).await.unwrap();
        storage.record_processed(&a, 2).await.unwrap();
        storage.set_last_checked(&a).await.unwrap();

        let stats = storage.stats().await;
        assert_eq!(stats.processed_count, 1);
        assert_eq!(stats.history_entry_count, 1);
        assert_eq!(stats.total_shows, 2);
        assert_eq!(stats.file_sizes.len(), 3);
        assert_eq!(stats.last_checked.unwrap().url, "https://g/a");
    }

    #[tokio::test]
    async fn test_remove_duplicate_history() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let entry = HistoryEntry::new(&article("https://g/a", 15), &shows(), now());
        let other = HistoryEntry::new(&article("https://g/b", 8), &shows(), now());
        storage
            .write_json(HISTORY_KEY, &vec![entry.clone(), other, entry])
            .await
            .unwrap();

        assert_eq!(storage.remove_duplicate_history().await.unwrap(), 1);
        let history = storage.history(10).await;
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].article_url, "https://g/a");
        assert_eq!(storage.remove_duplicate_history().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_prune_history() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let fresh = HistoryEntry::new(&article("https://g/a", 15), &shows(), now());
        let stale = HistoryEntry::new(
            &article("https://g/b", 8),
            &shows(),
            now() - Duration::days(100),
        );
        storage.write_json(HISTORY_KEY, &vec![fresh, stale]).await.unwrap();

        assert_eq!(storage.prune_history(90).await.unwrap(), 1);
        assert_eq!(storage.history(10).await[0].article_url, "https://g/a");
    }

    #[tokio::test]
    async fn test_prune_processed_keeps_most_recent() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());

        let mut processed = ProcessedArticles::default();
        let base = now();
        for day in 1..=5 {
            let at = base - Duration::days(i64::from(10 - day));
            processed.insert(&article(&format!("https://g/{day}"), day), 7, at);
        }
        storage.write_json(PROCESSED_KEY, &processed).await.unwrap();

        assert_eq!(storage.prune_processed(2).await.unwrap(), 3);
        let urls: Vec<_> = storage.records().await.into_iter().map(|r| r.url).collect();
        assert_eq!(urls, vec!["https://g/4", "https://g/5"]);
        assert_eq!(storage.prune_processed(2).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset() {
        let tmp = TempDir::new().unwrap();
        let storage = LocalStorage::new(tmp.path());
        let a = article("https://g/a", 15);
        storage.record_processed(&a, 1).await.unwrap();
        storage.set_last_checked(&a).await.unwrap();

        storage.reset().await.unwrap();
        assert!(!storage.is_processed("https://g/a").await);
        assert!(storage.stats().await.file_sizes.is_empty());
        // Resetting an empty directory is fine.
        storage.reset().await.unwrap();
    }
}
