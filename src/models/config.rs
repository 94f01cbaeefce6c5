//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Environment variable that overrides `notifier.webhook_url`.
pub const WEBHOOK_ENV: &str = "DISCORD_WEBHOOK_URL";

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Article series being watched
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP client behavior
    #[serde(default)]
    pub http: HttpConfig,

    /// State file location
    #[serde(default)]
    pub storage: StorageConfig,

    /// Outbound notification settings
    #[serde(default)]
    pub notifier: NotifierConfig,

    /// Log filter
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Replace the webhook URL with the environment value, if one is set.
    pub fn apply_env(&mut self) {
        if let Ok(url) = std::env::var(WEBHOOK_ENV) {
            if !url.trim().is_empty() {
                self.notifier.webhook_url = Some(url.trim().to_string());
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if !self.source.series_url.starts_with("http") {
            return Err(AppError::validation(format!(
                "source.series_url is not an http(s) URL: {}",
                self.source.series_url
            )));
        }
        if !self.source.base_url.starts_with("http") {
            return Err(AppError::validation(format!(
                "source.base_url is not an http(s) URL: {}",
                self.source.base_url
            )));
        }
        url::Url::parse(&self.source.base_url)?;
        if self.source.series_name.trim().is_empty() {
            return Err(AppError::validation("source.series_name is empty"));
        }
        if self.source.slug_keywords.is_empty() && self.source.marker_phrases.is_empty() {
            return Err(AppError::validation(
                "source.slug_keywords and source.marker_phrases are both empty",
            ));
        }
        if self.http.user_agent.trim().is_empty() {
            return Err(AppError::validation("http.user_agent is empty"));
        }
        if self.http.timeout_secs == 0 {
            return Err(AppError::validation("http.timeout_secs must be > 0"));
        }
        if self.storage.data_dir.as_os_str().is_empty() {
            return Err(AppError::validation("storage.data_dir is empty"));
        }
        if let Some(url) = &self.notifier.webhook_url {
            if !url.starts_with("http") {
                return Err(AppError::validation(
                    "notifier.webhook_url is not an http(s) URL",
                ));
            }
        }
        Ok(())
    }

    /// Whether a webhook target is available.
    pub fn notifier_configured(&self) -> bool {
        self.notifier
            .webhook_url
            .as_deref()
            .is_some_and(|url| !url.trim().is_empty())
    }

    /// Key/value overview for display. Never includes the webhook secret.
    pub fn summary(&self) -> Vec<(&'static str, String)> {
        vec![
            ("series_url", self.source.series_url.clone()),
            ("series_name", self.source.series_name.clone()),
            ("data_dir", self.storage.data_dir.display().to_string()),
            ("request_timeout", format!("{}s", self.http.timeout_secs)),
            ("retry_attempts", self.http.retry_attempts.to_string()),
            ("retry_delay", format!("{}s", self.http.retry_delay_secs)),
            ("notifier_configured", self.notifier_configured().to_string()),
            (
                "send_error_notifications",
                self.notifier.send_error_notifications.to_string(),
            ),
            ("log_level", self.logging.level.clone()),
        ]
    }
}

/// Where the article series lives and how its article URLs look.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Index page listing the series' articles
    #[serde(default = "defaults::series_url")]
    pub series_url: String,

    /// Base for resolving relative article links
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Used when an article link carries no title
    #[serde(default = "defaults::series_name")]
    pub series_name: String,

    /// First path segment of article URLs
    #[serde(default = "defaults::category")]
    pub category: String,

    /// Slug fragments matched after the `/YYYY/mon/DD/` segment
    #[serde(default = "defaults::slug_keywords")]
    pub slug_keywords: Vec<String>,

    /// Phrases accepted anywhere in a dated path
    #[serde(default = "defaults::marker_phrases")]
    pub marker_phrases: Vec<String>,

    /// Path fragment identifying the series index itself
    #[serde(default = "defaults::series_path_marker")]
    pub series_path_marker: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            series_url: defaults::series_url(),
            base_url: defaults::base_url(),
            series_name: defaults::series_name(),
            category: defaults::category(),
            slug_keywords: defaults::slug_keywords(),
            marker_phrases: defaults::marker_phrases(),
            series_path_marker: defaults::series_path_marker(),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Attempts per page before the run is aborted
    #[serde(default = "defaults::retry_attempts")]
    pub retry_attempts: u32,

    /// Pause between attempts in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            retry_attempts: defaults::retry_attempts(),
            retry_delay_secs: defaults::retry_delay(),
        }
    }
}

/// State file settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
        }
    }
}

/// Notification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// Discord webhook target; notifications are disabled when absent
    #[serde(default)]
    pub webhook_url: Option<String>,

    /// Report failed runs through the notifier
    #[serde(default = "defaults::send_error_notifications")]
    pub send_error_notifications: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            webhook_url: None,
            send_error_notifications: defaults::send_error_notifications(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn series_url() -> String {
        "https://www.theguardian.com/tv-and-radio/series/the-seven-best-shows-to-stream-this-week"
            .into()
    }
    pub fn base_url() -> String {
        "https://www.theguardian.com".into()
    }
    pub fn series_name() -> String {
        "Seven Best Shows to Stream This Week".into()
    }
    pub fn category() -> String {
        "tv-and-radio".into()
    }
    pub fn slug_keywords() -> Vec<String> {
        vec!["seven-best-shows".into(), "best-shows-to-stream".into()]
    }
    pub fn marker_phrases() -> Vec<String> {
        vec!["seven-best".into(), "best-shows-to-stream".into()]
    }
    pub fn series_path_marker() -> String {
        "/series/".into()
    }

    // HTTP defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0.0.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        10
    }
    pub fn retry_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        5
    }

    // Storage defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }

    // Notifier defaults
    pub fn send_error_notifications() -> bool {
        true
    }

    // Logging defaults
    pub fn log_level() -> String {
        "info".into()
    }
}
