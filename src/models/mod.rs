// src/models/mod.rs

//! Domain models for the monitor.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod article;
mod config;
mod recommendation;
mod record;

// Re-export all public types
pub use article::ArticleRef;
pub use config::{
    Config, HttpConfig, LoggingConfig, NotifierConfig, SourceConfig, StorageConfig, WEBHOOK_ENV,
};
pub use recommendation::{
    ELLIPSIS, FEATURED_MARKER, MAX_DESCRIPTION_CHARS, Platform, Recommendation, is_noise,
    truncate_description,
};
pub use record::{
    HistoryEntry, LastChecked, ProcessedArticles, ProcessedInfo, ProcessedRecord, ShowMatch,
    Timestamp, now,
};
