// src/pipeline/monitor.rs

//! One monitor run: list, dedup, extract, persist, notify.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::error::{AppError, Result};
use crate::models::{ArticleRef, Config, Timestamp, now};
use crate::services::{ArticleLister, DiscordNotifier, Notifier, RecommendationExtractor};
use crate::storage::{LocalStorage, StateStore, StorageStats};
use crate::utils::http::{HttpFetcher, PageSource};

/// What a run found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// A new article was extracted, stored and announced.
    NewContent {
        article: ArticleRef,
        recommendation_count: usize,
    },
    /// The newest article was handled by an earlier run.
    AlreadyProcessed { article: ArticleRef },
    /// The index listed no series articles.
    NoArticles,
    /// The newest article yielded no recommendations.
    NoRecommendations { article: ArticleRef },
}

impl RunOutcome {
    pub fn found_new(&self) -> bool {
        matches!(self, RunOutcome::NewContent { .. })
    }
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::NewContent {
                article,
                recommendation_count,
            } => write!(
                f,
                "new content: {} shows from {}",
                recommendation_count, article.title
            ),
            RunOutcome::AlreadyProcessed { article } => {
                write!(f, "no new content: {} already processed", article.title)
            }
            RunOutcome::NoArticles => write!(f, "no articles found on the series index"),
            RunOutcome::NoRecommendations { article } => {
                write!(f, "no recommendations found in {}", article.title)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    Ready,
    NotConfigured,
}

#[derive(Debug, Clone, Serialize)]
pub struct Components {
    pub fetcher: Health,
    pub storage: Health,
    pub notifier: Health,
}

/// Read-only snapshot for operators.
#[derive(Debug, Clone, Serialize)]
pub struct Status {
    pub timestamp: Timestamp,
    pub series_url: String,
    pub components: Components,
    pub error_notifications: bool,
    pub storage: StorageStats,
}

/// Result of [`Monitor::self_test`].
#[derive(Debug, Clone, Serialize)]
pub struct SelfTest {
    pub articles_found: usize,
    pub latest: ArticleRef,
    pub storage: StorageStats,
    pub notification_sent: bool,
}

/// Wires the lister, extractor, store and notifier together.
pub struct Monitor {
    config: Arc<Config>,
    source: Box<dyn PageSource>,
    store: Box<dyn StateStore>,
    notifier: Option<Box<dyn Notifier>>,
    lister: ArticleLister,
    extractor: RecommendationExtractor,
}

impl Monitor {
    pub fn new(
        config: Arc<Config>,
        source: Box<dyn PageSource>,
        store: Box<dyn StateStore>,
        notifier: Option<Box<dyn Notifier>>,
    ) -> Result<Self> {
        Ok(Self {
            lister: ArticleLister::new(&config.source)?,
            extractor: RecommendationExtractor::new()?,
            config,
            source,
            store,
            notifier,
        })
    }

    /// Production wiring: HTTP fetcher, local JSON store, Discord webhook.
    pub fn from_config(config: Arc<Config>) -> Result<Self> {
        let fetcher = HttpFetcher::new(&config.http)?;
        let notifier = DiscordNotifier::from_config(fetcher.client().clone(), &config)
            .map(|n| Box::new(n) as Box<dyn Notifier>);
        if notifier.is_none() {
            log::warn!("No webhook configured; notifications are disabled");
        }
        let store = LocalStorage::new(&config.storage.data_dir);

        Self::new(config, Box::new(fetcher), Box::new(store), notifier)
    }

    /// Check the series once. Failures are reported through the notifier
    /// (when enabled) before being returned.
    pub async fn run(&self) -> Result<RunOutcome> {
        log::info!("Starting check of {}", self.config.source.series_url);

        match self.check().await {
            Ok(outcome) => {
                log::info!("Check complete: {}", outcome);
                Ok(outcome)
            }
            Err(error) => {
                log::error!("Check failed: {}", error);
                self.report_error(&error).await;
                Err(error)
            }
        }
    }

    async fn check(&self) -> Result<RunOutcome> {
        let index = self.source.fetch(&self.config.source.series_url).await?;

        let Some(article) = self.lister.list_articles(&index).into_iter().next() else {
            log::warn!("No articles found on the series index");
            return Ok(RunOutcome::NoArticles);
        };
        log::info!(
            "Latest article: {} ({})",
            article.title,
            article.date_string()
        );

        if self.store.is_processed(&article.url).await {
            log::info!("Article already processed: {}", article.url);
            self.store.set_last_checked(&article).await?;
            return Ok(RunOutcome::AlreadyProcessed { article });
        }

        let markup = self.source.fetch(&article.url).await?;
        let recommendations = self.extractor.extract_recommendations(&markup);
        if recommendations.is_empty() {
            log::warn!("No recommendations extracted from {}", article.url);
            return Ok(RunOutcome::NoRecommendations { article });
        }

        self.store.append_history(&article, &recommendations).await?;
        self.store
            .record_processed(&article, recommendations.len())
            .await?;
        self.store.set_last_checked(&article).await?;

        match &self.notifier {
            Some(notifier) => {
                if let Err(e) = notifier
                    .notify_new_items(
                        &article.title,
                        article.published_date,
                        &article.url,
                        &recommendations,
                    )
                    .await
                {
                    log::warn!("Notification failed, state is kept: {}", e);
                }
            }
            None => log::info!("Notifier not configured, skipping announcement"),
        }

        Ok(RunOutcome::NewContent {
            article,
            recommendation_count: recommendations.len(),
        })
    }

    async fn report_error(&self, error: &AppError) {
        if !self.config.notifier.send_error_notifications {
            return;
        }
        let Some(notifier) = &self.notifier else {
            return;
        };

        let context = if error.is_transport() {
            "Fetching pages"
        } else if error.is_persistence() {
            "Saving state"
        } else {
            "Monitor run"
        };
        if let Err(e) = notifier.notify_error(&error.to_string(), Some(context)).await {
            log::warn!("Error notification failed: {}", e);
        }
    }

    /// Component and storage overview. Reads only.
    pub async fn status(&self) -> Status {
        Status {
            timestamp: now(),
            series_url: self.config.source.series_url.clone(),
            components: Components {
                fetcher: Health::Ready,
                storage: Health::Ready,
                notifier: if self.notifier.is_some() {
                    Health::Ready
                } else {
                    Health::NotConfigured
                },
            },
            error_notifications: self.config.notifier.send_error_notifications,
            storage: self.store.stats().await,
        }
    }

    /// Exercise each component without writing state.
    pub async fn self_test(&self) -> Result<SelfTest> {
        let index = self.source.fetch(&self.config.source.series_url).await?;
        let articles = self.lister.list_articles(&index);
        let articles_found = articles.len();
        let latest = articles
            .into_iter()
            .next()
            .ok_or_else(|| AppError::validation("series index lists no articles"))?;
        log::info!("Self-test: {} articles, latest {}", articles_found, latest.title);

        let storage = self.store.stats().await;

        let notification_sent = match &self.notifier {
            Some(notifier) => {
                notifier.send_test().await?;
                true
            }
            None => false,
        };

        Ok(SelfTest {
            articles_found,
            latest,
            storage,
            notification_sent,
        })
    }
}
