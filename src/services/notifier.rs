// src/services/notifier.rs

//! Outbound notifications.
//!
//! The orchestrator talks to a [`Notifier`]; [`DiscordNotifier`] delivers
//! webhook embeds. Payload construction is kept in plain functions so it can
//! be checked without a network.

use async_trait::async_trait;
use chrono::{Local, NaiveDate, Utc};
use serde_json::{Value, json};

use crate::error::{AppError, Result};
use crate::models::{Config, Recommendation};

/// Shows listed in one embed.
pub const MAX_EMBED_SHOWS: usize = 7;

const MAX_FIELD_DESCRIPTION_CHARS: usize = 150;
const FIELD_DESCRIPTION_KEEP_CHARS: usize = 147;

const COLOR_NEW_ITEMS: u32 = 0x052962;
const COLOR_ERROR: u32 = 0xff0000;
const COLOR_TEST: u32 = 0x00ff00;

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Announce the recommendations of a newly processed article.
    async fn notify_new_items(
        &self,
        article_title: &str,
        article_date: NaiveDate,
        article_url: &str,
        recommendations: &[Recommendation],
    ) -> Result<()>;

    /// Report a failed run.
    async fn notify_error(&self, message: &str, context: Option<&str>) -> Result<()>;

    /// Send a connectivity check message.
    async fn send_test(&self) -> Result<()>;
}

/// Discord webhook notifier.
pub struct DiscordNotifier {
    client: reqwest::Client,
    webhook_url: String,
    footer: String,
}

impl DiscordNotifier {
    pub fn new(
        client: reqwest::Client,
        webhook_url: impl Into<String>,
        footer: impl Into<String>,
    ) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            footer: footer.into(),
        }
    }

    /// Notifier for the configured webhook, if there is one.
    pub fn from_config(client: reqwest::Client, config: &Config) -> Option<Self> {
        if !config.notifier_configured() {
            return None;
        }
        let url = config.notifier.webhook_url.as_deref()?;
        Some(Self::new(
            client,
            url.trim(),
            format!("{} Monitor", config.source.series_name),
        ))
    }

    async fn post(&self, payload: &Value) -> Result<()> {
        self.client
            .post(&self.webhook_url)
            .json(payload)
            .send()
            .await
            .map_err(AppError::notify)?
            .error_for_status()
            .map_err(AppError::notify)?;
        Ok(())
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    async fn notify_new_items(
        &self,
        article_title: &str,
        article_date: NaiveDate,
        article_url: &str,
        recommendations: &[Recommendation],
    ) -> Result<()> {
        let payload = new_items_payload(
            &self.footer,
            article_title,
            article_date,
            article_url,
            recommendations,
        );
        self.post(&payload).await?;
        log::info!(
            "Sent notification for {} shows from {}",
            recommendations.len(),
            article_title
        );
        Ok(())
    }

    async fn notify_error(&self, message: &str, context: Option<&str>) -> Result<()> {
        self.post(&error_payload(&self.footer, message, context))
            .await?;
        log::info!("Sent error notification");
        Ok(())
    }

    async fn send_test(&self) -> Result<()> {
        self.post(&test_payload(&self.footer)).await?;
        log::info!("Sent test notification");
        Ok(())
    }
}

/// Embed announcing new shows.
pub fn new_items_payload(
    footer: &str,
    article_title: &str,
    article_date: NaiveDate,
    article_url: &str,
    recommendations: &[Recommendation],
) -> Value {
    let mut fields = vec![
        json!({
            "name": "📅 Published",
            "value": article_date.format("%B %d, %Y").to_string(),
            "inline": true,
        }),
        json!({
            "name": "🔗 Read Full Article",
            "value": format!("[{article_title}]({article_url})"),
            "inline": false,
        }),
    ];
    fields.extend(
        recommendations
            .iter()
            .take(MAX_EMBED_SHOWS)
            .enumerate()
            .map(|(i, rec)| show_field(i + 1, rec)),
    );

    json!({
        "embeds": [{
            "title": "🎬 New show recommendations",
            "description": format!("**{} new shows** to stream this week", recommendations.len()),
            "url": article_url,
            "color": COLOR_NEW_ITEMS,
            "fields": fields,
            "footer": { "text": footer },
            "timestamp": Utc::now().to_rfc3339(),
        }]
    })
}

fn show_field(position: usize, rec: &Recommendation) -> Value {
    let title = if rec.is_featured {
        format!("⭐ {} (Pick of the week)", rec.title)
    } else {
        rec.title.clone()
    };

    json!({
        "name": format!("{position}. {title}"),
        "value": format!("**Platform:** {}\n{}", rec.platform, shorten(&rec.description)),
        "inline": false,
    })
}

fn shorten(description: &str) -> String {
    if description.chars().count() <= MAX_FIELD_DESCRIPTION_CHARS {
        return description.to_string();
    }
    let mut cut: String = description
        .chars()
        .take(FIELD_DESCRIPTION_KEEP_CHARS)
        .collect();
    cut.push_str("...");
    cut
}

/// Embed reporting a failed run.
pub fn error_payload(footer: &str, message: &str, context: Option<&str>) -> Value {
    let mut fields = vec![json!({ "name": "Error Message", "value": message, "inline": false })];
    if let Some(context) = context {
        fields.push(json!({ "name": "Context", "value": context, "inline": false }));
    }
    fields.push(json!({
        "name": "Timestamp",
        "value": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        "inline": true,
    }));

    json!({
        "embeds": [{
            "title": "⚠️ Monitor error",
            "color": COLOR_ERROR,
            "fields": fields,
            "footer": { "text": format!("{footer} - Error Alert") },
        }]
    })
}

/// Embed confirming the webhook works.
pub fn test_payload(footer: &str) -> Value {
    json!({
        "embeds": [{
            "title": "🧪 Test message",
            "description": "The monitor can reach this channel.",
            "color": COLOR_TEST,
            "fields": [
                { "name": "Status", "value": "✅ All systems operational", "inline": true },
                {
                    "name": "Test Time",
                    "value": Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
                    "inline": true,
                },
            ],
            "footer": { "text": format!("{footer} - Test") },
        }]
    })
}
