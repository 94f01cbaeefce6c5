//! Service layer for the monitor.
//!
//! This module contains the business logic for:
//! - Article discovery on the series index (`ArticleLister`)
//! - Recommendation extraction (`RecommendationExtractor`)
//! - Streaming platform classification (`classify_platform`)
//! - Outbound notifications (`Notifier`, `DiscordNotifier`)

mod extractor;
mod lister;
mod notifier;
mod platform;

pub use extractor::{
    DESCRIPTION_UNAVAILABLE, NO_DESCRIPTION, RecommendationExtractor, STRATEGIES, Strategy,
};
pub use lister::ArticleLister;
pub use notifier::{
    DiscordNotifier, MAX_EMBED_SHOWS, Notifier, error_payload, new_items_payload, test_payload,
};
pub use platform::classify_platform;
