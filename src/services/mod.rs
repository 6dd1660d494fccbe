//! Service layer for the watcher.
//!
//! This module contains the collaborators driven by the poll loop:
//! - Page fetching (`PageFetcher`, `HttpFetcher`)
//! - Link extraction (`LinkExtractor`)
//! - Webhook delivery (`Notifier`, `WebhookNotifier`)

mod extractor;
mod fetcher;
mod notifier;

pub use extractor::{
    Extraction, LINK_SELECTOR, LinkExtractor, Strategy, StrategyKind, extract_dated,
    extract_positional,
};
pub use fetcher::{HttpFetcher, PageFetcher};
pub use notifier::{Notifier, WebhookNotifier};
