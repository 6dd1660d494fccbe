// src/models/mod.rs

//! Domain models for the watcher.
//!
//! This module contains all data structures used throughout the application,
//! organized by their primary purpose.

mod config;
mod link;
mod notification;

// Re-export all public types
pub use config::{ClientConfig, PollSettings, SiteOverrides, TrackedSite};
pub use link::{LinkRecord, ObservedLinkSet};
pub use notification::NotificationEvent;
