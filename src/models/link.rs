//! Link data structures.

use serde::{Deserialize, Serialize};

/// A link extracted from the listing page.
///
/// Duplicates are allowed here; uniqueness only matters when comparing
/// against the observed set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Raw `href` attribute value
    pub href: String,

    /// Publication date text, when extracted with a date selector
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
}

impl LinkRecord {
    /// A link found by position only.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            published: None,
        }
    }

    /// A link paired with its publication date text.
    pub fn dated(href: impl Into<String>, published: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            published: Some(published.into()),
        }
    }
}

/// The ordered hrefs captured by the most recent successful cycle.
///
/// Replaced wholesale every cycle; never merged and never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservedLinkSet {
    links: Vec<String>,
}

impl ObservedLinkSet {
    pub fn new(links: Vec<String>) -> Self {
        Self { links }
    }

    pub fn links(&self) -> &[String] {
        &self.links
    }

    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Swap in a new baseline, returning the old one.
    pub fn replace(&mut self, links: Vec<String>) -> Vec<String> {
        std::mem::replace(&mut self.links, links)
    }
}
