//! Change detection between polling cycles.
//!
//! Compares the links extracted this cycle against the baseline captured by
//! the previous successful cycle. Only the topmost link can trigger a
//! notification, and only when it was absent from the baseline.

use std::collections::HashSet;

/// Result of comparing the current links against the baseline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    /// The topmost current link, if it is new and this is not the first cycle
    pub newest: Option<String>,
    /// Current links absent from the baseline, in current order, without duplicates
    pub added: Vec<String>,
}

impl Detection {
    /// Check if any link is new.
    pub fn has_additions(&self) -> bool {
        !self.added.is_empty()
    }
}

/// Detect new links.
///
/// `newest` is `current[0]` only if that link is not in `previous`. On the
/// first cycle there is no baseline, so `newest` is always `None`.
pub fn detect(current: &[String], previous: &[String], is_first_cycle: bool) -> Detection {
    let baseline: HashSet<&str> = previous.iter().map(String::as_str).collect();

    let mut seen = HashSet::new();
    let added: Vec<String> = current
        .iter()
        .filter(|link| !baseline.contains(link.as_str()) && seen.insert(link.as_str()))
        .cloned()
        .collect();

    let newest = if is_first_cycle {
        None
    } else {
        current
            .first()
            .filter(|top| !baseline.contains(top.as_str()))
            .cloned()
    };

    Detection { newest, added }
}
