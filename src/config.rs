// src/config.rs

//! Configuration loading utilities.
//!
//! This module decides where the tracked site comes from at startup:
//! CLI overrides, an interactive prompt, or the persisted record.

use std::io::{BufRead, Write};
use std::path::Path;

use crate::error::Result;
use crate::models::{SiteOverrides, TrackedSite};

/// Resolve the site to poll.
///
/// - With overrides, the persisted record is updated (and created if needed).
/// - Without overrides and without a usable file, the user is prompted and the
///   answers are saved.
///
/// The record is then reloaded from disk, so polling always starts from what
/// was just written.
pub fn resolve_site<R: BufRead, W: Write>(
    path: &Path,
    overrides: &SiteOverrides,
    input: R,
    output: W,
) -> Result<TrackedSite> {
    if !overrides.is_empty() {
        update_site(path, overrides)?;
        log::info!("Config file {} updated", path.display());
    } else if TrackedSite::is_missing(path) {
        let site = TrackedSite::prompt(input, output)?;
        site.validate()?;
        site.save(path)?;
        log::info!("Config file {} created", path.display());
    }

    TrackedSite::load(path)
}

/// Apply overrides to the persisted record and rewrite it in full.
pub fn update_site(path: &Path, overrides: &SiteOverrides) -> Result<TrackedSite> {
    let mut site = TrackedSite::load_lenient(path)?;
    site.apply(overrides);
    site.validate()?;
    site.save(path)?;
    Ok(site)
}
