// src/services/extractor.rs

//! Link extraction from a press release listing page.
//!
//! Two strategies produce an ordered list of links, newest first:
//!
//! - **Date**: pair the text of every element matching the configured date
//!   selector with the `a[href]` links found in the parents of those elements,
//!   then sort by date text, descending. The sort is lexical, so the dates
//!   must sort correctly as strings (ISO dates do).
//! - **Positional**: the first `num_links` links in document order.
//!
//! The date strategy falls back to the positional one when it cannot pair
//! dates with links one to one.

use std::collections::HashSet;

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::models::{LinkRecord, TrackedSite};

/// Selector for hyperlinks carrying an `href`.
pub const LINK_SELECTOR: &str = "a[href]";

/// Extraction strategy, selected up front from the site config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Strategy {
    /// Sort links by the text of elements matching `selector`.
    Date { selector: String },
    /// Take the first `limit` links in document order.
    Positional { limit: usize },
}

impl Strategy {
    /// Pick the strategy for a site. A blank date selector counts as unset.
    pub fn for_site(site: &TrackedSite) -> Self {
        match site.date_selector() {
            Some(selector) => Self::Date {
                selector: selector.to_string(),
            },
            None => Self::Positional {
                limit: site.num_links,
            },
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Self::Date { .. } => StrategyKind::Date,
            Self::Positional { .. } => StrategyKind::Positional,
        }
    }
}

/// Which strategy produced an [`Extraction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StrategyKind {
    Date,
    Positional,
}

/// Links extracted from one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    /// Newest first
    pub links: Vec<LinkRecord>,
    /// Strategy that produced `links`
    pub strategy: StrategyKind,
    /// Why the date strategy was abandoned, if it was
    pub fallback_reason: Option<String>,
}

impl Extraction {
    /// The extracted hrefs, in order.
    pub fn hrefs(&self) -> Vec<String> {
        self.links.iter().map(|l| l.href.clone()).collect()
    }
}

/// Extracts the current links of a tracked site.
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    strategy: Strategy,
    fallback_limit: usize,
}

impl LinkExtractor {
    pub fn new(site: &TrackedSite) -> Self {
        Self {
            strategy: Strategy::for_site(site),
            fallback_limit: site.num_links,
        }
    }

    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Note for the caller to show once when no date selector is configured.
    pub fn setup_note(&self) -> Option<&'static str> {
        match self.strategy {
            Strategy::Positional { .. } => {
                Some("No CSS selector given. Falling back to link-based checking.")
            }
            Strategy::Date { .. } => None,
        }
    }

    /// Extract links from `markup`, newest first.
    ///
    /// Only a failure of the positional strategy is returned as an error;
    /// date strategy failures fall back to it.
    pub fn extract(&self, markup: &str) -> Result<Extraction> {
        let document = Html::parse_document(markup);

        match &self.strategy {
            Strategy::Positional { limit } => Ok(Extraction {
                links: extract_positional(&document, *limit)?,
                strategy: StrategyKind::Positional,
                fallback_reason: None,
            }),
            Strategy::Date { selector } => match extract_dated(&document, selector) {
                Ok(links) => Ok(Extraction {
                    links,
                    strategy: StrategyKind::Date,
                    fallback_reason: None,
                }),
                Err(reason) => {
                    log::warn!(
                        "Date-based extraction failed ({}). Falling back to link-based checking.",
                        reason
                    );
                    Ok(Extraction {
                        links: extract_positional(&document, self.fallback_limit)?,
                        strategy: StrategyKind::Positional,
                        fallback_reason: Some(reason.to_string()),
                    })
                }
            },
        }
    }
}

/// The first `limit` link hrefs in document order.
pub fn extract_positional(document: &Html, limit: usize) -> Result<Vec<LinkRecord>> {
    let link_sel = parse_selector(LINK_SELECTOR)?;

    Ok(document
        .select(&link_sel)
        .filter_map(href)
        .take(limit)
        .map(LinkRecord::new)
        .collect())
}

/// Links paired with the dates matched by `date_selector`, newest first.
///
/// Links are scoped to the distinct parents of the date elements. Fails when
/// the selector is invalid, matches nothing, has no parent to scope links
/// from, or when the number of dates and links differ.
pub fn extract_dated(document: &Html, date_selector: &str) -> Result<Vec<LinkRecord>> {
    let date_sel = parse_selector(date_selector)?;
    let link_sel = parse_selector(LINK_SELECTOR)?;

    let date_elems: Vec<ElementRef> = document.select(&date_sel).collect();
    if date_elems.is_empty() {
        return Err(AppError::extraction(format!(
            "selector '{date_selector}' matched nothing"
        )));
    }

    let dates: Vec<String> = date_elems
        .iter()
        .map(|e| e.text().collect::<String>().trim().to_string())
        .collect();

    let mut seen = HashSet::new();
    let mut scopes = Vec::new();
    for elem in &date_elems {
        let parent = elem
            .parent()
            .and_then(ElementRef::wrap)
            .ok_or_else(|| AppError::extraction("date element has no parent to scope links"))?;
        if seen.insert(parent.id()) {
            scopes.push(parent);
        }
    }

    let hrefs: Vec<&str> = scopes
        .iter()
        .flat_map(|scope| scope.select(&link_sel))
        .filter_map(href)
        .collect();

    if dates.len() != hrefs.len() {
        return Err(AppError::extraction(format!(
            "found {} dates but {} links",
            dates.len(),
            hrefs.len()
        )));
    }

    let mut links: Vec<LinkRecord> = hrefs
        .into_iter()
        .zip(dates)
        .map(|(href, date)| LinkRecord::dated(href, date))
        .collect();

    // Stable: equal dates keep document order.
    links.sort_by(|a, b| b.published.cmp(&a.published));
    Ok(links)
}

/// Non-blank `href` of an anchor.
fn href<'a>(anchor: ElementRef<'a>) -> Option<&'a str> {
    anchor.value().attr("href").filter(|h| !h.trim().is_empty())
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
