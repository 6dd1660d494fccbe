// src/pipeline/poll.rs

//! The poll loop: fetch, extract, detect, notify, sleep, forever.
//!
//! Each cycle takes the previous [`CycleState`] and produces the next one.
//! A cycle that fails (or panics) is logged and leaves the state untouched,
//! so one bad cycle never stops the loop.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use chrono::{DateTime, Utc};
use futures::FutureExt;

use crate::error::Result;
use crate::models::{ObservedLinkSet, PollSettings, TrackedSite};
use crate::pipeline::detect::detect;
use crate::services::{LinkExtractor, Notifier, PageFetcher};

/// State carried from one cycle to the next.
#[derive(Debug, Clone, Default)]
pub struct CycleState {
    observed: ObservedLinkSet,
    cycles_completed: u64,
    last_success: Option<DateTime<Utc>>,
}

impl CycleState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Baseline from the last successful cycle.
    pub fn observed(&self) -> &ObservedLinkSet {
        &self.observed
    }

    /// True until a cycle has fetched and extracted successfully.
    pub fn is_first_cycle(&self) -> bool {
        self.cycles_completed == 0
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn last_success(&self) -> Option<DateTime<Utc>> {
        self.last_success
    }

    /// State after a successful cycle that extracted `links`.
    ///
    /// The baseline is replaced wholesale, even by an empty list, unless
    /// `keep_on_empty` is set. In that case an empty extraction leaves the
    /// state untouched, so an empty first cycle does not count as the baseline.
    fn advance(&self, links: Vec<String>, keep_on_empty: bool) -> Self {
        if links.is_empty() && keep_on_empty {
            log::warn!(
                "Extraction returned no links; keeping the previous {} as baseline",
                self.observed.len()
            );
            return self.clone();
        }

        Self {
            observed: ObservedLinkSet::new(links),
            cycles_completed: self.cycles_completed + 1,
            last_success: Some(Utc::now()),
        }
    }
}

/// What happened during one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The page could not be fetched; the baseline is unchanged.
    FetchFailed,
    /// First successful cycle; the baseline was captured without notifying.
    Baseline { links: usize },
    /// No new links.
    Unchanged { links: usize },
    /// New links appeared, but not at the top.
    AddedBelowTop { added: Vec<String> },
    /// The topmost link was new and a notification was attempted.
    Notified { link: String, delivered: bool },
    /// The cycle errored or panicked; the baseline is unchanged.
    Failed,
}

/// Drives the polling cycles for one tracked site.
pub struct Poller<'a> {
    site: TrackedSite,
    extractor: LinkExtractor,
    fetcher: &'a dyn PageFetcher,
    notifier: &'a dyn Notifier,
    settings: PollSettings,
}

impl<'a> Poller<'a> {
    pub fn new(
        site: TrackedSite,
        fetcher: &'a dyn PageFetcher,
        notifier: &'a dyn Notifier,
        settings: PollSettings,
    ) -> Self {
        let extractor = LinkExtractor::new(&site);
        Self {
            site,
            extractor,
            fetcher,
            notifier,
            settings,
        }
    }

    pub fn site(&self) -> &TrackedSite {
        &self.site
    }

    pub fn extractor(&self) -> &LinkExtractor {
        &self.extractor
    }

    /// Poll until the process is killed.
    pub async fn run(&self) {
        let mut state = CycleState::new();
        let delay = self.settings.delay();

        loop {
            let (next, outcome) = self.run_cycle(state).await;
            state = next;
            log::debug!(
                "Cycle outcome: {:?} ({} successful cycles, last at {:?})",
                outcome,
                state.cycles_completed(),
                state.last_success()
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// Run one cycle. Errors and panics are logged and keep `state` as is.
    pub async fn run_cycle(&self, state: CycleState) -> (CycleState, CycleOutcome) {
        let attempt = AssertUnwindSafe(self.try_cycle(&state))
            .catch_unwind()
            .await;

        match attempt {
            Ok(Ok((next, outcome))) => (next.unwrap_or(state), outcome),
            Ok(Err(e)) => {
                log::error!("Error checking for new links: {}", e);
                (state, CycleOutcome::Failed)
            }
            Err(payload) => {
                log::error!(
                    "Cycle aborted unexpectedly: {}",
                    panic_message(payload.as_ref())
                );
                (state, CycleOutcome::Failed)
            }
        }
    }

    /// Returns `None` as the next state when the baseline must not change.
    async fn try_cycle(&self, state: &CycleState) -> Result<(Option<CycleState>, CycleOutcome)> {
        let markup = match self.fetcher.fetch(&self.site.url).await {
            Ok(markup) => markup,
            Err(e) => {
                log::warn!("{}", e);
                return Ok((None, CycleOutcome::FetchFailed));
            }
        };

        let current = self.extractor.extract(&markup)?.hrefs();
        let is_first = state.is_first_cycle();
        let detection = detect(&current, state.observed().links(), is_first);

        log::debug!(
            "URL: {} | links: {} | new press release link: {:?}",
            self.site.url,
            current.len(),
            detection.newest
        );

        let outcome = if is_first {
            log::info!("Baseline captured with {} links", current.len());
            CycleOutcome::Baseline {
                links: current.len(),
            }
        } else if let Some(link) = detection.newest {
            log::info!("New press release found: {}", link);
            let delivered = self.notifier.notify(&link, &self.site.notify_url).await;
            CycleOutcome::Notified { link, delivered }
        } else if detection.has_additions() {
            log::info!(
                "{} new link(s) below the top entry, not notifying",
                detection.added.len()
            );
            CycleOutcome::AddedBelowTop {
                added: detection.added,
            }
        } else {
            CycleOutcome::Unchanged {
                links: current.len(),
            }
        };

        let next = state.advance(current, self.settings.keep_baseline_on_empty);
        Ok((Some(next), outcome))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
