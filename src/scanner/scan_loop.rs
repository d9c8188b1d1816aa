//! Scan loop - cursor walking, retry policy and incremental persistence
//!
//! This module contains the main scan loop, which:
//! - Walks the listing from the first page until the server hands out no cursor
//! - Retries the same cursor after rate limiting or transport failures
//! - Stops the session on any other failure, keeping what was found
//! - Filters each page and rewrites the snapshot after every new match
//! - Honors an external interrupt during every request and pause

use crate::config::ScanConfig;
use crate::keywords::KeywordSet;
use crate::output::ResultStore;
use crate::scanner::clock::{Clock, Interrupt, TokioClock};
use crate::scanner::fetcher::{Cursor, FetchError, PageSource};
use crate::scanner::filter;
use crate::state::ScanState;
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Why a scan loop invocation stopped
#[derive(Debug, Clone, PartialEq)]
pub enum Termination {
    /// The server returned a page without a next cursor
    Exhausted,

    /// A non-retryable failure ended the session
    Fatal(FetchError),

    /// The interrupt fired during a request or a pause
    Interrupted,
}

impl Termination {
    fn state(&self) -> ScanState {
        match self {
            Self::Exhausted => ScanState::Exhausted,
            Self::Fatal(_) => ScanState::Fatal,
            Self::Interrupted => ScanState::Interrupted,
        }
    }
}

/// Result of one scan loop invocation
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOutcome {
    pub termination: Termination,

    /// Page requests attempted, retries included
    pub pages_requested: u32,

    /// Items added to the store by this invocation
    pub new_matches: usize,
}

/// Drives the cursor through the listing
///
/// The loop owns its page source and clock but only borrows the result
/// store, so the caller decides whether matches survive into the next
/// invocation (resume) or not (reset).
pub struct ScanLoop<S, C = TokioClock> {
    source: S,
    clock: C,
    pacing: ScanConfig,
    snapshot_path: PathBuf,
    state: ScanState,
}

impl<S: PageSource> ScanLoop<S, TokioClock> {
    /// Creates a scan loop that sleeps on the tokio timer
    pub fn new(source: S, pacing: ScanConfig, snapshot_path: impl Into<PathBuf>) -> Self {
        Self::with_clock(source, TokioClock, pacing, snapshot_path)
    }
}

impl<S: PageSource, C: Clock> ScanLoop<S, C> {
    pub fn with_clock(
        source: S,
        clock: C,
        pacing: ScanConfig,
        snapshot_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            source,
            clock,
            pacing,
            snapshot_path: snapshot_path.into(),
            state: ScanState::Idle,
        }
    }

    pub fn state(&self) -> ScanState {
        self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    fn transition(&mut self, next: ScanState) {
        debug_assert!(
            self.state.can_transition_to(next),
            "invalid scan transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!("Scan state: {} -> {}", self.state, next);
        self.state = next;
    }

    /// Backoff state and pause for a retryable failure
    fn backoff_for(&self, error: &FetchError) -> (ScanState, Duration) {
        match error {
            FetchError::RateLimited => (
                ScanState::BackoffRateLimited,
                self.pacing.rate_limit_cooldown(),
            ),
            _ => (
                ScanState::BackoffTransient,
                self.pacing.transient_retry_delay(),
            ),
        }
    }

    /// Walks the listing once, from the first page
    ///
    /// # Loop
    ///
    /// 1. Request the page at the current cursor (none for the first page)
    /// 2. On `RateLimited`, cool down and request the same cursor again
    /// 3. On `Transport`, wait briefly and request the same cursor again
    /// 4. On `HttpStatus` / `MalformedResponse`, stop with `Fatal`
    /// 5. On a page without a next cursor, stop with `Exhausted`; that
    ///    page's items are not matched
    /// 6. Otherwise advance the cursor, match the page's items, add them to
    ///    the store and rewrite the snapshot after each new match
    /// 7. Pause between pages and repeat
    ///
    /// Retries are unbounded and use fixed delays. Snapshot write failures
    /// are logged and do not stop the scan.
    pub async fn run(
        &mut self,
        keywords: &KeywordSet,
        store: &mut ResultStore,
        interrupt: &mut Interrupt,
    ) -> ScanOutcome {
        // A previous run may have been dropped mid-request
        self.state = ScanState::Idle;

        let mut cursor: Option<Cursor> = None;
        let mut pages_requested = 0u32;
        let mut new_matches = 0usize;

        tracing::info!("Starting scan, keywords: {}", keywords);

        let termination = loop {
            pages_requested = pages_requested.saturating_add(1);
            self.transition(ScanState::Requesting);
            tracing::info!("Scanning page {}...", pages_requested);

            let result = match interrupt.guard(self.source.fetch(cursor.as_ref())).await {
                Some(result) => result,
                None => break Termination::Interrupted,
            };

            let page = match result {
                Ok(page) => page,
                Err(error) if error.is_retryable() => {
                    let (state, delay) = self.backoff_for(&error);
                    self.transition(state);
                    match &error {
                        FetchError::RateLimited => tracing::warn!(
                            "Rate limited (HTTP 412) at {}, pausing {}s before retrying",
                            Local::now().format("%Y-%m-%d %H:%M:%S"),
                            delay.as_secs()
                        ),
                        _ => tracing::warn!("{}, retrying in {}s", error, delay.as_secs()),
                    }
                    if interrupt.guard(self.clock.sleep(delay)).await.is_none() {
                        break Termination::Interrupted;
                    }
                    if state == ScanState::BackoffRateLimited {
                        tracing::info!("Cooldown over, resuming scan");
                    }
                    continue;
                }
                Err(error) => {
                    match &error {
                        FetchError::HttpStatus { status, body } => {
                            tracing::error!("Request failed with status {}: {}", status, body)
                        }
                        FetchError::MalformedResponse { reason, body } => {
                            tracing::error!("Unexpected response ({}): {}", reason, body)
                        }
                        _ => tracing::error!("Request failed: {}", error),
                    }
                    break Termination::Fatal(error);
                }
            };

            let Some(next_cursor) = page.next_cursor else {
                tracing::info!("All pages scanned");
                break Termination::Exhausted;
            };
            cursor = Some(next_cursor);

            self.transition(ScanState::Filtering);
            for item in filter::matches(&page.items, keywords) {
                if !store.add(item.clone()) {
                    continue;
                }
                new_matches += 1;
                tracing::info!("Found match: {} - price: {}", item.name, item.price_label());

                if let Err(e) = store.save_snapshot(&self.snapshot_path) {
                    tracing::warn!(
                        "Failed to save snapshot to {}: {}",
                        self.snapshot_path.display(),
                        e
                    );
                }
            }

            if interrupt
                .guard(self.clock.sleep(self.pacing.inter_page_delay()))
                .await
                .is_none()
            {
                break Termination::Interrupted;
            }
        };

        self.transition(termination.state());
        tracing::info!(
            "Scan stopped ({}) after {} page requests: {} new matches, {} total",
            self.state,
            pages_requested,
            new_matches,
            store.len()
        );

        ScanOutcome {
            termination,
            pages_requested,
            new_matches,
        }
    }
}
