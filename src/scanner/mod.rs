//! Scanner module for walking the marketplace listing
//!
//! This module contains the core scanning logic, including:
//! - HTTP page fetching and failure classification
//! - Keyword matching over a page's items
//! - Injectable sleeping and interrupt handling
//! - The scan loop that ties them together

mod clock;
mod fetcher;
mod filter;
mod scan_loop;

pub use clock::{interrupt_channel, Clock, Interrupt, InterruptHandle, TokioClock};
pub use fetcher::{
    build_http_client, parse_page, Cursor, FetchError, HttpPageFetcher, Item, Page, PageSource,
};
pub use filter::matches;
pub use scan_loop::{ScanLoop, ScanOutcome, Termination};

use crate::config::Config;
use crate::keywords::KeywordSet;
use crate::output::ResultStore;
use crate::ScanError;

/// Runs one scan of the live listing
///
/// This is the main entry point for a scan invocation. It will:
/// 1. Build the HTTP fetcher with the session token
/// 2. Walk the listing from its first page
/// 3. Record new matches in `store`, rewriting the configured snapshot
///
/// # Returns
///
/// * `Ok(ScanOutcome)` - How the scan ended; fatal HTTP failures are
///   reported here, not as errors
/// * `Err(ScanError)` - The HTTP client could not be built
pub async fn scan(
    config: &Config,
    session_token: &str,
    keywords: &KeywordSet,
    store: &mut ResultStore,
    interrupt: &mut Interrupt,
) -> Result<ScanOutcome, ScanError> {
    let fetcher = HttpPageFetcher::new(&config.api, session_token)?;
    let mut scan_loop = ScanLoop::new(
        fetcher,
        config.scan.clone(),
        &config.output.snapshot_path,
    );
    Ok(scan_loop.run(keywords, store, interrupt).await)
}
