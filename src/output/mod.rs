//! Output module for persisting and reporting matches
//!
//! This module handles:
//! - Accumulating matched items without duplicates
//! - Rewriting the JSON snapshot after every new match
//! - Summarizing matches by price

mod store;
mod summary;

pub use store::{detail_url, read_snapshot, ResultStore, SnapshotOutcome, SnapshotRecord};
pub use summary::{print_summary, ScanSummary, SummaryEntry};

use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to (de)serialize snapshot: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;
