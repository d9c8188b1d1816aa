//! Magic-Market Scanner: a polite marketplace listing watcher
//!
//! This crate walks a cursor-paginated marketplace listing endpoint to
//! exhaustion, filters listed items by keyword, and persists every match
//! incrementally to a JSON snapshot so that an interrupted scan never loses
//! what it already found.

pub mod config;
pub mod keywords;
pub mod output;
pub mod scanner;
pub mod state;

use thiserror::Error;

/// Errors raised while setting up a scan
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid header value for {name}")]
    InvalidHeader { name: String },
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

// Re-export commonly used types
pub use config::Config;
pub use keywords::KeywordSet;
pub use output::{ResultStore, ScanSummary};
pub use scanner::{HttpPageFetcher, Item, Page, PageSource, ScanLoop, ScanOutcome, Termination};
pub use state::{OperatorCommand, ScanState, Session, SessionState};
