//! Configuration module for the market scanner
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//! Every key has a default, so the scanner also runs without any file.
//!
//! # Example
//!
//! ```no_run
//! use magic_market_scanner::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("scanner.toml")).unwrap();
//! println!("Inter-page delay: {}s", config.scan.inter_page_delay_secs);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{ApiConfig, Config, OutputConfig, ScanConfig};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash};
pub use validation::validate;
