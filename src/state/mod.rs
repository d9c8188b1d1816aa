//! State module for tracking scan progress
//!
//! This module provides the two state machines of the scanner.
//!
//! # Components
//!
//! - `ScanState`: where a single scan loop invocation currently is
//!   (requesting, filtering, backing off, terminated)
//! - `Session`: the operator-facing lifecycle around scan invocations
//!   (scanning, paused, resumed, reset, exited)

mod scan_state;
mod session;

// Re-export main types
pub use scan_state::ScanState;
pub use session::{OperatorCommand, Session, SessionError, SessionEvent, SessionState};
