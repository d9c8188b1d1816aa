/// Scan loop state definitions
///
/// This module defines every state a scan loop invocation can be in.
use std::fmt;

/// Represents the current state of a scan loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    // ===== Active States =====
    /// No request issued yet
    Idle,

    /// A page request is in flight
    Requesting,

    /// Matching a page's items and persisting new matches
    Filtering,

    // ===== Backoff States =====
    /// Cooling down after HTTP 412
    BackoffRateLimited,

    /// Waiting to retry after a transport failure
    BackoffTransient,

    // ===== Terminal States =====
    /// The listing was walked to its last page
    Exhausted,

    /// A non-retryable response ended the session
    Fatal,

    /// The operator interrupted the scan
    Interrupted,
}

impl ScanState {
    /// Returns true if the loop has stopped
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Exhausted | Self::Fatal | Self::Interrupted)
    }

    /// Returns true if the loop may move from `self` to `next`
    ///
    /// Interruption is reachable from every active state. A terminated loop
    /// only goes back to `Idle` when it is run again.
    pub fn can_transition_to(&self, next: ScanState) -> bool {
        use ScanState::*;

        if next == Interrupted {
            return !self.is_terminal();
        }

        match self {
            Idle => next == Requesting,
            Requesting => matches!(
                next,
                Filtering | BackoffRateLimited | BackoffTransient | Exhausted | Fatal
            ),
            Filtering | BackoffRateLimited | BackoffTransient => next == Requesting,
            Exhausted | Fatal | Interrupted => next == Idle,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Requesting => "requesting",
            Self::Filtering => "filtering",
            Self::BackoffRateLimited => "backoff_rate_limited",
            Self::BackoffTransient => "backoff_transient",
            Self::Exhausted => "exhausted",
            Self::Fatal => "fatal",
            Self::Interrupted => "interrupted",
        }
    }

    /// Returns all possible scan states
    pub fn all_states() -> Vec<Self> {
        vec![
            Self::Idle,
            Self::Requesting,
            Self::Filtering,
            Self::BackoffRateLimited,
            Self::BackoffTransient,
            Self::Exhausted,
            Self::Fatal,
            Self::Interrupted,
        ]
    }
}

impl fmt::Display for ScanState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
