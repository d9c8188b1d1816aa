//! Operator session lifecycle
//!
//! A session wraps any number of scan loop invocations. The scan loop knows
//! nothing about it: the caller feeds the session scan outcomes and operator
//! commands, and the session says what may happen next.

use std::fmt;
use thiserror::Error;

/// Where the operator-facing session is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting for credentials and keywords
    Idle,

    /// A scan loop invocation is running
    Scanning,

    /// A scan stopped and the operator must choose what to do
    Paused {
        /// Whether `Continue` is offered (only after an interrupt)
        resumable: bool,
    },

    /// Continuing with the same keywords and matches
    Resumed,

    /// Starting over with fresh credentials, keywords and matches
    Reset,

    /// The operator quit
    Exited,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Scanning => write!(f, "scanning"),
            Self::Paused { resumable: true } => write!(f, "paused (resumable)"),
            Self::Paused { resumable: false } => write!(f, "paused"),
            Self::Resumed => write!(f, "resumed"),
            Self::Reset => write!(f, "reset"),
            Self::Exited => write!(f, "exited"),
        }
    }
}

/// Operator choice offered while paused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCommand {
    /// Scan again with the same keywords, keeping matches
    Continue,

    /// Quit the program
    Terminate,

    /// Start over from the prompts with an empty store
    Restart,
}

impl OperatorCommand {
    /// Parses `C`/`T`/`S` (or the command words), ignoring case and whitespace
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "c" | "continue" => Some(Self::Continue),
            "t" | "terminate" | "exit" | "quit" => Some(Self::Terminate),
            "s" | "restart" | "reset" => Some(Self::Restart),
            _ => None,
        }
    }

    /// The single-letter shortcut shown in prompts
    pub fn shortcut(&self) -> char {
        match self {
            Self::Continue => 'C',
            Self::Terminate => 'T',
            Self::Restart => 'S',
        }
    }
}

impl fmt::Display for OperatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Continue => "Continue scanning",
            Self::Terminate => "Terminate",
            Self::Restart => "Restart",
        };
        write!(f, "{} ({})", label, self.shortcut())
    }
}

/// Something that happened to the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// A scan loop invocation begins
    Start,

    /// The running scan was interrupted
    ScanInterrupted,

    /// The running scan ended on its own, exhausted or failed
    ScanFinished,

    /// The operator chose a command
    Command(OperatorCommand),
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Invalid session transition: {event:?} while {from}")]
    InvalidTransition {
        from: SessionState,
        event: SessionEvent,
    },
}

/// Operator session state machine
#[derive(Debug, Clone)]
pub struct Session {
    state: SessionState,
    scans_started: u32,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
            scans_started: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of scan invocations started in this session
    pub fn scans_started(&self) -> u32 {
        self.scans_started
    }

    /// Commands the operator may pick in the current state
    pub fn available_commands(&self) -> Vec<OperatorCommand> {
        match self.state {
            SessionState::Paused { resumable: true } => vec![
                OperatorCommand::Continue,
                OperatorCommand::Terminate,
                OperatorCommand::Restart,
            ],
            SessionState::Paused { resumable: false } => {
                vec![OperatorCommand::Terminate, OperatorCommand::Restart]
            }
            _ => Vec::new(),
        }
    }

    /// Applies `event`, returning the new state
    ///
    /// # Transitions
    ///
    /// | From | Event | To |
    /// |------|-------|----|
    /// | Idle, Resumed, Reset | Start | Scanning |
    /// | Scanning | ScanInterrupted | Paused (resumable) |
    /// | Scanning | ScanFinished | Paused |
    /// | Paused (resumable) | Continue | Resumed |
    /// | Paused | Restart | Reset |
    /// | Paused | Terminate | Exited |
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionState, SessionError> {
        use OperatorCommand::*;
        use SessionEvent::*;
        use SessionState::*;

        let next = match (self.state, event) {
            (Idle | Resumed | Reset, Start) => Scanning,
            (Scanning, ScanInterrupted) => Paused { resumable: true },
            (Scanning, ScanFinished) => Paused { resumable: false },
            (Paused { resumable: true }, Command(Continue)) => Resumed,
            (Paused { .. }, Command(Restart)) => Reset,
            (Paused { .. }, Command(Terminate)) => Exited,
            (from, event) => return Err(SessionError::InvalidTransition { from, event }),
        };

        if next == Scanning {
            self.scans_started += 1;
        }

        tracing::debug!("Session: {} -> {}", self.state, next);
        self.state = next;
        Ok(next)
    }
}
