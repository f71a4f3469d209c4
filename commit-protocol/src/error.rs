//! Error types for the commit protocol

use thiserror::Error;

/// Result type for commit protocol operations
pub type Result<T> = std::result::Result<T, Error>;

/// Call return code for a period that rolled over mid-submission
pub const CODE_PERIOD_ROLLED_OVER: &str = "0";

/// Call return code for "not in commit phase, or already submitted"
pub const CODE_NOT_COMMIT_PHASE: &str = "-2";

/// Message consumers match on for [`CODE_NOT_COMMIT_PHASE`]
pub const MSG_NOT_COMMIT_PHASE: &str = "not in first half of period (commit phase)";

/// Message for a pending rep redistribution
pub const MSG_REDISTRIBUTION_PENDING: &str = "rep redistribution not done";

/// Why a submission was outside the commit phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseViolation {
    /// Local guard: period progress already past the commit window
    WindowClosed,
    /// Contract returned `-2` and no report hash is stored for the reporter
    NotCommitPhase,
}

/// Commit protocol errors
#[derive(Error, Debug)]
pub enum Error {
    /// Report encoding error
    #[error("Codec error: {0}")]
    Codec(#[from] report_core::Error),

    /// Outside the commit window
    #[error("not in first half of period (commit phase)")]
    PhaseViolation(PhaseViolation),

    /// Rep redistribution has not completed for the branch
    #[error("rep redistribution not done")]
    RedistributionPending,

    /// Period kept rolling over until the attempt cap was reached
    #[error("period rolled over on every submission ({attempts} attempts)")]
    TransientRejection {
        /// Dispatches made
        attempts: u32,
    },

    /// Dispatcher or ledger query failure, passed through verbatim
    #[error("{0}")]
    Transport(String),

    /// Submission cancelled by the caller
    #[error("Submission cancelled")]
    Cancelled,

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Contract rejection code and message, for errors that map to one
    pub fn rejection(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Error::PhaseViolation(_) => Some((CODE_NOT_COMMIT_PHASE, MSG_NOT_COMMIT_PHASE)),
            Error::TransientRejection { .. } => Some((CODE_PERIOD_ROLLED_OVER, "period rolled over")),
            _ => None,
        }
    }
}

impl From<prometheus::Error> for Error {
    fn from(err: prometheus::Error) -> Self {
        Error::Config(format!("metrics registration failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_violation_message_is_stable() {
        let err = Error::PhaseViolation(PhaseViolation::WindowClosed);
        assert_eq!(err.to_string(), MSG_NOT_COMMIT_PHASE);
        assert_eq!(err.rejection(), Some(("-2", MSG_NOT_COMMIT_PHASE)));

        let err = Error::PhaseViolation(PhaseViolation::NotCommitPhase);
        assert_eq!(err.to_string(), MSG_NOT_COMMIT_PHASE);
    }

    #[test]
    fn test_redistribution_message() {
        assert_eq!(Error::RedistributionPending.to_string(), MSG_REDISTRIBUTION_PENDING);
        assert_eq!(Error::RedistributionPending.rejection(), None);
    }

    #[test]
    fn test_transport_is_verbatim() {
        let err = Error::Transport("RPC timeout".to_string());
        assert_eq!(err.to_string(), "RPC timeout");
    }
}
