//! Reporting period windows
//!
//! Periods are measured in blocks. Each period of `period_length` blocks is
//! split into:
//! - the commit phase, while progress is below the configured end percentage
//!   (50% by default)
//! - the reveal phase, for the remainder
//!
//! Only commitments (hash plus encrypted report) are accepted in the commit
//! phase.

use crate::{
    collaborators::PeriodOracle,
    error::PhaseViolation,
    Error, Result,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Phase of a reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Commitments accepted
    Commit,
    /// Reports and salts revealed
    Reveal,
}

/// Period index containing `block`
pub fn period_of(block: u64, period_length: u64) -> u64 {
    if period_length == 0 {
        return 0;
    }
    block / period_length
}

/// Percentage (0–100) of the period elapsed at `block`.
///
/// A zero-length period counts as fully elapsed.
pub fn period_progress(block: u64, period_length: u64) -> f64 {
    if period_length == 0 {
        return 100.0;
    }
    100.0 * (block % period_length) as f64 / period_length as f64
}

/// Phase for a given progress.
///
/// Anything not strictly before the end of the commit phase, NaN included,
/// is the reveal phase.
pub fn phase(progress: f64, commit_phase_end_percent: f64) -> Phase {
    if progress < commit_phase_end_percent {
        Phase::Commit
    } else {
        Phase::Reveal
    }
}

/// Source of the current block height
pub trait BlockHeightSource: Send + Sync {
    /// Latest block number
    fn block_number(&self) -> u64;
}

impl BlockHeightSource for AtomicU64 {
    fn block_number(&self) -> u64 {
        self.load(Ordering::SeqCst)
    }
}

/// Period oracle driven by block height
#[derive(Debug)]
pub struct BlockHeightOracle<S> {
    source: S,
}

impl<S: BlockHeightSource> BlockHeightOracle<S> {
    /// Wrap a block height source
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Underlying source
    pub fn source(&self) -> &S {
        &self.source
    }
}

impl<S: BlockHeightSource> PeriodOracle for BlockHeightOracle<S> {
    fn current_period_progress(&self, period_length: u64) -> f64 {
        period_progress(self.source.block_number(), period_length)
    }
}

/// Commit window guard
#[derive(Debug, Clone, Copy)]
pub struct CommitWindow {
    end_percent: f64,
}

impl CommitWindow {
    /// Commit phase ends at `end_percent` of the period
    pub fn new(end_percent: f64) -> Self {
        Self { end_percent }
    }

    /// Fails with a phase violation once the commit phase is over.
    ///
    /// Returns the observed progress.
    pub fn check(&self, oracle: &dyn PeriodOracle, period_length: u64) -> Result<f64> {
        let progress = oracle.current_period_progress(period_length);
        debug!(progress, end_percent = self.end_percent, "Commit window check");

        match phase(progress, self.end_percent) {
            Phase::Commit => Ok(progress),
            Phase::Reveal => Err(Error::PhaseViolation(PhaseViolation::WindowClosed)),
        }
    }
}

impl Default for CommitWindow {
    fn default() -> Self {
        Self::new(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_period_math() {
        assert_eq!(period_of(1_000, 100), 10);
        assert_eq!(period_progress(1_025, 100), 25.0);
        assert_eq!(period_progress(1_099, 100), 99.0);
        assert_eq!(period_progress(5, 0), 100.0);
        assert_eq!(period_of(5, 0), 0);
    }

    #[test]
    fn test_phase_boundary() {
        assert_eq!(phase(49.9, 50.0), Phase::Commit);
        assert_eq!(phase(50.0, 50.0), Phase::Reveal);
        assert_eq!(phase(0.0, 50.0), Phase::Commit);
        assert_eq!(phase(f64::NAN, 50.0), Phase::Reveal);
        assert_eq!(phase(10.0, f64::NAN), Phase::Reveal);
    }

    #[test]
    fn test_block_height_oracle() {
        let oracle = BlockHeightOracle::new(AtomicU64::new(210));
        assert_eq!(oracle.current_period_progress(100), 10.0);

        oracle.source().store(260, Ordering::SeqCst);
        assert_eq!(oracle.current_period_progress(100), 60.0);
    }

    #[test]
    fn test_commit_window_check() {
        let window = CommitWindow::default();
        let open = BlockHeightOracle::new(AtomicU64::new(10));
        assert_eq!(window.check(&open, 100).unwrap(), 10.0);

        let closed = BlockHeightOracle::new(AtomicU64::new(50));
        assert!(matches!(
            window.check(&closed, 100),
            Err(Error::PhaseViolation(PhaseViolation::WindowClosed))
        ));
    }
}
