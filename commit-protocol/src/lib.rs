//! Report Commit Protocol
//!
//! Submits prediction-market report commitments during the commit phase of a
//! reporting period.
//!
//! # Architecture

#![forbid(unsafe_code)]
//!
//! Reporting periods are split in two halves:
//!
//! 1. **Commit**: only the hash of a report (plus its encrypted form) may be
//!    published
//! 2. **Reveal**: the plaintext report and salt are published and checked
//!    against the commitment
//!
//! A hash submission walks this state machine:
//!
//! ```text
//! Preparing → CommitWindowCheck → Submitting ─┬─→ Succeeded
//!                   ↑                         ├─→ AwaitingPeriodTransition
//!                   │                         │       → AwaitingRepRedistribution
//!                   └──── Resubmitting ←──────┘              ↓
//!                                                          Failed
//! ```
//!
//! A `"0"` call return means the period rolled over since the guard check;
//! the protocol re-checks the period and redistribution state and retries,
//! up to a configured number of attempts.
//!
//! # Example
//!
//! ```no_run
//! use commit_protocol::{mock::MockLedger, CommitProtocol, CommitSubmission, Config};
//! use std::sync::Arc;
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> commit_protocol::Result<()> {
//!     let ledger = Arc::new(MockLedger::new(10.0));
//!     let protocol = CommitProtocol::with_ledger(Config::default(), ledger)?;
//!
//!     let submission = CommitSubmission {
//!         event: "0xe1".to_string(),
//!         report_hash: "0xabc".to_string(),
//!         encrypted_report: None,
//!         encrypted_salt: None,
//!         ethics: false,
//!         branch: "0xf69b5".to_string(),
//!         period: 397,
//!         period_length: 172_800,
//!     };
//!     let receipt = protocol
//!         .submit_report_hash(&submission, &|_| {}, &CancellationToken::new())
//!         .await?;
//!     println!("committed in {} attempt(s)", receipt.attempts);
//!
//!     Ok(())
//! }
//! ```

#![warn(
    missing_docs,
    rust_2018_idioms,
    missing_debug_implementations,
    clippy::all
)]

pub mod collaborators;
pub mod config;
pub mod error;
pub mod metrics;
pub mod mock;
pub mod protocol;
pub mod types;
pub mod window;

// Re-exports
pub use collaborators::{PeriodChecker, PeriodOracle, ReportStore, TransactionDispatcher};
pub use config::Config;
pub use error::{Error, PhaseViolation, Result};
pub use protocol::CommitProtocol;
pub use types::*;
