//! External collaborators of the commit protocol
//!
//! The protocol never talks to a node directly. Transaction dispatch, period
//! state and stored reports all come through these traits.

use crate::{
    types::{ContractCall, ReportQuery, SentTransaction, TxResponse},
    Result,
};
use async_trait::async_trait;

/// Callback invoked once a transaction is accepted into the pending pool
pub type OnSent<'a> = &'a (dyn Fn(&SentTransaction) + Send + Sync);

/// Broadcasts prepared calls and waits for their result
#[async_trait]
pub trait TransactionDispatcher: Send + Sync {
    /// Send `call`, invoke `on_sent` after broadcast, resolve on confirmation
    async fn transact(&self, call: &ContractCall, on_sent: OnSent<'_>) -> Result<TxResponse>;
}

/// Progress through the current reporting period
pub trait PeriodOracle: Send + Sync {
    /// Percentage (0–100) of the current period elapsed
    fn current_period_progress(&self, period_length: u64) -> f64;
}

/// On-chain period bookkeeping
#[async_trait]
pub trait PeriodChecker: Send + Sync {
    /// Advance the reporter's period if needed; returns the new period
    async fn check_period(&self, branch: &str, period_length: u64, reporter: &str) -> Result<u64>;

    /// Whether rep redistribution has completed for the reporter on `branch`
    async fn rep_redistribution_done(&self, branch: &str, reporter: &str) -> Result<bool>;
}

/// Stored commitments
#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Stored report hash (`0x0` when nothing is stored)
    async fn get_report_hash(&self, query: &ReportQuery) -> Result<String>;

    /// Stored `[encryptedReport, encryptedSalt, ethics]`
    async fn get_encrypted_report(&self, query: &ReportQuery) -> Result<Vec<String>>;
}
