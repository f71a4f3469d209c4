//! In-memory ledger for tests and the demo binary
//!
//! Implements every collaborator trait. Call returns are scripted: each
//! dispatch pops the next one, falling back to `"1"` once the script runs
//! out.

use crate::{
    collaborators::{OnSent, PeriodChecker, PeriodOracle, ReportStore, TransactionDispatcher},
    types::{ContractCall, ReportQuery, SentTransaction, TxResponse},
    Error, Result,
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};

/// Default reporter account
pub const MOCK_REPORTER: &str = "0x7c0d52faab596c08f484e3478aebc6205f3f5d8c";

/// Arguments of one `check_period` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodCheck {
    /// Branch ID
    pub branch: String,
    /// Period length in blocks
    pub period_length: u64,
    /// Reporter account
    pub reporter: String,
}

/// Scriptable in-memory ledger
#[derive(Debug)]
pub struct MockLedger {
    reporter: String,
    latency: Duration,
    progress_bits: AtomicU64,
    tx_counter: AtomicU64,
    period: AtomicU64,
    redistribution_done: AtomicBool,
    check_period_error: Option<String>,
    dispatch_error: Option<String>,
    call_returns: Mutex<VecDeque<String>>,
    calls: Mutex<Vec<ContractCall>>,
    period_checks: Mutex<Vec<PeriodCheck>>,
    report_hashes: RwLock<HashMap<ReportQuery, String>>,
    encrypted_reports: RwLock<HashMap<ReportQuery, Vec<String>>>,
}

impl MockLedger {
    /// Ledger sitting at `progress` percent of the current period
    pub fn new(progress: f64) -> Self {
        Self {
            reporter: MOCK_REPORTER.to_string(),
            latency: Duration::ZERO,
            progress_bits: AtomicU64::new(progress.to_bits()),
            tx_counter: AtomicU64::new(0),
            period: AtomicU64::new(0),
            redistribution_done: AtomicBool::new(true),
            check_period_error: None,
            dispatch_error: None,
            call_returns: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            period_checks: Mutex::new(Vec::new()),
            report_hashes: RwLock::new(HashMap::new()),
            encrypted_reports: RwLock::new(HashMap::new()),
        }
    }

    /// Script the call returns of the next dispatches, in order
    pub fn with_call_returns<I, S>(mut self, returns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.call_returns
            .get_mut()
            .extend(returns.into_iter().map(Into::into));
        self
    }

    /// Sending account reported in responses
    pub fn with_reporter(mut self, reporter: &str) -> Self {
        self.reporter = reporter.to_string();
        self
    }

    /// Simulated network latency per dispatch
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Rep redistribution state
    pub fn with_redistribution_done(self, done: bool) -> Self {
        self.redistribution_done.store(done, Ordering::SeqCst);
        self
    }

    /// Make `check_period` fail with a transport error
    pub fn with_check_period_error(mut self, message: &str) -> Self {
        self.check_period_error = Some(message.to_string());
        self
    }

    /// Make every dispatch fail with a transport error
    pub fn with_dispatch_error(mut self, message: &str) -> Self {
        self.dispatch_error = Some(message.to_string());
        self
    }

    /// Store a report hash
    pub fn with_report_hash(mut self, query: ReportQuery, hash: &str) -> Self {
        self.report_hashes.get_mut().insert(query, hash.to_string());
        self
    }

    /// Store an encrypted report triple
    pub fn with_encrypted_report(mut self, query: ReportQuery, fields: Vec<String>) -> Self {
        self.encrypted_reports.get_mut().insert(query, fields);
        self
    }

    /// Reporter account
    pub fn reporter(&self) -> &str {
        &self.reporter
    }

    /// Move the ledger to `progress` percent of the period
    pub fn set_progress(&self, progress: f64) {
        self.progress_bits.store(progress.to_bits(), Ordering::SeqCst);
    }

    /// Set rep redistribution state
    pub fn set_redistribution_done(&self, done: bool) {
        self.redistribution_done.store(done, Ordering::SeqCst);
    }

    /// Calls dispatched so far
    pub async fn calls(&self) -> Vec<ContractCall> {
        self.calls.lock().await.clone()
    }

    /// Arguments of every `check_period` call, in order
    pub async fn period_checks(&self) -> Vec<PeriodCheck> {
        self.period_checks.lock().await.clone()
    }

    /// Number of `check_period` calls that succeeded
    pub fn periods_checked(&self) -> u64 {
        self.period.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransactionDispatcher for MockLedger {
    async fn transact(&self, call: &ContractCall, on_sent: OnSent<'_>) -> Result<TxResponse> {
        info!("Mock ledger: dispatching {}", call);

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        if let Some(message) = &self.dispatch_error {
            warn!("Mock ledger: simulated dispatch failure");
            return Err(Error::Transport(message.clone()));
        }

        self.calls.lock().await.push(call.clone());

        let nonce = self.tx_counter.fetch_add(1, Ordering::SeqCst) + 1;
        let hash = format!("0x{:064x}", nonce);
        on_sent(&SentTransaction { hash: hash.clone() });

        let call_return = self
            .call_returns
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| "1".to_string());

        Ok(TxResponse {
            hash,
            from: self.reporter.clone(),
            call_return,
        })
    }
}

impl PeriodOracle for MockLedger {
    fn current_period_progress(&self, _period_length: u64) -> f64 {
        f64::from_bits(self.progress_bits.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl PeriodChecker for MockLedger {
    async fn check_period(&self, branch: &str, period_length: u64, reporter: &str) -> Result<u64> {
        self.period_checks.lock().await.push(PeriodCheck {
            branch: branch.to_string(),
            period_length,
            reporter: reporter.to_string(),
        });

        if let Some(message) = &self.check_period_error {
            return Err(Error::Transport(message.clone()));
        }
        let period = self.period.fetch_add(1, Ordering::SeqCst) + 1;
        info!("Mock ledger: period checked for {} on {}", reporter, branch);
        Ok(period)
    }

    async fn rep_redistribution_done(&self, _branch: &str, _reporter: &str) -> Result<bool> {
        Ok(self.redistribution_done.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl ReportStore for MockLedger {
    async fn get_report_hash(&self, query: &ReportQuery) -> Result<String> {
        Ok(self
            .report_hashes
            .read()
            .await
            .get(query)
            .cloned()
            .unwrap_or_else(|| "0x0".to_string()))
    }

    async fn get_encrypted_report(&self, query: &ReportQuery) -> Result<Vec<String>> {
        Ok(self
            .encrypted_reports
            .read()
            .await
            .get(query)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_returns() {
        let ledger = MockLedger::new(10.0).with_call_returns(["0", "-2"]);
        let call = ContractCall::make_reports("submitReportHash", vec![]);

        let first = ledger.transact(&call, &|_| {}).await.unwrap();
        let second = ledger.transact(&call, &|_| {}).await.unwrap();
        let third = ledger.transact(&call, &|_| {}).await.unwrap();

        assert_eq!(first.call_return, "0");
        assert_eq!(second.call_return, "-2");
        assert_eq!(third.call_return, "1");
        assert_ne!(first.hash, second.hash);
        assert_eq!(ledger.calls().await.len(), 3);
    }

    #[tokio::test]
    async fn test_on_sent_sees_hash() {
        let ledger = MockLedger::new(10.0);
        let call = ContractCall::make_reports("submitReport", vec![]);
        let seen = std::sync::Mutex::new(None);

        let response = ledger
            .transact(&call, &|tx| *seen.lock().unwrap() = Some(tx.hash.clone()))
            .await
            .unwrap();

        assert_eq!(seen.lock().unwrap().as_deref(), Some(response.hash.as_str()));
    }

    #[test]
    fn test_progress() {
        let ledger = MockLedger::new(12.5);
        assert_eq!(ledger.current_period_progress(100), 12.5);
        ledger.set_progress(75.0);
        assert_eq!(ledger.current_period_progress(100), 75.0);
    }
}
