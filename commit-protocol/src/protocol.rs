//! Commit-phase submission state machine
//!
//! `submit_report_hash` runs one bounded loop per submission:
//!
//! 1. Guard: period progress must be inside the commit window
//! 2. Dispatch `MakeReports.submitReportHash`
//! 3. Interpret the call return:
//!    - `"0"`: period rolled over. Re-check the period and rep
//!      redistribution, then resubmit the identical call
//!    - `"-2"`: not commit phase, or already submitted. A stored non-zero
//!      hash makes it a success
//!    - anything else: success
//!
//! The loop stops at `retry.max_attempts` dispatches, and checks the
//! cancellation token before each one. A rollover on the last allowed
//! dispatch fails without re-checking the period.

use crate::{
    collaborators::{OnSent, PeriodChecker, PeriodOracle, ReportStore, TransactionDispatcher},
    config::Config,
    error::{PhaseViolation, CODE_NOT_COMMIT_PHASE, CODE_PERIOD_ROLLED_OVER},
    metrics::CommitMetrics,
    types::*,
    window::CommitWindow,
    Error, Result,
};
use chrono::Utc;
use report_core::{
    crypto::make_hash, word, CryptoInput, DecryptedReport, DerivedSecret, FixedPointParams,
    ReportCodec, ReportCrypto,
};
use rust_decimal::Decimal;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Commit protocol driver
pub struct CommitProtocol {
    config: Config,
    codec: ReportCodec,
    crypto: ReportCrypto,
    window: CommitWindow,
    dispatcher: Arc<dyn TransactionDispatcher>,
    oracle: Arc<dyn PeriodOracle>,
    periods: Arc<dyn PeriodChecker>,
    reports: Arc<dyn ReportStore>,
    metrics: CommitMetrics,
}

impl CommitProtocol {
    /// Create a driver over separate collaborators
    pub fn new(
        config: Config,
        dispatcher: Arc<dyn TransactionDispatcher>,
        oracle: Arc<dyn PeriodOracle>,
        periods: Arc<dyn PeriodChecker>,
        reports: Arc<dyn ReportStore>,
    ) -> Result<Self> {
        config.validate()?;

        let params: FixedPointParams = config.codec.fixed_point;
        let crypto = ReportCrypto::new(&config.codec.crypto)?;
        let window = CommitWindow::new(config.window.commit_phase_end_percent);

        Ok(Self {
            codec: ReportCodec::new(params),
            crypto,
            window,
            dispatcher,
            oracle,
            periods,
            reports,
            metrics: CommitMetrics::new()?,
            config,
        })
    }

    /// Create a driver over one object implementing every collaborator
    pub fn with_ledger<L>(config: Config, ledger: Arc<L>) -> Result<Self>
    where
        L: TransactionDispatcher + PeriodOracle + PeriodChecker + ReportStore + 'static,
    {
        Self::new(
            config,
            ledger.clone(),
            ledger.clone(),
            ledger.clone(),
            ledger,
        )
    }

    /// Report codec in use
    pub fn codec(&self) -> &ReportCodec {
        &self.codec
    }

    /// Report cipher in use
    pub fn crypto(&self) -> &ReportCrypto {
        &self.crypto
    }

    /// Metrics
    pub fn metrics(&self) -> &CommitMetrics {
        &self.metrics
    }

    /// Configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build the `submitReportHash` call for a submission
    pub fn report_hash_call(&self, submission: &CommitSubmission) -> Result<ContractCall> {
        Ok(ContractCall::make_reports(
            "submitReportHash",
            vec![
                submission.event.clone(),
                submission.report_hash.clone(),
                submission.encrypted_report.clone().unwrap_or_else(|| "0".to_string()),
                submission.encrypted_salt.clone().unwrap_or_else(|| "0".to_string()),
                self.fix_flag(submission.ethics)?,
            ],
        ))
    }

    /// Commit a report hash during the commit phase
    pub async fn submit_report_hash(
        &self,
        submission: &CommitSubmission,
        on_sent: OnSent<'_>,
        cancel: &CancellationToken,
    ) -> Result<CommitReceipt> {
        let submission_id = Uuid::new_v4();
        info!(
            %submission_id,
            event = %submission.event,
            period = submission.period,
            "Submitting report hash"
        );

        let mut state = CommitState::Preparing;
        let mut attempts = 0u32;

        let outcome = match self.report_hash_call(submission) {
            Ok(call) => {
                self.run_commit(submission, &call, on_sent, cancel, &mut state, &mut attempts)
                    .await
            }
            Err(e) => Err(e),
        };

        match outcome {
            Ok((response, already_committed)) => {
                transition(&mut state, CommitState::Succeeded);
                self.metrics.record_outcome("succeeded", attempts);
                info!(
                    %submission_id,
                    attempts,
                    already_committed,
                    call_return = %response.call_return,
                    "Report hash committed"
                );
                Ok(CommitReceipt {
                    submission_id,
                    response,
                    attempts,
                    already_committed,
                    completed_at: Utc::now(),
                })
            }
            Err(e) => {
                transition(&mut state, CommitState::Failed);
                self.metrics.record_outcome(outcome_label(&e), attempts);
                error!(%submission_id, attempts, error = %e, "Report hash submission failed");
                Err(e)
            }
        }
    }

    async fn run_commit(
        &self,
        submission: &CommitSubmission,
        call: &ContractCall,
        on_sent: OnSent<'_>,
        cancel: &CancellationToken,
        state: &mut CommitState,
        attempts: &mut u32,
    ) -> Result<(TxResponse, bool)> {
        if self.config.debug_reporting {
            debug!(tx = %to_json(call), "submitReportHash tx");
        }

        let mut delay = self.config.retry.initial_delay();

        loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }

            transition(state, CommitState::CommitWindowCheck);
            self.window
                .check(self.oracle.as_ref(), submission.period_length)?;

            transition(
                state,
                if *attempts == 0 {
                    CommitState::Submitting
                } else {
                    CommitState::Resubmitting
                },
            );
            *attempts += 1;
            self.metrics.record_dispatch();

            let mut response = self.dispatcher.transact(call, on_sent).await?;
            response.call_return = word::normalize_call_return(&response.call_return);
            if self.config.debug_reporting {
                debug!(call_return = %response.call_return, "submitReportHash response");
            }

            match response.call_return.as_str() {
                CODE_PERIOD_ROLLED_OVER => {
                    if *attempts >= self.config.retry.max_attempts {
                        return Err(Error::TransientRejection {
                            attempts: *attempts,
                        });
                    }

                    transition(state, CommitState::AwaitingPeriodTransition);
                    let new_period = self
                        .periods
                        .check_period(&submission.branch, submission.period_length, &response.from)
                        .await?;
                    debug!(new_period, "Period checked");

                    transition(state, CommitState::AwaitingRepRedistribution);
                    let done = self
                        .periods
                        .rep_redistribution_done(&submission.branch, &response.from)
                        .await?;
                    if self.config.debug_reporting {
                        debug!(done, "rep redistribution done");
                    }
                    if !done {
                        return Err(Error::RedistributionPending);
                    }

                    warn!(attempt = *attempts, ?delay, "Period rolled over, resubmitting");
                    if !delay.is_zero() {
                        tokio::select! {
                            _ = cancel.cancelled() => return Err(Error::Cancelled),
                            _ = tokio::time::sleep(delay) => {}
                        }
                        delay = next_delay(delay, self.config.retry.max_delay());
                    }
                }
                CODE_NOT_COMMIT_PHASE => {
                    let query = ReportQuery {
                        branch: submission.branch.clone(),
                        exp_date_index: submission.period,
                        reporter: response.from.clone(),
                        event: submission.event.clone(),
                    };
                    let stored = self.reports.get_report_hash(&query).await?;

                    if word::is_nonzero_hex(&stored) {
                        info!(stored_hash = %stored, "Report hash already stored");
                        response.call_return = "1".to_string();
                        return Ok((response, true));
                    }
                    return Err(Error::PhaseViolation(PhaseViolation::NotCommitPhase));
                }
                _ => return Ok((response, false)),
            }
        }
    }

    /// Submit a plaintext report, fixing it first
    pub async fn submit_report(
        &self,
        request: &ReportSubmission,
        on_sent: OnSent<'_>,
    ) -> Result<TxResponse> {
        let fixed = self.codec.fix_report(&request.report)?;
        let call = ContractCall::make_reports(
            "submitReport",
            vec![
                request.event.clone(),
                word::to_hex(word::parse_word(&request.salt)?),
                fixed.to_hex(),
                self.fix_flag(request.ethics)?,
            ],
        );

        if self.config.debug_reporting {
            debug!(tx = %to_json(&call), "MakeReports.submitReport params");
        }

        let mut response = self.dispatcher.transact(&call, on_sent).await?;
        response.call_return = word::normalize_call_return(&response.call_return);
        Ok(response)
    }

    /// Fetch and decrypt a stored report
    pub async fn get_and_decrypt_report(
        &self,
        query: &ReportQuery,
        secret: &DerivedSecret,
    ) -> Result<DecryptedReport> {
        let fields = self.reports.get_encrypted_report(query).await?;
        Ok(self.crypto.parse_and_decrypt_report(&fields, secret)?)
    }

    /// Fix, hash and encrypt a report for commitment by `reporter`
    pub fn make_commit(
        &self,
        request: &ReportSubmission,
        reporter: &str,
        secret: &DerivedSecret,
    ) -> Result<PreparedCommit> {
        let fixed = self.codec.fix_report(&request.report)?;
        let fixed_hex = fixed.to_hex();
        let key = CryptoInput::Bytes(&secret.derived_key);

        let report_hash = make_hash(CryptoInput::Hex(&request.salt), &fixed, &request.event, reporter)?;
        let encrypted_report = self.crypto.encrypt_report(
            CryptoInput::Hex(&fixed_hex),
            key,
            Some(CryptoInput::Hex(&request.salt)),
        )?;
        let encrypted_salt = self.crypto.encrypt_report(
            CryptoInput::Hex(&request.salt),
            key,
            Some(CryptoInput::Bytes(&secret.salt)),
        )?;

        Ok(PreparedCommit {
            fixed_report: fixed_hex,
            report_hash,
            encrypted_report,
            encrypted_salt,
        })
    }

    fn fix_flag(&self, flag: bool) -> Result<String> {
        let value = if flag { Decimal::ONE } else { Decimal::ZERO };
        Ok(self.codec.fix(value)?.to_hex())
    }
}

impl fmt::Debug for CommitProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommitProtocol")
            .field("config", &self.config)
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

fn transition(state: &mut CommitState, next: CommitState) {
    info!(from = %state, to = %next, "Commit state transition");
    *state = next;
}

fn next_delay(delay: Duration, max: Duration) -> Duration {
    (delay * 2).min(max)
}

fn outcome_label(error: &Error) -> &'static str {
    match error {
        Error::PhaseViolation(_) => "phase_violation",
        Error::RedistributionPending => "redistribution_pending",
        Error::TransientRejection { .. } => "transient_rejection",
        Error::Cancelled => "cancelled",
        _ => "error",
    }
}

fn to_json(call: &ContractCall) -> String {
    serde_json::to_string_pretty(call).unwrap_or_else(|_| call.to_string())
}
