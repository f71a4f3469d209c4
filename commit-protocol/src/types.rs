//! Types for commit submissions

use chrono::{DateTime, Utc};
use report_core::ReportInput;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Contract holding the report submission methods
pub const MAKE_REPORTS_CONTRACT: &str = "MakeReports";

/// Prepared contract call handed to the dispatcher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    /// Contract name
    pub contract: String,

    /// Method name
    pub method: String,

    /// ABI parameters in order
    pub params: Vec<String>,

    /// State-changing transaction (as opposed to a read-only call)
    pub send: bool,
}

impl ContractCall {
    /// State-changing call on `MakeReports`
    pub fn make_reports(method: &str, params: Vec<String>) -> Self {
        Self {
            contract: MAKE_REPORTS_CONTRACT.to_string(),
            method: method.to_string(),
            params,
            send: true,
        }
    }
}

impl fmt::Display for ContractCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.contract, self.method, self.params.join(", "))
    }
}

/// Broadcast notification, emitted once the transaction reaches the pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentTransaction {
    /// Transaction hash
    pub hash: String,
}

/// Confirmed transaction result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxResponse {
    /// Transaction hash
    pub hash: String,

    /// Sending account
    pub from: String,

    /// Contract return value, as a signed decimal string once normalized
    pub call_return: String,
}

/// Parameters of one report-hash submission.
///
/// Resubmissions reuse these verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSubmission {
    /// Event ID
    pub event: String,

    /// Commit hash from [`report_core::crypto::make_hash`]
    pub report_hash: String,

    /// Encrypted report, if the reporter stores it on-chain
    pub encrypted_report: Option<String>,

    /// Encrypted salt, if the reporter stores it on-chain
    pub encrypted_salt: Option<String>,

    /// Ethics flag
    pub ethics: bool,

    /// Branch ID
    pub branch: String,

    /// Reporting period (expiration date index)
    pub period: u64,

    /// Period length in blocks
    pub period_length: u64,
}

/// Parameters of a plaintext report submission
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSubmission {
    /// Event ID
    pub event: String,

    /// Salt used in the commit hash
    pub salt: String,

    /// Report value and market bounds
    pub report: ReportInput,

    /// Ethics flag
    pub ethics: bool,
}

/// Lookup key for a stored report
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportQuery {
    /// Branch ID
    pub branch: String,

    /// Reporting period
    pub exp_date_index: u64,

    /// Reporter account
    pub reporter: String,

    /// Event ID
    pub event: String,
}

/// Successful commit
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitReceipt {
    /// Local ID used in logs
    pub submission_id: Uuid,

    /// Final transaction result
    pub response: TxResponse,

    /// Dispatches made
    pub attempts: u32,

    /// A matching hash was already stored (contract returned `-2`)
    pub already_committed: bool,

    /// Completion time
    pub completed_at: DateTime<Utc>,
}

/// Commitment material for one report, ready to submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCommit {
    /// Fixed-point report
    pub fixed_report: String,

    /// Commit hash
    pub report_hash: String,

    /// Report encrypted under the reporter's key and the salt
    pub encrypted_report: String,

    /// Salt encrypted under the reporter's key and secret salt
    pub encrypted_salt: String,
}

/// Submission state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommitState {
    /// Building the call
    Preparing,
    /// Checking period progress against the commit window
    CommitWindowCheck,
    /// Dispatch in flight
    Submitting,
    /// Contract reported a period rollover
    AwaitingPeriodTransition,
    /// Waiting on the branch's rep redistribution
    AwaitingRepRedistribution,
    /// Dispatching the identical call again
    Resubmitting,
    /// Terminal success
    Succeeded,
    /// Terminal failure
    Failed,
}

impl CommitState {
    /// Whether the state is terminal
    pub fn is_terminal(&self) -> bool {
        matches!(self, CommitState::Succeeded | CommitState::Failed)
    }
}

impl fmt::Display for CommitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitState::Preparing => "PREPARING",
            CommitState::CommitWindowCheck => "COMMIT_WINDOW_CHECK",
            CommitState::Submitting => "SUBMITTING",
            CommitState::AwaitingPeriodTransition => "AWAITING_PERIOD_TRANSITION",
            CommitState::AwaitingRepRedistribution => "AWAITING_REP_REDISTRIBUTION",
            CommitState::Resubmitting => "RESUBMITTING",
            CommitState::Succeeded => "SUCCEEDED",
            CommitState::Failed => "FAILED",
        };
        write!(f, "{}", name)
    }
}
