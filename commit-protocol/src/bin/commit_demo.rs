//! Commit a report against the in-memory ledger and read it back

use anyhow::Context;
use commit_protocol::{
    mock::MockLedger, CommitProtocol, CommitSubmission, Config, ReportQuery, ReportSubmission,
};
use report_core::{DerivedSecret, MarketType, ReportInput};
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const BRANCH: &str = "0xf69b5";
const EVENT: &str = "0x2d3a4b5c";
const PERIOD_LENGTH: u64 = 172_800;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting commit demo");

    let config = Config::from_env().context("loading configuration")?;

    // Period rolls over on the first dispatch
    let ledger = Arc::new(MockLedger::new(20.0).with_call_returns(["0"]));
    let protocol = CommitProtocol::with_ledger(config, ledger.clone())?;

    let secret = DerivedSecret::new([0x42u8; 32], [0x07u8; 16]);
    let request = ReportSubmission {
        event: EVENT.to_string(),
        salt: "0x5c0ffee5".to_string(),
        report: ReportInput::new(
            Decimal::new(725, 1),
            Decimal::new(-100, 0),
            Decimal::new(200, 0),
            MarketType::Scalar,
        ),
        ethics: true,
    };

    let prepared = protocol.make_commit(&request, ledger.reporter(), &secret)?;
    tracing::info!(report = %prepared.fixed_report, hash = %prepared.report_hash, "Commit prepared");

    let period = 397;
    let submission = CommitSubmission {
        event: request.event.clone(),
        report_hash: prepared.report_hash.clone(),
        encrypted_report: Some(prepared.encrypted_report.clone()),
        encrypted_salt: Some(prepared.encrypted_salt.clone()),
        ethics: request.ethics,
        branch: BRANCH.to_string(),
        period,
        period_length: PERIOD_LENGTH,
    };

    let cancel = CancellationToken::new();
    let receipt = protocol
        .submit_report_hash(
            &submission,
            &|tx| tracing::info!(hash = %tx.hash, "Transaction sent"),
            &cancel,
        )
        .await?;
    tracing::info!(
        attempts = receipt.attempts,
        call_return = %receipt.response.call_return,
        "Commit confirmed"
    );

    // Read the commitment back as the reveal phase would
    let query = ReportQuery {
        branch: BRANCH.to_string(),
        exp_date_index: period,
        reporter: ledger.reporter().to_string(),
        event: EVENT.to_string(),
    };
    let stored = Arc::new(MockLedger::new(60.0).with_encrypted_report(
        query.clone(),
        vec![prepared.encrypted_report, prepared.encrypted_salt, "0x1".to_string()],
    ));
    let reveal = CommitProtocol::with_ledger(protocol.config().clone(), stored)?;
    let decrypted = reveal.get_and_decrypt_report(&query, &secret).await?;

    let decoded = reveal.codec().unfix_raw_report(
        &decrypted.report,
        request.report.min_value,
        request.report.max_value,
        MarketType::Scalar,
    )?;
    tracing::info!(report = %decoded.report, ethics = decrypted.ethics, "Report recovered");

    tracing::info!("Commit demo finished");
    Ok(())
}
