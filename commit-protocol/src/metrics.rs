//! Metrics collection for observability
//!
//! # Metrics
//!
//! - `commit_submissions_total{outcome}` - Finished submissions by outcome
//! - `commit_dispatches_total` - Transactions handed to the dispatcher
//! - `commit_attempts` - Histogram of dispatches per finished submission

use prometheus::{Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
#[derive(Clone, Debug)]
pub struct CommitMetrics {
    /// Finished submissions by outcome
    pub submissions_total: IntCounterVec,

    /// Dispatched transactions
    pub dispatches_total: IntCounter,

    /// Dispatches per submission
    pub attempts: Histogram,

    /// Prometheus registry
    pub registry: Arc<Registry>,
}

impl CommitMetrics {
    /// Create new metrics collector with its own registry
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let submissions_total = IntCounterVec::new(
            Opts::new("commit_submissions_total", "Finished submissions by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(submissions_total.clone()))?;

        let dispatches_total = IntCounter::new(
            "commit_dispatches_total",
            "Transactions handed to the dispatcher",
        )?;
        registry.register(Box::new(dispatches_total.clone()))?;

        let attempts = Histogram::with_opts(
            HistogramOpts::new("commit_attempts", "Dispatches per finished submission")
                .buckets(vec![1.0, 2.0, 3.0, 5.0, 8.0, 13.0]),
        )?;
        registry.register(Box::new(attempts.clone()))?;

        Ok(Self {
            submissions_total,
            dispatches_total,
            attempts,
            registry,
        })
    }

    /// Record a dispatch
    pub fn record_dispatch(&self) {
        self.dispatches_total.inc();
    }

    /// Record a finished submission
    pub fn record_outcome(&self, outcome: &str, attempts: u32) {
        self.submissions_total.with_label_values(&[outcome]).inc();
        if attempts > 0 {
            self.attempts.observe(attempts as f64);
        }
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}
