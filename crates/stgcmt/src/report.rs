//! N-EVENT-REPORT scheduling and delivery.
//!
//! Results are queued with a delay, then handed to a [`ReportSender`] by the
//! [`ReportDispatcher`]. A failed delivery is queued again after the retry
//! interval until the retry budget is spent.

use std::time::Duration;

use async_trait::async_trait;
use pacs_core::StorageCommitmentResult;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::config::StgCmtConfig;
use crate::error::ReportError;

/// A storage commitment result waiting to be reported to the requester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledReport {
    pub local_aet: String,
    pub remote_aet: String,
    pub result: StorageCommitmentResult,
    /// Failed deliveries so far.
    pub retries: u32,
}

impl ScheduledReport {
    pub fn new(local_aet: &str, remote_aet: &str, result: StorageCommitmentResult) -> Self {
        ScheduledReport {
            local_aet: local_aet.to_string(),
            remote_aet: remote_aet.to_string(),
            result,
            retries: 0,
        }
    }

    pub fn event_type_id(&self) -> u16 {
        self.result.event_type_id()
    }
}

/// Delivers one N-EVENT-REPORT to the remote application entity.
///
/// Implementations open an association from `local_aet` to `remote_aet`,
/// send the report and release the association.
#[async_trait]
pub trait ReportSender: Send + Sync {
    async fn send_report(&self, report: &ScheduledReport) -> Result<(), ReportError>;
}

// ──────────────────────────────────────────────
// ReportQueue
// ──────────────────────────────────────────────

/// Handle for scheduling reports. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReportQueue {
    tx: mpsc::UnboundedSender<ScheduledReport>,
}

impl ReportQueue {
    /// A queue and the receiving end its dispatcher reads from.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<ScheduledReport>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ReportQueue { tx }, rx)
    }

    /// Enqueue `report` once `delay` has elapsed.
    ///
    /// Must be called from within a tokio runtime. Returns `false` when the
    /// receiving end is already gone.
    pub fn schedule(&self, report: ScheduledReport, delay: Duration) -> bool {
        if self.tx.is_closed() {
            return false;
        }
        if delay.is_zero() {
            return self.tx.send(report).is_ok();
        }
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if tx.send(report).is_err() {
                tracing::debug!("report queue closed before delivery");
            }
        });
        true
    }
}

// ──────────────────────────────────────────────
// ReportDispatcher
// ──────────────────────────────────────────────

/// What happened to one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    Delivered,
    /// Failed, queued again after the retry interval.
    Rescheduled,
    /// Failed permanently, not retried.
    Dropped,
    /// Failed with no retries left.
    GaveUp,
}

pub struct ReportDispatcher<S> {
    sender: S,
    queue: ReportQueue,
    config: StgCmtConfig,
}

impl<S: ReportSender> ReportDispatcher<S> {
    pub fn new(sender: S, queue: ReportQueue, config: StgCmtConfig) -> Self {
        ReportDispatcher {
            sender,
            queue,
            config,
        }
    }

    pub fn sender(&self) -> &S {
        &self.sender
    }

    /// Attempt delivery of one report.
    pub async fn process(&self, report: ScheduledReport) -> DispatchOutcome {
        let err = match self.sender.send_report(&report).await {
            Ok(()) => {
                tracing::debug!(
                    remote_aet = %report.remote_aet,
                    transaction_uid = %report.result.transaction_uid,
                    event_type_id = report.event_type_id(),
                    "storage commitment result returned"
                );
                return DispatchOutcome::Delivered;
            }
            Err(e) => e,
        };

        if err.is_permanent() {
            tracing::warn!(
                remote_aet = %report.remote_aet,
                error = %err,
                "failed to return storage commitment result"
            );
            return DispatchOutcome::Dropped;
        }
        if !self.config.may_retry(report.retries) {
            tracing::warn!(
                remote_aet = %report.remote_aet,
                retries = report.retries,
                error = %err,
                "failed to return storage commitment result, giving up"
            );
            return DispatchOutcome::GaveUp;
        }

        let delay = self.config.retry_interval();
        tracing::info!(
            remote_aet = %report.remote_aet,
            retry_in_secs = delay.as_secs(),
            error = %err,
            "failed to return storage commitment result, will retry"
        );
        let retry = ScheduledReport {
            retries: report.retries + 1,
            ..report
        };
        if self.queue.schedule(retry, delay) {
            DispatchOutcome::Rescheduled
        } else {
            tracing::warn!("report queue closed, dropping retry");
            DispatchOutcome::GaveUp
        }
    }

    /// Process reports until every [`ReportQueue`] handle is dropped.
    ///
    /// The dispatcher holds a handle of its own for retries, so this only
    /// returns once the dispatcher's queue is gone too; spawn it and abort
    /// the task on shutdown.
    pub async fn run(&self, mut rx: mpsc::UnboundedReceiver<ScheduledReport>) {
        while let Some(report) = rx.recv().await {
            self.process(report).await;
        }
    }
}
