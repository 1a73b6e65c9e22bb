//! Storage Commitment Push Model SCP.
//!
//! Handles the N-ACTION request: validates the action type, reconciles the
//! referenced instances and schedules the N-EVENT-REPORT carrying the result.

use std::collections::BTreeSet;

use pacs_core::{StorageCommitmentRequest, StorageCommitmentResult};
use pacs_storage::InstanceLookup;

use crate::config::StgCmtConfig;
use crate::error::ScpError;
use crate::reconciler::Reconciler;
use crate::report::{ReportQueue, ScheduledReport};

/// Action Type ID of "Request Storage Commitment".
pub const REQUEST_STORAGE_COMMITMENT: u16 = 1;

pub struct StgCmtScp<L> {
    reconciler: Reconciler<L>,
    queue: ReportQueue,
    config: StgCmtConfig,
    known_remote_aets: BTreeSet<String>,
}

impl<L: InstanceLookup> StgCmtScp<L> {
    pub fn new(lookup: L, queue: ReportQueue, config: StgCmtConfig) -> Self {
        StgCmtScp {
            reconciler: Reconciler::new(lookup),
            queue,
            config,
            known_remote_aets: BTreeSet::new(),
        }
    }

    /// Only accept requests from these calling AE titles. An empty set
    /// accepts any caller.
    pub fn with_known_remote_aets<I, T>(mut self, aets: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.known_remote_aets = aets.into_iter().map(Into::into).collect();
        self
    }

    /// Answer one N-ACTION request.
    ///
    /// On success the N-ACTION response status is Success and the returned
    /// result has been scheduled for reporting after the configured delay.
    pub async fn on_action(
        &self,
        local_aet: &str,
        remote_aet: &str,
        action_type_id: u16,
        request: &StorageCommitmentRequest,
    ) -> Result<StorageCommitmentResult, ScpError> {
        if action_type_id != REQUEST_STORAGE_COMMITMENT {
            return Err(ScpError::NoSuchActionType { action_type_id });
        }
        if !self.known_remote_aets.is_empty() && !self.known_remote_aets.contains(remote_aet) {
            return Err(ScpError::ProcessingFailure(format!(
                "Unknown Calling AET: {}",
                remote_aet
            )));
        }

        let result = self.reconciler.reconcile(request).await?;
        let report = ScheduledReport::new(local_aet, remote_aet, result.clone());
        if !self.queue.schedule(report, self.config.delay()) {
            return Err(ScpError::ProcessingFailure(
                "storage commitment report queue is closed".to_string(),
            ));
        }
        tracing::info!(
            %local_aet,
            %remote_aet,
            transaction_uid = %request.transaction_uid,
            failures = result.failures.len(),
            "storage commitment request accepted"
        );
        Ok(result)
    }
}
