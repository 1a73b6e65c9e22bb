//! Storage commitment reconciliation.
//!
//! Every requested reference lands in exactly one of `successes` or
//! `failures`, in request order. Retrieve locations shared by all records the
//! lookup returned are hoisted to the result; otherwise each success carries
//! its own.

use std::collections::{BTreeSet, HashMap};

use pacs_core::{
    FailedInstance, FailureReason, InstanceOutcome, RetrieveLocations, StorageCommitmentRequest,
    StorageCommitmentResult, StoredInstanceRecord,
};
use pacs_storage::{InstanceLookup, LookupError};

/// Answers storage commitment requests from an instance catalog.
#[derive(Debug, Clone)]
pub struct Reconciler<L> {
    lookup: L,
}

impl<L: InstanceLookup> Reconciler<L> {
    pub fn new(lookup: L) -> Self {
        Reconciler { lookup }
    }

    pub fn lookup(&self) -> &L {
        &self.lookup
    }

    /// Look up every requested instance once and partition the request.
    ///
    /// Lookup failures propagate unchanged; there is no partial result.
    pub async fn reconcile(
        &self,
        request: &StorageCommitmentRequest,
    ) -> Result<StorageCommitmentResult, LookupError> {
        let uids: BTreeSet<String> = request
            .requested
            .iter()
            .map(|r| r.sop_instance_uid.clone())
            .collect();
        let records = self.lookup.find_by_sop_instance_uids(&uids).await?;
        let result = compute_result(request, &records);
        tracing::debug!(
            transaction_uid = %request.transaction_uid,
            successes = result.successes.len(),
            failures = result.failures.len(),
            "storage commitment reconciled"
        );
        Ok(result)
    }
}

/// Partition `request` against the records a lookup returned.
///
/// Superseded records are skipped even if the lookup returned them.
pub fn compute_result(
    request: &StorageCommitmentRequest,
    records: &[StoredInstanceRecord],
) -> StorageCommitmentResult {
    let current: Vec<&StoredInstanceRecord> =
        records.iter().filter(|r| !r.superseded).collect();
    let index: HashMap<&str, &StoredInstanceRecord> = current
        .iter()
        .map(|r| (r.sop_instance_uid.as_str(), *r))
        .collect();
    let common = common_locations(&current);

    let mut successes = Vec::new();
    let mut failures = Vec::new();
    for sop in &request.requested {
        match index.get(sop.sop_instance_uid.as_str()) {
            None => failures.push(FailedInstance {
                sop_class_uid: sop.sop_class_uid.clone(),
                sop_instance_uid: sop.sop_instance_uid.clone(),
                reason: FailureReason::NoSuchObjectInstance,
            }),
            Some(record) if record.sop_class_uid != sop.sop_class_uid => {
                failures.push(FailedInstance {
                    sop_class_uid: sop.sop_class_uid.clone(),
                    sop_instance_uid: sop.sop_instance_uid.clone(),
                    reason: FailureReason::ClassInstanceConflict,
                })
            }
            Some(record) => successes.push(InstanceOutcome {
                sop_class_uid: sop.sop_class_uid.clone(),
                sop_instance_uid: sop.sop_instance_uid.clone(),
                retrieve_locations: match common {
                    Some(_) => None,
                    None => Some(record.retrieve_locations.clone()),
                },
            }),
        }
    }

    StorageCommitmentResult {
        transaction_uid: request.transaction_uid.clone(),
        common_retrieve_locations: common,
        successes,
        failures,
    }
}

/// The location pair shared by every record, or `None` when records differ
/// or there are none.
fn common_locations(records: &[&StoredInstanceRecord]) -> Option<RetrieveLocations> {
    let (first, rest) = records.split_first()?;
    rest.iter()
        .all(|r| r.retrieve_locations == first.retrieve_locations)
        .then(|| first.retrieve_locations.clone())
}
