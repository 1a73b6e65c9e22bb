//! Reconciler against lookup backends.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use pacs_core::{
    FailureReason, RetrieveLocations, SopRef, StorageCommitmentRequest, StoredInstanceRecord,
};
use pacs_stgcmt::Reconciler;
use pacs_storage::{InMemoryCatalog, InstanceLookup, LookupError};

const CT: &str = "1.2.840.10008.5.1.4.1.1.2";
const MR: &str = "1.2.840.10008.5.1.4.1.1.4";

fn stored(class: &str, uid: &str, primary: &str) -> StoredInstanceRecord {
    StoredInstanceRecord {
        sop_class_uid: class.to_string(),
        sop_instance_uid: uid.to_string(),
        retrieve_locations: RetrieveLocations::new(Some(primary), None),
        superseded: false,
    }
}

fn request(refs: &[(&str, &str)]) -> StorageCommitmentRequest {
    StorageCommitmentRequest {
        transaction_uid: "2.25.42".to_string(),
        requested: refs.iter().map(|(c, u)| SopRef::new(*c, *u)).collect(),
    }
}

/// Records every UID set it is asked for.
struct RecordingLookup {
    inner: InMemoryCatalog,
    calls: AtomicUsize,
    last: std::sync::Mutex<BTreeSet<String>>,
}

#[async_trait]
impl InstanceLookup for RecordingLookup {
    async fn find_by_sop_instance_uids(
        &self,
        uids: &BTreeSet<String>,
    ) -> Result<Vec<StoredInstanceRecord>, LookupError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = uids.clone();
        self.inner.find_by_sop_instance_uids(uids).await
    }
}

struct DownLookup;

#[async_trait]
impl InstanceLookup for DownLookup {
    async fn find_by_sop_instance_uids(
        &self,
        _uids: &BTreeSet<String>,
    ) -> Result<Vec<StoredInstanceRecord>, LookupError> {
        Err(LookupError::Unavailable("connection reset".to_string()))
    }
}

#[tokio::test]
async fn one_found_one_missing() {
    let reconciler = Reconciler::new(InMemoryCatalog::new(vec![stored(CT, "1.1", "A")]));
    let result = reconciler
        .reconcile(&request(&[(CT, "1.1"), (CT, "1.2")]))
        .await
        .unwrap();

    assert_eq!(result.transaction_uid, "2.25.42");
    assert_eq!(result.successes.len(), 1);
    assert_eq!(result.successes[0].sop_instance_uid, "1.1");
    // a single record's locations count as common
    assert_eq!(
        result.common_retrieve_locations,
        Some(RetrieveLocations::new(Some("A"), None))
    );
    assert_eq!(result.successes[0].retrieve_locations, None);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].sop_instance_uid, "1.2");
    assert_eq!(result.failures[0].reason, FailureReason::NoSuchObjectInstance);
    assert_eq!(result.event_type_id(), 2);
}

#[tokio::test]
async fn lookup_queried_once_with_distinct_uids() {
    let lookup = RecordingLookup {
        inner: InMemoryCatalog::new(vec![stored(CT, "1.1", "A"), stored(MR, "1.2", "A")]),
        calls: AtomicUsize::new(0),
        last: Default::default(),
    };
    let reconciler = Reconciler::new(lookup);
    let result = reconciler
        .reconcile(&request(&[(CT, "1.1"), (CT, "1.2"), (CT, "1.1")]))
        .await
        .unwrap();

    assert_eq!(reconciler.lookup().calls.load(Ordering::SeqCst), 1);
    let asked: Vec<String> = reconciler.lookup().last.lock().unwrap().iter().cloned().collect();
    assert_eq!(asked, vec!["1.1".to_string(), "1.2".to_string()]);
    assert_eq!(result.successes.len(), 2);
    assert_eq!(result.failures[0].reason, FailureReason::ClassInstanceConflict);
}

#[tokio::test]
async fn results_follow_request_order() {
    let reconciler = Reconciler::new(InMemoryCatalog::new(vec![
        stored(CT, "3", "A"),
        stored(CT, "1", "B"),
        stored(CT, "2", "A"),
    ]));
    let result = reconciler
        .reconcile(&request(&[(CT, "2"), (CT, "9"), (CT, "1"), (CT, "3")]))
        .await
        .unwrap();
    let order: Vec<&str> = result
        .successes
        .iter()
        .map(|s| s.sop_instance_uid.as_str())
        .collect();
    assert_eq!(order, vec!["2", "1", "3"]);
    assert_eq!(result.common_retrieve_locations, None);
    assert_eq!(
        result.successes[1].retrieve_locations,
        Some(RetrieveLocations::new(Some("B"), None))
    );
}

#[tokio::test]
async fn unavailable_lookup_propagates() {
    let reconciler = Reconciler::new(DownLookup);
    let err = reconciler
        .reconcile(&request(&[(CT, "1.1")]))
        .await
        .unwrap_err();
    assert!(matches!(err, LookupError::Unavailable(_)));
}
