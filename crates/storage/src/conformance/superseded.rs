use std::future::Future;

use super::{found_uids, make_record, uid_set, TestResult, CT_IMAGE_STORAGE};
use crate::InstanceLookup;
use pacs_core::{RetrieveLocations, StoredInstanceRecord};

pub(super) async fn run_superseded_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "superseded",
        "superseded_record_not_returned",
        superseded_record_not_returned(factory).await,
    ));
    results.push(TestResult::from_result(
        "superseded",
        "current_version_returned_alone",
        current_version_returned_alone(factory).await,
    ));
    results.push(TestResult::from_result(
        "superseded",
        "no_returned_record_is_superseded",
        no_returned_record_is_superseded(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

async fn superseded_record_not_returned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![make_record("1.1", CT_IMAGE_STORAGE, true)]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1"]))
        .await
        .map_err(|e| e.to_string())?;
    if !found.is_empty() {
        return Err(format!(
            "superseded record returned: {:?}",
            found_uids(&found)
        ));
    }
    Ok(())
}

/// When an instance was replaced, only the current version may be returned.
async fn current_version_returned_alone<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let old = make_record("1.1", CT_IMAGE_STORAGE, true);
    let mut current = make_record("1.1", CT_IMAGE_STORAGE, false);
    current.retrieve_locations = RetrieveLocations::new(Some("CURRENT"), None);
    let s = factory(vec![old, current]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1"]))
        .await
        .map_err(|e| e.to_string())?;
    if found.len() != 1 {
        return Err(format!("expected exactly 1 record, got {}", found.len()));
    }
    if found[0].retrieve_locations.primary.as_deref() != Some("CURRENT") {
        return Err(format!(
            "expected the current version, got {:?}",
            found[0].retrieve_locations
        ));
    }
    Ok(())
}

async fn no_returned_record_is_superseded<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![
        make_record("1.1", CT_IMAGE_STORAGE, false),
        make_record("1.2", CT_IMAGE_STORAGE, true),
        make_record("1.3", CT_IMAGE_STORAGE, false),
        make_record("1.4", CT_IMAGE_STORAGE, true),
    ])
    .await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1", "1.2", "1.3", "1.4"]))
        .await
        .map_err(|e| e.to_string())?;
    if found.iter().any(|r| r.superseded) {
        return Err("a superseded record was returned".to_string());
    }
    if found_uids(&found) != uid_set(&["1.1", "1.3"]) {
        return Err(format!("expected [1.1, 1.3], got {:?}", found_uids(&found)));
    }
    Ok(())
}
