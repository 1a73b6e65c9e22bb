use std::future::Future;

use super::{found_uids, make_record, uid_set, TestResult, CT_IMAGE_STORAGE, MR_IMAGE_STORAGE};
use crate::InstanceLookup;
use pacs_core::{RetrieveLocations, StoredInstanceRecord};

pub(super) async fn run_membership_tests<S, F, Fut>(factory: &F) -> Vec<TestResult>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.push(TestResult::from_result(
        "membership",
        "empty_request_returns_nothing",
        empty_request_returns_nothing(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "empty_catalog_returns_nothing",
        empty_catalog_returns_nothing(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "requested_record_returned",
        requested_record_returned(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "unrequested_records_omitted",
        unrequested_records_omitted(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "missing_uid_is_absent",
        missing_uid_is_absent(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "record_fields_preserved",
        record_fields_preserved(factory).await,
    ));
    results.push(TestResult::from_result(
        "membership",
        "all_requested_records_returned",
        all_requested_records_returned(factory).await,
    ));

    results
}

// ── Test implementations ──────────────────────────────────────────────────────

/// An empty UID set must yield an empty result, not an error.
async fn empty_request_returns_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![make_record("1.1", CT_IMAGE_STORAGE, false)]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&[]))
        .await
        .map_err(|e| e.to_string())?;
    if !found.is_empty() {
        return Err(format!("expected no records, got {}", found.len()));
    }
    Ok(())
}

async fn empty_catalog_returns_nothing<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1", "1.2"]))
        .await
        .map_err(|e| e.to_string())?;
    if !found.is_empty() {
        return Err(format!("expected no records, got {}", found.len()));
    }
    Ok(())
}

async fn requested_record_returned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![make_record("1.1", CT_IMAGE_STORAGE, false)]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1"]))
        .await
        .map_err(|e| e.to_string())?;
    if found_uids(&found) != uid_set(&["1.1"]) {
        return Err(format!("expected [1.1], got {:?}", found_uids(&found)));
    }
    Ok(())
}

/// Records held by the catalog but not asked for must not leak into the result.
async fn unrequested_records_omitted<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![
        make_record("1.1", CT_IMAGE_STORAGE, false),
        make_record("1.2", CT_IMAGE_STORAGE, false),
        make_record("1.3", MR_IMAGE_STORAGE, false),
    ])
    .await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.2"]))
        .await
        .map_err(|e| e.to_string())?;
    if found_uids(&found) != uid_set(&["1.2"]) {
        return Err(format!("expected [1.2], got {:?}", found_uids(&found)));
    }
    Ok(())
}

async fn missing_uid_is_absent<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let s = factory(vec![make_record("1.1", CT_IMAGE_STORAGE, false)]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1", "9.9"]))
        .await
        .map_err(|e| e.to_string())?;
    if found.len() != 1 || found[0].sop_instance_uid != "1.1" {
        return Err(format!(
            "expected only 1.1 to be found, got {:?}",
            found_uids(&found)
        ));
    }
    Ok(())
}

/// Class UID and both retrieve locations must come back unchanged.
async fn record_fields_preserved<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut stored = make_record("1.1", MR_IMAGE_STORAGE, false);
    stored.retrieve_locations = RetrieveLocations::new(Some("AE_ONE\\AE_TWO"), None);
    let s = factory(vec![stored.clone()]).await;
    let found = s
        .find_by_sop_instance_uids(&uid_set(&["1.1"]))
        .await
        .map_err(|e| e.to_string())?;
    let rec = found
        .first()
        .ok_or_else(|| "expected one record, got none".to_string())?;
    if rec.sop_class_uid != stored.sop_class_uid {
        return Err(format!(
            "expected class {}, got {}",
            stored.sop_class_uid, rec.sop_class_uid
        ));
    }
    if rec.retrieve_locations != stored.retrieve_locations {
        return Err(format!(
            "expected locations {:?}, got {:?}",
            stored.retrieve_locations, rec.retrieve_locations
        ));
    }
    if rec.superseded {
        return Err("returned record is flagged superseded".to_string());
    }
    Ok(())
}

async fn all_requested_records_returned<S, F, Fut>(factory: &F) -> Result<(), String>
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let uids: Vec<String> = (1..=50).map(|i| format!("1.2.3.{}", i)).collect();
    let records = uids
        .iter()
        .map(|u| make_record(u, CT_IMAGE_STORAGE, false))
        .collect();
    let s = factory(records).await;
    let requested: Vec<&str> = uids.iter().map(|s| s.as_str()).collect();
    let found = s
        .find_by_sop_instance_uids(&uid_set(&requested))
        .await
        .map_err(|e| e.to_string())?;
    if found.len() != 50 {
        return Err(format!("expected 50 records, got {}", found.len()));
    }
    Ok(())
}
