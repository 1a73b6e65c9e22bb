//! Conformance test suite for `InstanceLookup` implementations.
//!
//! This module provides a backend-agnostic test suite that any
//! `InstanceLookup` implementation can run to verify correctness. The suite
//! covers:
//!
//! - **Membership**: only requested UIDs come back, missing UIDs are absent,
//!   record fields survive the round trip through the backend
//! - **Superseded filtering**: replaced versions are never returned
//!
//! # Usage
//!
//! Backend crates call [`run_conformance_suite`] with a factory that builds
//! a fresh catalog holding exactly the given records:
//!
//! ```ignore
//! use pacs_storage::conformance::run_conformance_suite;
//!
//! #[tokio::test]
//! async fn postgres_conformance() {
//!     let report = run_conformance_suite(|records| async move {
//!         seeded_test_catalog(records).await
//!     }).await;
//!     assert!(report.failed == 0, "{report}");
//! }
//! ```

mod membership;
mod superseded;

use std::collections::BTreeSet;
use std::fmt;
use std::future::Future;

use crate::InstanceLookup;
use pacs_core::{RetrieveLocations, StoredInstanceRecord};

/// Result of a single conformance test.
#[derive(Debug, Clone)]
pub struct TestResult {
    /// Test category (e.g. "membership", "superseded").
    pub category: String,
    /// Test name (e.g. "missing_uid_is_absent").
    pub name: String,
    /// Whether the test passed.
    pub passed: bool,
    /// Error message if the test failed.
    pub message: Option<String>,
}

impl TestResult {
    fn pass(category: &str, name: &str) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: true,
            message: None,
        }
    }

    fn fail(category: &str, name: &str, msg: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            passed: false,
            message: Some(msg),
        }
    }

    fn from_result(category: &str, name: &str, result: Result<(), String>) -> Self {
        match result {
            Ok(()) => Self::pass(category, name),
            Err(msg) => Self::fail(category, name, msg),
        }
    }
}

/// Aggregated report from a full conformance suite run.
#[derive(Debug, Clone)]
pub struct ConformanceReport {
    pub results: Vec<TestResult>,
    pub passed: usize,
    pub failed: usize,
    pub total: usize,
}

impl fmt::Display for ConformanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Conformance: {}/{} passed ({} failed)",
            self.passed, self.total, self.failed
        )?;
        for r in &self.results {
            if !r.passed {
                writeln!(
                    f,
                    "  FAIL [{}/{}]: {}",
                    r.category,
                    r.name,
                    r.message.as_deref().unwrap_or("(no message)")
                )?;
            }
        }
        Ok(())
    }
}

/// Run the full conformance suite against a lookup backend.
///
/// The `factory` is called once per test with the records the backend must
/// hold, superseded ones included, and returns a fresh catalog.
pub async fn run_conformance_suite<S, F, Fut>(factory: F) -> ConformanceReport
where
    S: InstanceLookup,
    F: Fn(Vec<StoredInstanceRecord>) -> Fut,
    Fut: Future<Output = S>,
{
    let mut results = Vec::new();

    results.extend(membership::run_membership_tests(&factory).await);
    results.extend(superseded::run_superseded_tests(&factory).await);

    let passed = results.iter().filter(|r| r.passed).count();
    let total = results.len();

    ConformanceReport {
        results,
        passed,
        failed: total - passed,
        total,
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────────

const CT_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.2";
const MR_IMAGE_STORAGE: &str = "1.2.840.10008.5.1.4.1.1.4";

fn make_record(uid: &str, sop_class_uid: &str, superseded: bool) -> StoredInstanceRecord {
    StoredInstanceRecord {
        sop_class_uid: sop_class_uid.to_string(),
        sop_instance_uid: uid.to_string(),
        retrieve_locations: RetrieveLocations::new(Some("ARCHIVE"), Some("OFFSITE")),
        superseded,
    }
}

fn uid_set(uids: &[&str]) -> BTreeSet<String> {
    uids.iter().map(|s| s.to_string()).collect()
}

fn found_uids(records: &[StoredInstanceRecord]) -> BTreeSet<String> {
    records.iter().map(|r| r.sop_instance_uid.clone()).collect()
}
