//! In-memory instance catalog.
//!
//! Holds a fixed list of records, superseded ones included, and answers
//! lookups the way a database-backed catalog would: filtered by UID and
//! with superseded versions excluded. Used by the `pacs` CLI and as the
//! reference backend for the conformance suite.

use std::collections::BTreeSet;
use std::path::Path;

use async_trait::async_trait;

use crate::error::LookupError;
use crate::traits::InstanceLookup;
use pacs_core::StoredInstanceRecord;

#[derive(Debug, Clone, Default)]
pub struct InMemoryCatalog {
    records: Vec<StoredInstanceRecord>,
}

impl InMemoryCatalog {
    pub fn new(records: Vec<StoredInstanceRecord>) -> Self {
        InMemoryCatalog { records }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parse a catalog from a JSON array of records.
    pub fn from_json_str(json: &str) -> Result<Self, LookupError> {
        let records: Vec<StoredInstanceRecord> =
            serde_json::from_str(json).map_err(|e| LookupError::InvalidCatalog(e.to_string()))?;
        Ok(Self::new(records))
    }

    /// Read a catalog from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self, LookupError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            LookupError::InvalidCatalog(format!("could not read '{}': {}", path.display(), e))
        })?;
        Self::from_json_str(&content)
    }

    pub fn insert(&mut self, record: StoredInstanceRecord) {
        self.records.push(record);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl InstanceLookup for InMemoryCatalog {
    async fn find_by_sop_instance_uids(
        &self,
        sop_instance_uids: &BTreeSet<String>,
    ) -> Result<Vec<StoredInstanceRecord>, LookupError> {
        let found: Vec<StoredInstanceRecord> = self
            .records
            .iter()
            .filter(|r| !r.superseded && sop_instance_uids.contains(&r.sop_instance_uid))
            .cloned()
            .collect();
        tracing::debug!(
            requested = sop_instance_uids.len(),
            found = found.len(),
            "catalog lookup"
        );
        Ok(found)
    }
}
