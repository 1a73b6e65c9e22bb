//! Storage commitment value types.
//!
//! A peer sends a [`StorageCommitmentRequest`] naming SOP instances it wants
//! the archive to vouch for; the archive answers with a
//! [`StorageCommitmentResult`] partitioning every requested reference into
//! a success or a failure.

use std::fmt;

use serde::{Deserialize, Serialize};

/// DICOM status `0112H`, No Such Object Instance.
pub const NO_SUCH_OBJECT_INSTANCE: u16 = 0x0112;

/// DICOM status `0119H`, Class-Instance Conflict.
pub const CLASS_INSTANCE_CONFLICT: u16 = 0x0119;

/// A reference to one SOP instance, as listed in the Referenced SOP Sequence.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SopRef {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
}

impl SopRef {
    pub fn new(sop_class_uid: impl Into<String>, sop_instance_uid: impl Into<String>) -> Self {
        SopRef {
            sop_class_uid: sop_class_uid.into(),
            sop_instance_uid: sop_instance_uid.into(),
        }
    }
}

/// Storage commitment N-ACTION information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCommitmentRequest {
    pub transaction_uid: String,
    /// Order determines result order. Duplicates are allowed and kept.
    pub requested: Vec<SopRef>,
}

/// Application entities from which a stored instance can be retrieved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetrieveLocations {
    /// Retrieve AE titles of this archive.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary: Option<String>,
    /// Retrieve AE title of an external archive holding a copy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<String>,
}

impl RetrieveLocations {
    pub fn new(primary: Option<&str>, external: Option<&str>) -> Self {
        RetrieveLocations {
            primary: primary.map(str::to_string),
            external: external.map(str::to_string),
        }
    }
}

/// One catalog entry as returned by an instance lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredInstanceRecord {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    #[serde(default)]
    pub retrieve_locations: RetrieveLocations,
    /// Replaced by a newer version of the same instance. Lookups never
    /// return superseded records.
    #[serde(default)]
    pub superseded: bool,
}

/// Why a requested instance could not be committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    /// Not in the catalog, or only present in a superseded version.
    NoSuchObjectInstance,
    /// Stored under a different SOP class than the one requested.
    ClassInstanceConflict,
}

impl FailureReason {
    /// The Failure Reason (0008,1197) value.
    pub fn code(self) -> u16 {
        match self {
            FailureReason::NoSuchObjectInstance => NO_SUCH_OBJECT_INSTANCE,
            FailureReason::ClassInstanceConflict => CLASS_INSTANCE_CONFLICT,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::NoSuchObjectInstance => write!(f, "no such object instance"),
            FailureReason::ClassInstanceConflict => write!(f, "class-instance conflict"),
        }
    }
}

/// A committed instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceOutcome {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    /// Only set when the result carries no common retrieve locations.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieve_locations: Option<RetrieveLocations>,
}

/// An instance that could not be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedInstance {
    pub sop_class_uid: String,
    pub sop_instance_uid: String,
    pub reason: FailureReason,
}

/// Storage commitment N-EVENT-REPORT information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCommitmentResult {
    pub transaction_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub common_retrieve_locations: Option<RetrieveLocations>,
    pub successes: Vec<InstanceOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<FailedInstance>,
}

impl StorageCommitmentResult {
    /// Event Type ID of the report: 1 when every instance was committed,
    /// 2 when at least one failed.
    pub fn event_type_id(&self) -> u16 {
        if self.failures.is_empty() {
            1
        } else {
            2
        }
    }

    pub fn total(&self) -> usize {
        self.successes.len() + self.failures.len()
    }
}
