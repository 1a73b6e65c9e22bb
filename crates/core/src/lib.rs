//! pacs-core: shared value types for the PACS reconciliation node.
//!
//! Two groups of types live here:
//!
//! - [`identifier`] -- patient identifiers with optional issuing authority
//!   ([`IdWithIssuer`], [`Issuer`]) and the resolved [`IdentitySet`]
//! - [`stgcmt`] -- storage commitment requests, stored instance records and
//!   the partitioned [`StorageCommitmentResult`]
//!
//! Both the PIX resolver and the storage commitment reconciler depend on
//! this crate; neither depends on the other.

pub mod identifier;
pub mod stgcmt;

pub use identifier::{IdWithIssuer, IdentitySet, Issuer, ParseIdError};
pub use stgcmt::{
    FailedInstance, FailureReason, InstanceOutcome, RetrieveLocations, SopRef,
    StorageCommitmentRequest, StorageCommitmentResult, StoredInstanceRecord,
};
