use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::error::LookupError;
use pacs_core::StoredInstanceRecord;

/// Read access to the archive's instance catalog.
///
/// ## Contract
///
/// - Only current records are returned: a record whose `superseded` flag is
///   set must be filtered out by the implementation, so that callers can
///   treat "absent" and "superseded" identically.
/// - An id missing from the returned list means "not stored".
/// - No ordering guarantee; callers index the result by SOP instance UID.
/// - One call per lookup. Timeouts and retries, if any, belong to the
///   implementation and surface as [`LookupError::Unavailable`].
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync` so a single catalog handle can be
/// shared by concurrent storage commitment requests.
#[async_trait]
pub trait InstanceLookup: Send + Sync {
    /// Return the stored, non-superseded records for the given SOP instance UIDs.
    async fn find_by_sop_instance_uids(
        &self,
        sop_instance_uids: &BTreeSet<String>,
    ) -> Result<Vec<StoredInstanceRecord>, LookupError>;
}

#[async_trait]
impl<T: InstanceLookup + ?Sized> InstanceLookup for std::sync::Arc<T> {
    async fn find_by_sop_instance_uids(
        &self,
        sop_instance_uids: &BTreeSet<String>,
    ) -> Result<Vec<StoredInstanceRecord>, LookupError> {
        (**self).find_by_sop_instance_uids(sop_instance_uids).await
    }
}
