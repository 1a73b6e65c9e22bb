//! pacs-stgcmt: storage commitment for the archive.
//!
//! - [`Reconciler`] partitions a request into committed and failed instances
//!   using an [`InstanceLookup`](pacs_storage::InstanceLookup).
//! - [`StgCmtScp`] handles the N-ACTION request and schedules the report.
//! - [`ReportDispatcher`] delivers reports through a [`ReportSender`],
//!   retrying transient failures.

pub mod config;
pub mod error;
pub mod reconciler;
pub mod report;
pub mod scp;

pub use config::StgCmtConfig;
pub use error::{ReportError, ScpError, NO_SUCH_ACTION_TYPE, PROCESSING_FAILURE};
pub use reconciler::{compute_result, Reconciler};
pub use report::{DispatchOutcome, ReportDispatcher, ReportQueue, ReportSender, ScheduledReport};
pub use scp::{StgCmtScp, REQUEST_STORAGE_COMMITMENT};
