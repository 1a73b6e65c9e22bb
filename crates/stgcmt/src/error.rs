use pacs_storage::LookupError;

/// DICOM status `0110H`, Processing Failure.
pub const PROCESSING_FAILURE: u16 = 0x0110;

/// DICOM status `0123H`, No Such Action Type.
pub const NO_SUCH_ACTION_TYPE: u16 = 0x0123;

/// Failure of an N-ACTION request, answered with an error status.
#[derive(Debug, thiserror::Error)]
pub enum ScpError {
    #[error("no such action type: {action_type_id}")]
    NoSuchActionType { action_type_id: u16 },

    #[error("processing failure: {0}")]
    ProcessingFailure(String),
}

impl ScpError {
    /// Status of the N-ACTION response.
    pub fn status(&self) -> u16 {
        match self {
            ScpError::NoSuchActionType { .. } => NO_SUCH_ACTION_TYPE,
            ScpError::ProcessingFailure(_) => PROCESSING_FAILURE,
        }
    }
}

impl From<LookupError> for ScpError {
    fn from(e: LookupError) -> Self {
        ScpError::ProcessingFailure(e.to_string())
    }
}

/// Failure to deliver an N-EVENT-REPORT.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("no such local AE: {aet}")]
    UnknownLocalAe { aet: String },

    #[error("local AE {aet} does not support Storage Commitment Push Model in SCP role")]
    NotSupported { aet: String },

    #[error("association to {remote_aet} failed: {message}")]
    Association { remote_aet: String, message: String },
}

impl ReportError {
    /// Permanent failures are not retried.
    pub fn is_permanent(&self) -> bool {
        matches!(
            self,
            ReportError::UnknownLocalAe { .. } | ReportError::NotSupported { .. }
        )
    }
}
