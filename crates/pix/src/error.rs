use pacs_core::ParseIdError;
use pacs_hl7::{ConfigurationError, Hl7Error, TransportError};

/// Everything that can go wrong inside a PIX query. Never returned by
/// [`PixResolver::resolve`](crate::PixResolver::resolve); it is logged and
/// replaced by the fallback identity set.
#[derive(Debug, thiserror::Error)]
pub enum PixError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("PIX message error: {0}")]
    Message(#[from] Hl7Error),

    #[error("invalid alias in PIX response: {0}")]
    Alias(#[from] ParseIdError),
}
