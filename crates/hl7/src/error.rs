use std::io;

/// Errors from decoding or interpreting an HL7 message.
#[derive(Debug, thiserror::Error)]
pub enum Hl7Error {
    #[error("message does not start with an MSH segment")]
    MissingHeader,

    #[error("malformed MSH segment: {0}")]
    MalformedHeader(String),

    #[error("unsupported HL7 character set '{0}'")]
    UnsupportedCharset(String),

    #[error("message could not be decoded as {charset}")]
    Undecodable { charset: String },

    #[error("message could not be encoded as {charset}")]
    Unencodable { charset: String },

    #[error("peer rejected the message: MSA-1={ack_code}{}", detail(.text))]
    Rejected {
        ack_code: String,
        text: Option<String>,
    },
}

fn detail(text: &Option<String>) -> String {
    text.as_deref()
        .map(|t| format!(" ({})", t))
        .unwrap_or_default()
}

/// Errors from establishing or using a connection to an HL7 peer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No pair of local/remote connections can talk to each other.
    #[error("no compatible connection from {local} to {remote}")]
    Incompatible { local: String, remote: String },

    #[error("failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    #[error("{operation} timed out after {millis} ms")]
    Timeout { operation: &'static str, millis: u64 },

    #[error("malformed MLLP frame: {0}")]
    Framing(String),

    #[error("connection closed by peer")]
    Closed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Errors from resolving HL7 application configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    /// The named application is not registered on the local device.
    #[error("unknown local HL7 application: {name}")]
    UnknownLocalApplication { name: String },

    /// The remote application cache has no entry for the name.
    #[error("unknown remote HL7 application: {name}")]
    UnknownRemoteApplication { name: String },

    /// The configuration backend could not be queried.
    #[error("configuration backend error: {0}")]
    Backend(String),
}
