//! pacs-hl7: the HL7 v2 side of the PACS node.
//!
//! Only what the PIX consumer needs is modelled:
//!
//! - [`message`] -- segments and fields with the delimiters declared in MSH,
//!   the IHE PIX QBP^Q23 query builder, response parsing
//! - [`charset`] -- MSH-18 character set names mapped to byte encodings
//! - [`application`] -- HL7 applications, their connections, the local
//!   device and the remote application cache
//! - [`exchange`] -- the [`IdentityExchange`] port (connect / send / receive / close)
//! - [`mllp`] -- MLLP framing and [`MllpExchange`], the TCP implementation of the port

pub mod application;
pub mod charset;
pub mod error;
pub mod exchange;
pub mod message;
pub mod mllp;

pub use application::{
    CompatibleConnection, Hl7Application, Hl7ApplicationCache, Hl7Connection, Hl7Device,
    StaticApplicationCache,
};
pub use error::{ConfigurationError, Hl7Error, TransportError};
pub use exchange::IdentityExchange;
pub use message::{Delimiters, Hl7Message, Hl7Segment};
pub use mllp::{MllpConnection, MllpExchange};
