//! pacs-pix: patient identifier cross-reference (PIX) consumer.
//!
//! [`PixResolver::resolve`] turns one locally known patient identifier into
//! an [`IdentitySet`](pacs_core::IdentitySet) by asking a remote PIX manager
//! over an [`IdentityExchange`](pacs_hl7::IdentityExchange). It never fails:
//! every error degrades to the identifier it was given.

pub mod config;
pub mod error;
pub mod resolver;

pub use config::PixEndpoints;
pub use error::PixError;
pub use resolver::{parse_aliases, PixResolver};
