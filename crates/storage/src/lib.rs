mod error;
mod memory;
mod traits;

pub mod conformance;

pub use error::LookupError;
pub use memory::InMemoryCatalog;
pub use pacs_core::{RetrieveLocations, StoredInstanceRecord};
pub use traits::InstanceLookup;
