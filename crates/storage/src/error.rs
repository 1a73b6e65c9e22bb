/// All errors that can be returned by an InstanceLookup implementation.
#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    /// The catalog could not be queried at all (connection lost, backend down).
    /// Callers must not guess a result when they see this.
    #[error("instance catalog unavailable: {0}")]
    Unavailable(String),

    /// Catalog content could not be read or decoded.
    #[error("invalid catalog data: {0}")]
    InvalidCatalog(String),
}
