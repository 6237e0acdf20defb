//! Error types for proxima.

use thiserror::Error;

/// Errors that can occur during index construction and search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndexError {
    /// `add` ran before the seed node was published. The first point must be
    /// published directly, before any concurrent insertion starts.
    #[error("graph registry is empty: publish the seed node before inserting")]
    EmptyRegistry,

    /// A node reached during query carries no publication index, which means
    /// the insertion protocol published it out of order.
    #[error("node reached during query has no publication index")]
    UninitializedIndex,

    /// The requested operation is not provided by this method.
    #[error("{0} is not supported by small_world_rand")]
    UnsupportedOperation(&'static str),

    /// A named option carried the wrong type or an invalid value.
    #[error("bad parameter: {0}")]
    BadParameter(String),

    /// An indexing worker failed; the index is in an undefined state and
    /// must not be queried.
    #[error("indexing worker failed: {0}")]
    WorkerFailed(String),
}

/// Result type alias for proxima operations.
pub type Result<T> = std::result::Result<T, IndexError>;
