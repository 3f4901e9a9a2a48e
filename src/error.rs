//! Error types for the frame cache
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for cache table and registry operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// A call argument failed its precondition
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Single-key operation on a key the table does not hold
    #[error("Key not found: {0}")]
    KeyNotFound(String),
}

// == Result Type Alias ==
/// Convenience Result type for the frame cache.
pub type Result<T> = std::result::Result<T, CacheError>;
