//! Error types for the cache
//!
//! Cache operations themselves never fail; errors only arise at the
//! configuration boundary.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache crate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CacheError {
    /// An environment variable held a value that could not be used
    #[error("Invalid config {var}={value:?}: {reason}")]
    InvalidConfig {
        var: String,
        value: String,
        reason: String,
    },

    /// A default lifetime of zero would evict every entry on insert
    #[error("Default lifetime must be greater than zero")]
    ZeroLifetime,
}

// == Result Type Alias ==
/// Convenience Result type for the cache crate.
pub type Result<T> = std::result::Result<T, CacheError>;
