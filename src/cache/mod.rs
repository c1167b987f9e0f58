//! Cache Module
//!
//! Provides the concurrent cache, its capability traits and statistics.

mod capability;
mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use capability::{Simple, WithExpiry};
pub use stats::CacheStats;
pub use store::ExpiringCache;

pub(crate) use store::Shared;
