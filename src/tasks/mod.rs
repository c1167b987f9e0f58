//! Background Tasks Module
//!
//! Contains the tasks the cache spawns on the tokio runtime.
//!
//! # Tasks
//! - Expiry waiter: evicts one timed entry unless cancelled first

mod expiry;

pub(crate) use expiry::spawn_expiry_waiter;
