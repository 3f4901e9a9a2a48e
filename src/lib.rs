//! Frame Cache - tick-driven memoization of sequences
//!
//! Keeps the materialized output of sequence-producing computations for a
//! caller-chosen number of logical ticks (frames), then recomputes it,
//! optionally reusing the previously allocated values in place.

pub mod cache;
pub mod cached;
pub mod config;
pub mod error;

pub use cache::{CacheManager, CacheTable, Recache, TickRegistry};
pub use cached::Cached;
pub use config::Config;
pub use error::{CacheError, Result};
