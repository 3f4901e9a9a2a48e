//! Cache Module
//!
//! Tick-driven memoization of sequences: entries, tables, the registry that
//! broadcasts ticks to every table, and the manager that owns them.

mod entry;
mod manager;
mod registry;
mod stats;
mod table;


// Re-export public types
pub use entry::{CacheEntry, Passthrough, Recache};
pub use manager::CacheManager;
pub use registry::{AutomaticMode, LifecycleHook, TickRegistry};
pub use stats::TableStats;
pub use table::{CacheTable, SharedTable};
