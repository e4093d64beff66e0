//! # Built-in Modules
//!
//! The modules every kernel registers from the built-in catalog.
//!
//! - **[`LoggingModule`]** (`logger`, required): the log sink used by the failure supervisor.
//! - **[`CacheModule`]** (`cache`, optional): bounded in-memory key/value store.
//! - **[`MetricsModule`]** (`metrics`, optional): named counters.
pub mod cache;
pub mod logger;
pub mod metrics;

pub use cache::CacheModule;
pub use logger::{LogEntry, LoggingModule};
pub use metrics::MetricsModule;

#[cfg(test)]
mod tests;
