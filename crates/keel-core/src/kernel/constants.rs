/// Application name
pub const APP_NAME: &str = "Keel";

/// Application version
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment reported when no configuration layer sets one
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Built-in logging module; also the failure supervisor's log sink
pub const LOGGER_MODULE: &str = "logger";

/// Built-in in-memory cache module
pub const CACHE_MODULE: &str = "cache";

/// Built-in counters module
pub const METRICS_MODULE: &str = "metrics";

/// Top-level configuration branch holding kernel settings
pub const KERNEL_CONFIG_KEY: &str = "kernel";
