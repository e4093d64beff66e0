//! # Keel Core Configuration
//!
//! Layered configuration for the kernel and its modules.
//!
//! Three layers are composed in increasing precedence: built-in defaults,
//! deployment overrides (usually read through a [`ConfigSource`]) and
//! caller-supplied runtime overrides. Composition is a deep merge: nested
//! maps merge key-wise, every other value is replaced by the later layer.
//!
//! - **[`data`]**: [`ConfigData`], the nested key-value tree, and [`ConfigFormat`].
//! - **[`compose`]**: the deep-merge composer and per-module branch lookup.
//! - **[`source`]**: [`ConfigSource`] and its static and file-backed implementations.
//! - **[`error`]**: [`ConfigError`].
pub mod compose;
pub mod data;
pub mod error;
pub mod source;

pub use compose::{compose, module_section, normalize_module_key, MODULES_KEY};
pub use data::{ConfigData, ConfigFormat};
pub use error::ConfigError;
pub use source::{ConfigSource, FileConfigSource, StaticConfigSource};
