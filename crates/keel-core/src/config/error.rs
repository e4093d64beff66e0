//! # Keel Core Configuration Errors
//!
//! Defines [`ConfigError`], raised while loading configuration layers from a
//! [`ConfigSource`](super::ConfigSource) or converting configuration values
//! between formats.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load configuration from '{}': {message}", path.display())]
    LoadError {
        path: PathBuf,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Configuration value at '{key}' is not a map")]
    NotAMap { key: String },

    #[error("Failed to serialize configuration to {format}: {message}")]
    SerializationError { format: String, message: String },

    #[error("Failed to deserialize configuration from {format}: {message}")]
    DeserializationError { format: String, message: String },
}
