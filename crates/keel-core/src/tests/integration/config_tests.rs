#![cfg(test)]

use std::fs;

use serde_json::json;
use tempfile::tempdir;

use crate::config::{ConfigData, ConfigError, FileConfigSource, StaticConfigSource};
use crate::kernel::bootstrap::KernelBuilder;
use crate::kernel::error::Error;
use crate::modules::{CacheModule, MetricsModule};

#[test]
fn test_deployment_file_then_runtime_override() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("deploy.json");
    fs::write(
        &path,
        r#"{ "kernel": { "environment": "staging" },
             "modules": { "cache": { "max_entries": 16 }, "metrics": { "enabled": false } } }"#,
    )
    .unwrap();

    let mut kernel = KernelBuilder::new()
        .deployment_source(FileConfigSource::new(&path))
        .runtime_overrides(ConfigData::from_value(json!({ "modules": { "cache": { "max_entries": 4 } } })).unwrap())
        .build()
        .unwrap();
    kernel.initialize().unwrap();

    assert_eq!(kernel.environment(), "staging");
    assert_eq!(kernel.get_module_as::<CacheModule>("cache").unwrap().max_entries(), 4);
    assert!(!kernel.get_module_as::<MetricsModule>("metrics").unwrap().is_enabled());
    assert_eq!(kernel.config().get_str("modules.logger.level"), Some("info"));
}

#[test]
fn test_missing_deployment_file_is_ignored() {
    let dir = tempdir().expect("Failed to create temp directory");
    let kernel = KernelBuilder::new()
        .deployment_source(FileConfigSource::new(dir.path().join("absent.toml")))
        .build()
        .unwrap();
    assert_eq!(kernel.environment(), "production");
}

#[test]
fn test_malformed_deployment_file_fails_construction() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    let result = KernelBuilder::new().deployment_source(FileConfigSource::new(&path)).build();

    assert!(matches!(result, Err(Error::Config(ConfigError::LoadError { .. }))));
}

#[test]
fn test_later_deployment_sources_win() {
    let first = ConfigData::from_value(json!({ "kernel": { "environment": "qa" } })).unwrap();
    let second = ConfigData::from_value(json!({ "kernel": { "environment": "canary" } })).unwrap();

    let kernel = KernelBuilder::new()
        .deployment_source(StaticConfigSource::new(first))
        .deployment_source(StaticConfigSource::new(second))
        .build()
        .unwrap();

    assert_eq!(kernel.environment(), "canary");
}

#[cfg(feature = "toml-config")]
#[test]
fn test_toml_deployment_file() {
    let dir = tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("deploy.toml");
    fs::write(&path, "[modules.logger]\nlevel = \"warn\"\n").unwrap();

    let mut kernel = KernelBuilder::new()
        .deployment_source(FileConfigSource::new(&path))
        .build()
        .unwrap();
    kernel.initialize().unwrap();

    let status = kernel.status();
    let logger = status.module("logger").unwrap().status.as_ref().unwrap();
    assert_eq!(logger.details["level"], json!("warn"));
}
