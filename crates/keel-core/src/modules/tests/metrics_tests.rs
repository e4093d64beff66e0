use std::sync::Arc;

use serde_json::json;

use crate::config::ConfigData;
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{Module, ModuleConfig, ModuleHandle};
use crate::modules::{LoggingModule, MetricsModule};

fn dispatch(settings: serde_json::Value) -> ModuleConfig {
    let logger = Arc::new(LoggingModule::new());
    ModuleConfig::new(ConfigData::from_value(settings).unwrap()).with_dependency("logger", logger as ModuleHandle)
}

#[test]
fn test_metrics_counts() {
    let metrics = MetricsModule::new();
    metrics.initialize(dispatch(json!({}))).unwrap();

    metrics.increment("requests");
    metrics.increment_by("requests", 4);
    metrics.increment("errors");

    assert_eq!(metrics.get("requests"), 5);
    assert_eq!(metrics.get("errors"), 1);
    assert_eq!(metrics.get("unknown"), 0);

    let status = metrics.status();
    assert_eq!(status.details["counter_count"], json!(2));
    assert_eq!(status.details["counters"], json!({ "errors": 1, "requests": 5 }));
}

#[test]
fn test_disabled_metrics_drop_increments() {
    let metrics = MetricsModule::new();
    metrics.initialize(dispatch(json!({ "enabled": false }))).unwrap();

    metrics.increment("requests");

    assert!(!metrics.is_enabled());
    assert_eq!(metrics.get("requests"), 0);
    assert_eq!(metrics.status().details["enabled"], json!(false));
}

#[test]
fn test_metrics_rejects_non_boolean_enabled() {
    let metrics = MetricsModule::new();
    let result = metrics.initialize(dispatch(json!({ "enabled": "yes" })));
    assert!(matches!(result, Err(ModuleError::InvalidConfig { .. })));
}
