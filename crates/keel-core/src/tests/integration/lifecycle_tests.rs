#![cfg(test)]

use serde_json::json;

use crate::config::ConfigData;
use crate::kernel::bootstrap::{Kernel, KernelBuilder, KernelState};
use crate::kernel::error::Error;
use crate::module_system::catalog::Catalog;
use crate::module_system::error::ModuleSystemError;
use crate::modules::{CacheModule, LoggingModule, MetricsModule};
use crate::tests::integration::common::{failing_mock, mock, Probe};

/// Host-shaped catalog: a required chain, an optional side branch and an untiered extra
fn host_catalog(probe: &Probe) -> Catalog {
    let mut catalog = Catalog::builtin();
    catalog
        .add(mock("storage", probe).depends_on(["logger"]).required(true), 1)
        .add(mock("content", probe).depends_on(["storage", "cache"]).required(true), 2)
        .add(mock("assets", probe).depends_on(["content"]).priority(5), 3)
        .add_untiered(mock("fonts", probe).depends_on(["assets"]).priority(50));
    catalog
}

#[test]
fn test_required_modules_and_their_chains_come_up() {
    let probe = Probe::new();
    let mut kernel = KernelBuilder::new().catalog(host_catalog(&probe)).build().unwrap();

    kernel.initialize().unwrap();

    for name in ["logger", "cache", "metrics", "storage", "content", "assets", "fonts"] {
        assert!(kernel.registry().is_initialized(name), "{} should be initialized", name);
    }
    assert_eq!(probe.init_order(), vec!["storage", "content", "assets", "fonts"]);
    let order = kernel.init_order();
    let position = |name: &str| order.iter().position(|n| n == name).unwrap();
    assert!(position("cache") < position("content"));
    assert!(position("storage") < position("content"));
}

#[test]
fn test_optional_failure_leaves_later_tiers_running() {
    let probe = Probe::new();
    let mut catalog = Catalog::builtin();
    catalog
        .add(failing_mock("fancy", &probe), 1)
        .add(mock("widgets", &probe), 2)
        .add(mock("gadgets", &probe).depends_on(["metrics"]), 2);
    let mut kernel = KernelBuilder::new().catalog(catalog).build().unwrap();

    kernel.initialize().unwrap();

    let status = kernel.status();
    assert!(!status.module("fancy").unwrap().initialized);
    assert!(status.module("widgets").unwrap().initialized);
    assert!(status.module("gadgets").unwrap().initialized);
    assert_eq!(status.state, KernelState::Initialized);

    let logger = kernel.get_module_as::<LoggingModule>("logger").unwrap();
    assert!(logger
        .recent_entries()
        .iter()
        .any(|entry| entry.message.contains("fancy")));
}

#[test]
fn test_required_failure_aborts_with_named_cause() {
    let probe = Probe::new();
    let mut catalog = Catalog::builtin();
    catalog
        .add(failing_mock("database", &probe).required(true), 1)
        .add(mock("reports", &probe), 2);
    let mut kernel = KernelBuilder::new().catalog(catalog).build().unwrap();

    let error = kernel.initialize().unwrap_err();

    match &error {
        Error::ModuleSystem(ModuleSystemError::RequiredModuleInitFailed { module, .. }) => {
            assert_eq!(module, "database")
        }
        other => panic!("Expected RequiredModuleInitFailed, got {:?}", other),
    }
    assert!(error.to_string().contains("database refused to start"));

    let status = kernel.status();
    assert!(!status.initialized);
    assert!(!status.module("database").unwrap().initialized);
    assert!(!status.module("reports").unwrap().initialized);
    assert_eq!(probe.init_calls("reports"), 0);
}

#[test]
fn test_lazy_access_then_full_initialize_runs_each_module_once() {
    let probe = Probe::new();
    let mut kernel = KernelBuilder::new().catalog(host_catalog(&probe)).build().unwrap();

    kernel.get_module("content").unwrap();
    assert!(kernel.registry().is_initialized("storage"));
    assert!(!kernel.registry().is_initialized("assets"));

    kernel.initialize().unwrap();
    kernel.initialize().unwrap();

    for name in ["storage", "content", "assets", "fonts"] {
        assert_eq!(probe.init_calls(name), 1, "{} initialized more than once", name);
        assert_eq!(probe.constructed(name), 1, "{} constructed more than once", name);
    }
}

#[test]
fn test_modules_registered_after_bootstrap_initialize_on_demand() {
    let probe = Probe::new();
    let mut kernel = Kernel::new().unwrap();
    kernel.initialize().unwrap();

    kernel
        .register(mock("late", &probe).depends_on(["cache"]))
        .unwrap();
    assert!(!kernel.registry().is_initialized("late"));

    kernel.get_module("late").unwrap();

    assert!(kernel.registry().is_initialized("late"));
    assert_eq!(probe.dependencies("late"), Some(vec!["cache".to_string()]));
}

#[test]
fn test_builtin_modules_cooperate_through_the_kernel() {
    let mut kernel = KernelBuilder::new()
        .runtime_overrides(
            ConfigData::from_value(json!({
                "modules": { "cache": { "max_entries": 1 }, "logger": { "level": "debug" } }
            }))
            .unwrap(),
        )
        .build()
        .unwrap();
    kernel.initialize().unwrap();

    let cache = kernel.get_module_as::<CacheModule>("cache").unwrap();
    cache.set("a", json!(1));
    cache.set("b", json!(2));

    let logger = kernel.get_module_as::<LoggingModule>("logger").unwrap();
    assert!(logger
        .recent_entries()
        .iter()
        .any(|entry| entry.category == "cache" && entry.message == "evicted 'a'"));

    let metrics = kernel.get_module_as::<MetricsModule>("metrics").unwrap();
    metrics.increment("cache.sets");
    assert_eq!(kernel.status().module("metrics").unwrap().status.as_ref().unwrap().details["counter_count"], json!(1));
}
