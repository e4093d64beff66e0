use crate::kernel::constants::{APP_VERSION, CACHE_MODULE, LOGGER_MODULE, METRICS_MODULE};
use crate::module_system::catalog::{builtin_defaults, Catalog};
use crate::module_system::registry::ModuleRegistry;
use crate::tests::integration::common::{mock, Probe};

#[test]
fn test_builtin_catalog_layout() {
    let catalog = Catalog::builtin();

    assert_eq!(catalog.names().collect::<Vec<_>>(), vec![LOGGER_MODULE, CACHE_MODULE, METRICS_MODULE]);
    assert_eq!(catalog.tiers().tier_of(LOGGER_MODULE), Some(0));
    assert_eq!(catalog.tiers().tier_of(CACHE_MODULE), Some(1));
    assert_eq!(catalog.tiers().tier_of(METRICS_MODULE), Some(1));

    let logger = &catalog.entries()[0];
    assert!(logger.is_required());
    assert!(!catalog.entries()[1].is_required());
    assert_eq!(catalog.entries()[1].dependencies(), [LOGGER_MODULE.to_string()]);
}

#[test]
fn test_builtin_catalog_has_consistent_tiers() {
    let catalog = Catalog::builtin();
    let mut registry = ModuleRegistry::with_catalog_names(catalog.names());
    for registration in catalog.entries() {
        registry.register(registration.clone()).unwrap();
    }
    assert!(catalog.tiers().violations(&registry).is_empty());
}

#[test]
fn test_add_creates_missing_tiers() {
    let probe = Probe::new();
    let mut catalog = Catalog::empty();
    catalog.add(mock("deep", &probe), 2).add_untiered(mock("loose", &probe));

    assert_eq!(catalog.tiers().tiers().len(), 3);
    assert_eq!(catalog.tiers().tier_of("deep"), Some(2));
    assert!(catalog.contains("loose"));
    assert!(!catalog.tiers().contains("loose"));
    assert_eq!(catalog.len(), 2);
}

#[test]
fn test_builtin_defaults_declare_kernel_metadata() {
    let defaults = builtin_defaults();

    assert_eq!(defaults.get_str("kernel.version"), Some(APP_VERSION));
    assert_eq!(defaults.get_str("kernel.environment"), Some("production"));
    assert_eq!(defaults.get_str("modules.logger.level"), Some("info"));
    assert!(defaults.get_path("modules.cache.max_entries").is_some());
    assert_eq!(defaults.get_path("modules.metrics.enabled"), Some(&serde_json::json!(true)));
}
