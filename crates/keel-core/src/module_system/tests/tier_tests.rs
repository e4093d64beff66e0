use crate::module_system::registry::ModuleRegistry;
use crate::module_system::tier::{TierTable, TierViolation};
use crate::tests::integration::common::{mock, Probe};

#[test]
fn test_tier_lookup() {
    let tiers = TierTable::from_slices(&[&["logger"], &["cache", "metrics"]]);

    assert_eq!(tiers.tier_of("logger"), Some(0));
    assert_eq!(tiers.tier_of("metrics"), Some(1));
    assert_eq!(tiers.tier_of("other"), None);
    assert_eq!(tiers.names().collect::<Vec<_>>(), vec!["logger", "cache", "metrics"]);
}

#[test]
fn test_insert_ignores_repeats_and_missing_tiers() {
    let mut tiers = TierTable::new();
    tiers.push_tier(["a"]);
    tiers.insert(0, "b");
    tiers.insert(0, "a");
    tiers.insert(5, "c");

    assert_eq!(tiers.tiers(), [vec!["a".to_string(), "b".to_string()]]);
    assert!(!tiers.contains("c"));
}

#[test]
fn test_violation_reported_for_dependency_in_later_tier() {
    let probe = Probe::new();
    let mut registry = ModuleRegistry::with_catalog_names(["late"]);
    registry.register(mock("early", &probe).depends_on(["late"])).unwrap();
    registry.register(mock("late", &probe)).unwrap();

    let tiers = TierTable::from_slices(&[&["early"], &["late"]]);

    assert_eq!(
        tiers.violations(&registry),
        vec![TierViolation {
            module: "early".to_string(),
            module_tier: 0,
            dependency: "late".to_string(),
            dependency_tier: 1,
        }]
    );
}

#[test]
fn test_same_or_earlier_tier_is_not_a_violation() {
    let probe = Probe::new();
    let mut registry = ModuleRegistry::new();
    registry.register(mock("a", &probe)).unwrap();
    registry.register(mock("b", &probe).depends_on(["a"])).unwrap();
    registry.register(mock("c", &probe).depends_on(["a", "b"])).unwrap();

    let tiers = TierTable::from_slices(&[&["a"], &["b", "c"]]);
    assert!(tiers.violations(&registry).is_empty());
}
