use serde_json::{json, Map, Value};

use crate::config::{ConfigData, MODULES_KEY};
use crate::kernel::constants::{
    APP_VERSION, CACHE_MODULE, DEFAULT_ENVIRONMENT, KERNEL_CONFIG_KEY, LOGGER_MODULE, METRICS_MODULE,
};
use crate::module_system::descriptor::ModuleRegistration;
use crate::module_system::tier::TierTable;
use crate::modules::{CacheModule, LoggingModule, MetricsModule};

/// Fixed set of modules a kernel registers during construction, together
/// with the tier table that orders them.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<ModuleRegistration>,
    tiers: TierTable,
}

impl Catalog {
    /// A catalog with no modules and no tiers
    pub fn empty() -> Self {
        Self::default()
    }

    /// The built-in modules: `logger` in tier 0, `cache` and `metrics` in tier 1
    pub fn builtin() -> Self {
        let mut catalog = Self::empty();
        catalog
            .add(
                ModuleRegistration::new(LOGGER_MODULE, LoggingModule::new)
                    .required(true)
                    .priority(0),
                0,
            )
            .add(
                ModuleRegistration::new(CACHE_MODULE, CacheModule::new)
                    .depends_on([LOGGER_MODULE])
                    .priority(10),
                1,
            )
            .add(
                ModuleRegistration::new(METRICS_MODULE, MetricsModule::new)
                    .depends_on([LOGGER_MODULE])
                    .priority(20),
                1,
            );
        catalog
    }

    /// Append a registration and place it in `tier`, creating empty tiers as needed
    pub fn add(&mut self, registration: ModuleRegistration, tier: usize) -> &mut Self {
        while self.tiers.tiers().len() <= tier {
            self.tiers.push_tier(Vec::<String>::new());
        }
        self.tiers.insert(tier, registration.name());
        self.entries.push(registration);
        self
    }

    /// Append a registration that sits outside the tier table
    pub fn add_untiered(&mut self, registration: ModuleRegistration) -> &mut Self {
        self.entries.push(registration);
        self
    }

    pub fn entries(&self) -> &[ModuleRegistration] {
        &self.entries
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(ModuleRegistration::name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names().any(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowest-precedence configuration layer
pub fn builtin_defaults() -> ConfigData {
    let mut modules = Map::new();
    modules.insert(LOGGER_MODULE.to_string(), LoggingModule::default_settings());
    modules.insert(CACHE_MODULE.to_string(), CacheModule::default_settings());
    modules.insert(METRICS_MODULE.to_string(), MetricsModule::default_settings());

    let mut root = Map::new();
    root.insert(
        KERNEL_CONFIG_KEY.to_string(),
        json!({ "version": APP_VERSION, "environment": DEFAULT_ENVIRONMENT }),
    );
    root.insert(MODULES_KEY.to_string(), Value::Object(modules));
    ConfigData::from_map(root)
}
