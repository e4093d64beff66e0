use std::collections::BTreeMap;

use serde::Serialize;

use crate::kernel::bootstrap::{Kernel, KernelState};
use crate::kernel::supervisor::FailureRecord;
use crate::module_system::descriptor::{ModuleDescriptor, ModuleState};
use crate::module_system::traits::ModuleStatus;

/// Introspection snapshot of a kernel.
///
/// Collecting it is read-only: no module is constructed or initialized as
/// a side effect.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KernelStatus {
    pub initialized: bool,
    pub state: KernelState,
    pub version: String,
    pub environment: String,
    /// Every registered module, plus tier entries that never got registered
    pub modules: BTreeMap<String, ModuleReport>,
    pub failures: Vec<FailureRecord>,
}

/// Per-module section of [`KernelStatus`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleReport {
    pub registered: bool,
    pub initialized: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<ModuleState>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i32>,
    pub required: bool,
    pub dependencies: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    /// The module's own status, present once its instance exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<ModuleStatus>,
}

impl ModuleReport {
    fn registered(descriptor: &ModuleDescriptor, tier: Option<usize>) -> Self {
        Self {
            registered: true,
            initialized: descriptor.is_initialized(),
            state: Some(descriptor.state()),
            priority: Some(descriptor.priority()),
            required: descriptor.is_required(),
            dependencies: descriptor.dependencies().to_vec(),
            tier,
            last_error: descriptor.last_error().map(str::to_string),
            status: descriptor.instance().map(|instance| instance.status()),
        }
    }

    fn absent(tier: usize) -> Self {
        Self {
            registered: false,
            initialized: false,
            state: None,
            priority: None,
            required: false,
            dependencies: Vec::new(),
            tier: Some(tier),
            last_error: None,
            status: None,
        }
    }
}

impl KernelStatus {
    pub fn collect(kernel: &Kernel) -> Self {
        let tiers = kernel.tiers();
        let mut modules: BTreeMap<String, ModuleReport> = kernel
            .registry()
            .iter()
            .map(|descriptor| {
                let report = ModuleReport::registered(descriptor, tiers.tier_of(descriptor.name()));
                (descriptor.name().to_string(), report)
            })
            .collect();

        for (index, tier) in tiers.tiers().iter().enumerate() {
            for name in tier {
                modules
                    .entry(name.clone())
                    .or_insert_with(|| ModuleReport::absent(index));
            }
        }

        Self {
            initialized: kernel.is_initialized(),
            state: kernel.state(),
            version: kernel.version().to_string(),
            environment: kernel.environment().to_string(),
            modules,
            failures: kernel.failures().to_vec(),
        }
    }

    pub fn module(&self, name: &str) -> Option<&ModuleReport> {
        self.modules.get(name)
    }

    /// Names of modules currently initialized
    pub fn initialized_modules(&self) -> Vec<&str> {
        self.modules
            .iter()
            .filter(|(_, report)| report.initialized)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
