use serde::Serialize;

use crate::module_system::registry::ModuleRegistry;

/// Ordered initialization tiers.
///
/// Tier 0 holds modules without dependencies, tier 1 modules that depend
/// only on tier 0, and so on. The table is authored by hand; the scheduler
/// still walks dependencies recursively, so a misplaced module only shows up
/// in [`TierTable::violations`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TierTable {
    tiers: Vec<Vec<String>>,
}

/// A dependency placed in a later tier than the module depending on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TierViolation {
    pub module: String,
    pub module_tier: usize,
    pub dependency: String,
    pub dependency_tier: usize,
}

impl TierTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_slices(tiers: &[&[&str]]) -> Self {
        Self {
            tiers: tiers
                .iter()
                .map(|tier| tier.iter().map(|name| name.to_string()).collect())
                .collect(),
        }
    }

    /// Append a tier after the existing ones
    pub fn push_tier<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tiers.push(names.into_iter().map(Into::into).collect());
        self
    }

    /// Add `name` to an existing tier. Out-of-range tiers and repeated names are ignored.
    pub fn insert(&mut self, tier: usize, name: &str) {
        if self.contains(name) {
            return;
        }
        if let Some(names) = self.tiers.get_mut(tier) {
            names.push(name.to_string());
        }
    }

    pub fn tiers(&self) -> &[Vec<String>] {
        &self.tiers
    }

    /// Index of the first tier listing `name`
    pub fn tier_of(&self, name: &str) -> Option<usize> {
        self.tiers
            .iter()
            .position(|tier| tier.iter().any(|n| n == name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tier_of(name).is_some()
    }

    /// All names in table order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.tiers.iter().flatten().map(String::as_str)
    }

    /// Check every registered module in the table against its dependencies' tiers.
    /// Dependencies missing from the table are not reported.
    pub fn violations(&self, registry: &ModuleRegistry) -> Vec<TierViolation> {
        let mut violations = Vec::new();
        for descriptor in registry.iter() {
            let Some(module_tier) = self.tier_of(descriptor.name()) else {
                continue;
            };
            for dependency in descriptor.dependencies() {
                if let Some(dependency_tier) = self.tier_of(dependency) {
                    if dependency_tier > module_tier {
                        violations.push(TierViolation {
                            module: descriptor.name().to_string(),
                            module_tier,
                            dependency: dependency.clone(),
                            dependency_tier,
                        });
                    }
                }
            }
        }
        violations
    }
}
