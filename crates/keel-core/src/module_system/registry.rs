use std::collections::{HashMap, HashSet};

use crate::module_system::descriptor::{ModuleDescriptor, ModuleRegistration, ModuleState};
use crate::module_system::error::ModuleSystemError;
use crate::module_system::traits::ModuleHandle;

/// Registry mapping module names to their descriptors
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    /// Registered modules
    modules: HashMap<String, ModuleDescriptor>,
    /// Names in registration order
    order: Vec<String>,
    /// Names a dependency may refer to before they are registered (the built-in catalog)
    catalog_names: HashSet<String>,
}

impl ModuleRegistry {
    /// Create an empty registry with no catalog names
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty registry that accepts forward references to `catalog_names`
    pub fn with_catalog_names<I, S>(catalog_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            catalog_names: catalog_names.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Register a module.
    ///
    /// Validation happens before anything is stored, so a failed
    /// registration leaves the registry untouched. Returns the registry for
    /// chained calls.
    pub fn register(&mut self, registration: ModuleRegistration) -> Result<&mut Self, ModuleSystemError> {
        let name = registration.name().to_string();

        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ModuleSystemError::InvalidModule {
                name,
                reason: "module names must be non-empty and contain no whitespace".to_string(),
            });
        }

        if self.modules.contains_key(&name) {
            return Err(ModuleSystemError::DuplicateModule { name });
        }

        if let Some(unknown) = registration
            .dependencies()
            .iter()
            .find(|dep| !self.is_known(dep))
        {
            return Err(ModuleSystemError::UnknownDependency {
                module: name,
                dependency: unknown.clone(),
            });
        }

        log::debug!(
            "Registering module '{}' (required: {}, priority: {}, dependencies: {:?})",
            name,
            registration.is_required(),
            registration.priority,
            registration.dependencies()
        );
        self.modules
            .insert(name.clone(), ModuleDescriptor::from_registration(registration));
        self.order.push(name);
        Ok(self)
    }

    /// Whether `name` is registered or reserved by the catalog
    pub fn is_known(&self, name: &str) -> bool {
        self.modules.contains_key(name) || self.catalog_names.contains(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&ModuleDescriptor> {
        self.modules.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut ModuleDescriptor> {
        self.modules.get_mut(name)
    }

    pub fn state(&self, name: &str) -> Option<ModuleState> {
        self.modules.get(name).map(ModuleDescriptor::state)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.modules
            .get(name)
            .is_some_and(ModuleDescriptor::is_initialized)
    }

    /// Handle of an initialized module. Never constructs or initializes anything.
    pub fn initialized_handle(&self, name: &str) -> Option<ModuleHandle> {
        self.modules
            .get(name)
            .filter(|descriptor| descriptor.is_initialized())
            .and_then(|descriptor| descriptor.instance().cloned())
    }

    /// Registered names in registration order
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Descriptors in registration order
    pub fn iter(&self) -> impl Iterator<Item = &ModuleDescriptor> {
        self.order.iter().filter_map(|name| self.modules.get(name))
    }

    pub fn catalog_names(&self) -> &HashSet<String> {
        &self.catalog_names
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn initialized_count(&self) -> usize {
        self.modules.values().filter(|d| d.is_initialized()).count()
    }
}
