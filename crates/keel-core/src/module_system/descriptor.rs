use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::config::ConfigData;
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{Module, ModuleFactory, ModuleHandle};

/// Lifecycle state of a registered module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleState {
    Registered,
    Initializing,
    Initialized,
    /// Terminal. The module is treated as absent from here on.
    InitFailed,
}

impl ModuleState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleState::Registered => "registered",
            ModuleState::Initializing => "initializing",
            ModuleState::Initialized => "initialized",
            ModuleState::InitFailed => "init_failed",
        }
    }
}

impl fmt::Display for ModuleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a caller supplies to register a module.
///
/// ```
/// use keel_core::module_system::ModuleRegistration;
/// use keel_core::modules::CacheModule;
///
/// let registration = ModuleRegistration::new("cache", CacheModule::new)
///     .depends_on(["logger"])
///     .priority(10);
/// assert!(!registration.is_required());
/// ```
#[derive(Clone)]
pub struct ModuleRegistration {
    pub(crate) name: String,
    pub(crate) factory: ModuleFactory,
    pub(crate) dependencies: Vec<String>,
    pub(crate) required: bool,
    pub(crate) priority: i32,
    pub(crate) config: ConfigData,
}

impl ModuleRegistration {
    /// Register a module built by an infallible constructor
    pub fn new<M, F>(name: impl Into<String>, constructor: F) -> Self
    where
        M: Module,
        F: Fn() -> M + Send + Sync + 'static,
    {
        let factory: ModuleFactory = Arc::new(move || Ok(Arc::new(constructor()) as ModuleHandle));
        Self::with_factory(name, factory)
    }

    /// Register a module built by a fallible factory
    pub fn with_factory(name: impl Into<String>, factory: ModuleFactory) -> Self {
        Self {
            name: name.into(),
            factory,
            dependencies: Vec::new(),
            required: false,
            priority: 0,
            config: ConfigData::new(),
        }
    }

    /// Declare dependencies. Order is kept, duplicates are dropped.
    pub fn depends_on<I, S>(mut self, dependencies: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for dependency in dependencies {
            let dependency = dependency.into();
            if !self.dependencies.contains(&dependency) {
                self.dependencies.push(dependency);
            }
        }
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Lower runs first among modules outside the tier table
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    /// Registration-level settings, overridden by the composed configuration
    pub fn config(mut self, config: ConfigData) -> Self {
        self.config = config;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl fmt::Debug for ModuleRegistration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleRegistration")
            .field("name", &self.name)
            .field("dependencies", &self.dependencies)
            .field("required", &self.required)
            .field("priority", &self.priority)
            .finish_non_exhaustive()
    }
}

/// Registry record for one module
pub struct ModuleDescriptor {
    name: String,
    factory: ModuleFactory,
    priority: i32,
    dependencies: Vec<String>,
    required: bool,
    config: ConfigData,
    instance: Option<ModuleHandle>,
    state: ModuleState,
    last_error: Option<String>,
}

impl ModuleDescriptor {
    pub(crate) fn from_registration(registration: ModuleRegistration) -> Self {
        Self {
            name: registration.name,
            factory: registration.factory,
            priority: registration.priority,
            dependencies: registration.dependencies,
            required: registration.required,
            config: registration.config,
            instance: None,
            state: ModuleState::Registered,
            last_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn priority(&self) -> i32 {
        self.priority
    }

    pub fn dependencies(&self) -> &[String] {
        &self.dependencies
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == ModuleState::Initialized
    }

    /// The constructed instance, if the factory has run
    pub fn instance(&self) -> Option<&ModuleHandle> {
        self.instance.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Return the singleton instance, running the factory on first use.
    /// The instance is never replaced once set.
    pub(crate) fn instance_or_construct(&mut self) -> Result<ModuleHandle, ModuleError> {
        if let Some(instance) = &self.instance {
            return Ok(instance.clone());
        }

        let instance = (self.factory)()?;
        if instance.name() != self.name {
            return Err(ModuleError::NameMismatch {
                expected: self.name.clone(),
                actual: instance.name().to_string(),
            });
        }
        log::debug!("Constructed instance for module '{}'", self.name);
        self.instance = Some(instance.clone());
        Ok(instance)
    }

    pub(crate) fn set_state(&mut self, state: ModuleState) {
        self.state = state;
    }

    pub(crate) fn record_failure(&mut self, message: String) {
        self.state = ModuleState::InitFailed;
        self.last_error = Some(message);
    }
}

impl fmt::Debug for ModuleDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("dependencies", &self.dependencies)
            .field("required", &self.required)
            .field("state", &self.state)
            .field("constructed", &self.instance.is_some())
            .finish()
    }
}
