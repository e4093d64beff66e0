use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::ConfigData;
use crate::module_system::error::ModuleError;

/// Severity accepted by [`LogSink::log_message`]
pub use log::Level as LogLevel;

/// Shared handle to a live module instance
pub type ModuleHandle = Arc<dyn Module>;

/// Construction function registered alongside each module.
/// The registry calls it at most once per registration.
pub type ModuleFactory = Arc<dyn Fn() -> Result<ModuleHandle, ModuleError> + Send + Sync>;

/// Capability set every module implements.
///
/// The kernel only ever talks to modules through this trait. Methods take
/// `&self`; implementations keep their mutable state behind interior
/// mutability (see [`ModuleBase`]).
pub trait Module: Any + Send + Sync {
    /// Registered name of the module
    fn name(&self) -> &str;

    /// One-time initialization. A second call on an initialized module is a no-op.
    fn initialize(&self, config: ModuleConfig) -> Result<(), ModuleError>;

    /// Current effective configuration
    fn config(&self) -> ConfigData;

    /// Deep-merge `partial` into the current configuration
    fn update_config(&self, partial: &ConfigData);

    fn is_initialized(&self) -> bool;

    /// Structured health snapshot
    fn status(&self) -> ModuleStatus;

    /// Release resources. Called in reverse initialization order.
    fn shutdown(&self) -> Result<(), ModuleError> {
        Ok(())
    }

    /// Modules able to receive failure reports return themselves here.
    fn as_log_sink(&self) -> Option<&dyn LogSink> {
        None
    }
}

impl fmt::Debug for dyn Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module")
            .field("name", &self.name())
            .field("initialized", &self.is_initialized())
            .finish_non_exhaustive()
    }
}

/// Downcast a module handle to its concrete type.
pub fn downcast_module<T: Module>(handle: &ModuleHandle) -> Option<Arc<T>> {
    let any: Arc<dyn Any + Send + Sync> = handle.clone();
    any.downcast::<T>().ok()
}

/// Logging collaborator consumed by the failure supervisor.
pub trait LogSink: Send + Sync {
    /// Structured error report. `context` is a JSON object.
    fn log_error(&self, code: &str, context: &Value);

    fn log_message(&self, text: &str, category: &str, level: LogLevel);
}

/// Configuration dispatched to [`Module::initialize`]
#[derive(Clone, Default)]
pub struct ModuleConfig {
    /// The module's own settings, after layering
    pub settings: ConfigData,
    /// Live handles to every declared dependency, keyed by module name
    pub dependencies: BTreeMap<String, ModuleHandle>,
}

impl ModuleConfig {
    pub fn new(settings: ConfigData) -> Self {
        Self {
            settings,
            dependencies: BTreeMap::new(),
        }
    }

    pub fn with_dependency(mut self, name: impl Into<String>, handle: ModuleHandle) -> Self {
        self.dependencies.insert(name.into(), handle);
        self
    }

    pub fn dependency(&self, name: &str) -> Option<&ModuleHandle> {
        self.dependencies.get(name)
    }

    /// Typed access to a dependency handle
    pub fn dependency_as<T: Module>(&self, name: &str) -> Result<Arc<T>, ModuleError> {
        self.dependencies
            .get(name)
            .and_then(downcast_module::<T>)
            .ok_or_else(|| ModuleError::MissingDependency(name.to_string()))
    }
}

impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("settings", &self.settings)
            .field("dependencies", &self.dependencies.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Status snapshot returned by [`Module::status`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ModuleStatus {
    pub initialized: bool,
    /// Module-specific health and usage fields
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

impl ModuleStatus {
    pub fn new(initialized: bool) -> Self {
        Self {
            initialized,
            details: Map::new(),
        }
    }

    /// Add a detail field
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }
}

/// Shared lifecycle state for module implementations.
///
/// Holds the initialized flag and the effective configuration, and makes
/// [`initialize_once`](ModuleBase::initialize_once) idempotent under a lock.
#[derive(Debug, Default)]
pub struct ModuleBase {
    initialized: AtomicBool,
    config: RwLock<ConfigData>,
    init_lock: Mutex<()>,
}

impl ModuleBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from module-level default settings
    pub fn with_defaults(defaults: ConfigData) -> Self {
        Self {
            config: RwLock::new(defaults),
            ..Self::default()
        }
    }

    /// Run `init` exactly once.
    ///
    /// The dispatched settings are merged over the current configuration
    /// before `init` sees them. Returns `Ok(false)` when the module was
    /// already initialized. A failing `init` leaves the module uninitialized.
    pub fn initialize_once<F>(&self, config: ModuleConfig, init: F) -> Result<bool, ModuleError>
    where
        F: FnOnce(&ModuleConfig) -> Result<(), ModuleError>,
    {
        let _guard = self.init_lock.lock().unwrap_or_else(PoisonError::into_inner);
        if self.initialized.load(Ordering::SeqCst) {
            return Ok(false);
        }

        let mut effective = self.config();
        effective.merge(&config.settings);
        let dispatched = ModuleConfig {
            settings: effective.clone(),
            dependencies: config.dependencies,
        };

        init(&dispatched)?;

        *self.config.write().unwrap_or_else(PoisonError::into_inner) = effective;
        self.initialized.store(true, Ordering::SeqCst);
        Ok(true)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }

    pub fn config(&self) -> ConfigData {
        self.config.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn update_config(&self, partial: &ConfigData) {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .merge(partial);
    }

    /// Mark the module as no longer initialized (used by shutdown)
    pub fn reset(&self) {
        self.initialized.store(false, Ordering::SeqCst);
    }
}
