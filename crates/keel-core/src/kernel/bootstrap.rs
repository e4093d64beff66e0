use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::config::{compose, ConfigData, ConfigSource};
use crate::kernel::constants::{self, LOGGER_MODULE};
use crate::kernel::error::{Error, KernelLifecyclePhase, Result};
use crate::kernel::status::KernelStatus;
use crate::kernel::supervisor::{FailureRecord, FailureSupervisor};
use crate::module_system::catalog::{builtin_defaults, Catalog};
use crate::module_system::descriptor::{ModuleRegistration, ModuleState};
use crate::module_system::error::ModuleSystemError;
use crate::module_system::registry::ModuleRegistry;
use crate::module_system::scheduler::Scheduler;
use crate::module_system::tier::TierTable;
use crate::module_system::traits::{downcast_module, Module, ModuleHandle};

/// Set once the process-wide kernel has been claimed
static PROCESS_KERNEL_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Kernel shared between threads of a multi-threaded host
pub type SharedKernel = Arc<Mutex<Kernel>>;

/// Global kernel lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KernelState {
    Uninitialized,
    Initializing,
    /// Terminal for `initialize`: calling it again is a no-op
    Initialized,
    /// A fatal failure aborted bootstrap
    Failed,
    ShutDown,
}

/// Builds a [`Kernel`]: composes the configuration layers, then registers the catalog.
pub struct KernelBuilder {
    defaults: ConfigData,
    deployment_sources: Vec<Box<dyn ConfigSource>>,
    runtime_overrides: Vec<ConfigData>,
    catalog: Catalog,
    log_module: String,
}

impl KernelBuilder {
    pub fn new() -> Self {
        Self {
            defaults: builtin_defaults(),
            deployment_sources: Vec::new(),
            runtime_overrides: Vec::new(),
            catalog: Catalog::builtin(),
            log_module: LOGGER_MODULE.to_string(),
        }
    }

    /// Extra defaults, merged over the built-in defaults
    pub fn defaults(mut self, defaults: ConfigData) -> Self {
        self.defaults.merge(&defaults);
        self
    }

    /// Add a deployment-level layer. Sources are applied in the order added.
    pub fn deployment_source(mut self, source: impl ConfigSource + 'static) -> Self {
        self.deployment_sources.push(Box::new(source));
        self
    }

    /// Add a runtime layer; these win over every deployment layer
    pub fn runtime_overrides(mut self, overrides: ConfigData) -> Self {
        self.runtime_overrides.push(overrides);
        self
    }

    /// Replace the built-in catalog
    pub fn catalog(mut self, catalog: Catalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Module consulted by the failure supervisor as log sink
    pub fn log_module(mut self, name: impl Into<String>) -> Self {
        self.log_module = name.into();
        self
    }

    pub fn build(self) -> Result<Kernel> {
        log::info!("Building {} kernel v{}", constants::APP_NAME, constants::APP_VERSION);

        let mut layers = Vec::with_capacity(self.deployment_sources.len() + self.runtime_overrides.len());
        for source in &self.deployment_sources {
            match source.load()? {
                Some(layer) => {
                    log::debug!("Loaded configuration layer from {}", source.describe());
                    layers.push(layer);
                }
                None => log::debug!("Configuration source {} is absent, skipping", source.describe()),
            }
        }
        layers.extend(self.runtime_overrides);
        let config = compose(&self.defaults, &layers);

        let mut registry = ModuleRegistry::with_catalog_names(self.catalog.names());
        let mut supervisor = FailureSupervisor::new(self.log_module);
        for registration in self.catalog.entries() {
            if let Err(error) = registry.register(registration.clone()) {
                if registration.is_required() {
                    log::error!("Failed to register required module '{}': {}", registration.name(), error);
                    return Err(error.into());
                }
                log::warn!("Skipping optional module '{}': {}", registration.name(), error);
                supervisor.report(
                    &registry,
                    FailureRecord {
                        code: error.code().to_string(),
                        module: Some(registration.name().to_string()),
                        message: error.to_string(),
                        fatal: false,
                    },
                );
            }
        }

        Ok(Kernel {
            registry,
            tiers: self.catalog.tiers().clone(),
            config,
            supervisor,
            state: KernelState::Uninitialized,
            init_order: Vec::new(),
        })
    }
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// The module host.
///
/// Owns the registry, the composed configuration and the failure
/// supervisor. There is no `Clone` and no deserialization: a kernel is
/// built once and handed around by reference, or shared as a
/// [`SharedKernel`].
#[derive(Debug)]
pub struct Kernel {
    registry: ModuleRegistry,
    tiers: TierTable,
    config: ConfigData,
    supervisor: FailureSupervisor,
    state: KernelState,
    /// Names in the order they reached `Initialized`
    init_order: Vec<String>,
}

impl Kernel {
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    /// Kernel with the built-in catalog and default configuration
    pub fn new() -> Result<Self> {
        KernelBuilder::new().build()
    }

    /// Build the process-wide kernel.
    ///
    /// Succeeds once per process. Later calls fail with
    /// [`Error::UnsupportedOperation`]; a build error releases the claim.
    pub fn claim_process(builder: KernelBuilder) -> Result<SharedKernel> {
        if PROCESS_KERNEL_CLAIMED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            return Err(Error::UnsupportedOperation {
                operation: "claim_process".to_string(),
                reason: "the process kernel has already been created".to_string(),
            });
        }

        match builder.build() {
            Ok(kernel) => Ok(kernel.into_shared()),
            Err(e) => {
                PROCESS_KERNEL_CLAIMED.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    pub fn into_shared(self) -> SharedKernel {
        Arc::new(Mutex::new(self))
    }

    /// Register a caller-supplied module
    pub fn register(&mut self, registration: ModuleRegistration) -> Result<&mut Self> {
        if self.state == KernelState::ShutDown {
            return Err(Error::lifecycle(
                KernelLifecyclePhase::Build,
                format!("cannot register '{}' after shutdown", registration.name()),
            ));
        }
        self.registry.register(registration)?;
        Ok(self)
    }

    /// Bring up every module: tiers first, then the remaining modules by priority.
    ///
    /// A second call after success is a no-op. A required-module failure
    /// aborts the pass and leaves the kernel `Failed`; optional failures are
    /// reported and skipped.
    pub fn initialize(&mut self) -> Result<()> {
        match self.state {
            KernelState::Initialized => {
                log::debug!("Kernel already initialized");
                return Ok(());
            }
            KernelState::Uninitialized => {}
            other => {
                return Err(Error::lifecycle(
                    KernelLifecyclePhase::Initialize,
                    format!("cannot initialize a kernel in state {:?}", other),
                ));
            }
        }

        log::info!("Initializing modules...");
        self.state = KernelState::Initializing;
        for violation in self.tiers.violations(&self.registry) {
            log::warn!(
                "Module '{}' (tier {}) depends on '{}' placed in later tier {}",
                violation.module,
                violation.module_tier,
                violation.dependency,
                violation.dependency_tier
            );
        }

        let result = Scheduler::new(
            &mut self.registry,
            &self.config,
            &mut self.supervisor,
            &mut self.init_order,
        )
        .initialize_all(&self.tiers);

        match result {
            Ok(()) => {
                self.state = KernelState::Initialized;
                log::info!(
                    "Kernel initialized ({} of {} modules up)",
                    self.registry.initialized_count(),
                    self.registry.len()
                );
                Ok(())
            }
            Err(e) => {
                self.state = KernelState::Failed;
                log::error!("Kernel bootstrap aborted: {}", e);
                Err(e.into())
            }
        }
    }

    /// Initialize one module and its dependency chain
    pub fn initialize_module(&mut self, name: &str) -> Result<ModuleHandle> {
        self.ensure_not_shut_down(KernelLifecyclePhase::Initialize)?;
        let mut scheduler = Scheduler::new(
            &mut self.registry,
            &self.config,
            &mut self.supervisor,
            &mut self.init_order,
        );
        scheduler.check_cycles_from(name)?;
        Ok(scheduler.initialize_module(name)?)
    }

    /// Handle to a module, initializing it (and its dependencies) on first access.
    ///
    /// Never-registered names and modules whose initialization already
    /// failed answer [`ModuleSystemError::ModuleNotFound`].
    pub fn get_module(&mut self, name: &str) -> Result<ModuleHandle> {
        if !self.registry.contains(name) {
            return Err(ModuleSystemError::ModuleNotFound {
                name: name.to_string(),
            }
            .into());
        }
        if let Some(handle) = self.registry.initialized_handle(name) {
            return Ok(handle);
        }
        self.initialize_module(name)
    }

    /// Typed variant of [`get_module`](Kernel::get_module)
    pub fn get_module_as<T: Module>(&mut self, name: &str) -> Result<Arc<T>> {
        let handle = self.get_module(name)?;
        downcast_module::<T>(&handle).ok_or_else(|| {
            ModuleSystemError::TypeMismatch {
                name: name.to_string(),
                expected: std::any::type_name::<T>(),
            }
            .into()
        })
    }

    /// Handle to an already-initialized module. Never triggers initialization.
    pub fn try_module(&self, name: &str) -> Option<ModuleHandle> {
        self.registry.initialized_handle(name)
    }

    /// Snapshot of the kernel and every module
    pub fn status(&self) -> KernelStatus {
        KernelStatus::collect(self)
    }

    /// Shut down initialized modules in reverse initialization order.
    ///
    /// Every module is attempted; failures are reported and the first one is
    /// returned once all modules have been visited.
    pub fn shutdown(&mut self) -> Result<()> {
        if self.state == KernelState::ShutDown {
            return Ok(());
        }

        log::info!("Shutting down modules...");
        let mut failed = Vec::new();
        for name in std::mem::take(&mut self.init_order).into_iter().rev() {
            let Some(handle) = self.registry.initialized_handle(&name) else {
                continue;
            };
            log::debug!("Stopping module '{}'", name);
            if let Err(e) = handle.shutdown() {
                log::error!("Error stopping module '{}': {}", name, e);
                self.supervisor.report(
                    &self.registry,
                    FailureRecord {
                        code: "module_shutdown_failed".to_string(),
                        module: Some(name.clone()),
                        message: e.to_string(),
                        fatal: false,
                    },
                );
                failed.push(name.clone());
            }
            if let Some(descriptor) = self.registry.get_mut(&name) {
                descriptor.set_state(ModuleState::Registered);
            }
        }

        self.state = KernelState::ShutDown;
        log::info!("Module shutdown complete.");
        if failed.is_empty() {
            Ok(())
        } else {
            Err(Error::lifecycle(
                KernelLifecyclePhase::Shutdown,
                format!("modules failed to stop: {}", failed.join(", ")),
            ))
        }
    }

    fn ensure_not_shut_down(&self, phase: KernelLifecyclePhase) -> Result<()> {
        if self.state == KernelState::ShutDown {
            return Err(Error::lifecycle(phase, "kernel has been shut down"));
        }
        Ok(())
    }

    pub fn state(&self) -> KernelState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.state == KernelState::Initialized
    }

    /// The composed configuration
    pub fn config(&self) -> &ConfigData {
        &self.config
    }

    pub fn registry(&self) -> &ModuleRegistry {
        &self.registry
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn failures(&self) -> &[FailureRecord] {
        self.supervisor.failures()
    }

    pub fn supervisor(&self) -> &FailureSupervisor {
        &self.supervisor
    }

    /// Modules in the order they were initialized
    pub fn init_order(&self) -> &[String] {
        &self.init_order
    }

    /// `kernel.version` from the composed configuration
    pub fn version(&self) -> &str {
        self.config.get_str("kernel.version").unwrap_or(constants::APP_VERSION)
    }

    /// `kernel.environment` from the composed configuration
    pub fn environment(&self) -> &str {
        self.config
            .get_str("kernel.environment")
            .unwrap_or(constants::DEFAULT_ENVIRONMENT)
    }
}
