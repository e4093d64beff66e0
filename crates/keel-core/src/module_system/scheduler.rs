use std::collections::BTreeMap;

use crate::config::{module_section, ConfigData};
use crate::kernel::supervisor::FailureSupervisor;
use crate::module_system::dependency::DependencyGraph;
use crate::module_system::descriptor::ModuleState;
use crate::module_system::error::{InitFailureCause, ModuleSystemError};
use crate::module_system::registry::ModuleRegistry;
use crate::module_system::tier::TierTable;
use crate::module_system::traits::{ModuleConfig, ModuleHandle};

/// Drives module initialization over a registry.
///
/// Borrowed from the kernel for the duration of one initialization pass.
pub struct Scheduler<'a> {
    registry: &'a mut ModuleRegistry,
    config: &'a ConfigData,
    supervisor: &'a mut FailureSupervisor,
    /// Names in the order they reached `Initialized`
    init_order: &'a mut Vec<String>,
    /// Modules currently `Initializing`, outermost first
    stack: Vec<String>,
}

impl<'a> Scheduler<'a> {
    pub fn new(
        registry: &'a mut ModuleRegistry,
        config: &'a ConfigData,
        supervisor: &'a mut FailureSupervisor,
        init_order: &'a mut Vec<String>,
    ) -> Self {
        Self {
            registry,
            config,
            supervisor,
            init_order,
            stack: Vec::new(),
        }
    }

    /// Fail fast on any dependency cycle among registered modules
    pub fn check_cycles(&mut self) -> Result<(), ModuleSystemError> {
        match DependencyGraph::from_registry(self.registry).find_cycle() {
            Some(path) => Err(self.cycle_error(path)),
            None => Ok(()),
        }
    }

    /// Fail fast on a dependency cycle reachable from `name`
    pub fn check_cycles_from(&mut self, name: &str) -> Result<(), ModuleSystemError> {
        match DependencyGraph::from_registry(self.registry).find_cycle_from(name) {
            Some(path) => Err(self.cycle_error(path)),
            None => Ok(()),
        }
    }

    fn cycle_error(&mut self, path: Vec<String>) -> ModuleSystemError {
        let error = ModuleSystemError::CyclicDependency { path };
        self.supervisor.report_error(self.registry, &error);
        error
    }

    /// Initialize every tier in order, then any registered module outside the
    /// table ordered by `(priority, name)`.
    ///
    /// Contained failures are reported and skipped. The first fatal failure
    /// stops the pass and is returned.
    pub fn initialize_all(&mut self, tiers: &TierTable) -> Result<(), ModuleSystemError> {
        self.check_cycles()?;

        for (index, tier) in tiers.tiers().iter().enumerate() {
            log::debug!("Initializing tier {}: {:?}", index, tier);
            for name in tier {
                if !self.registry.contains(name) {
                    log::warn!("Module '{}' listed in tier {} is not registered, skipping", name, index);
                    continue;
                }
                self.initialize_pending(name)?;
            }
        }

        let mut remaining: Vec<(i32, String)> = self
            .registry
            .iter()
            .filter(|descriptor| !tiers.contains(descriptor.name()))
            .map(|descriptor| (descriptor.priority(), descriptor.name().to_string()))
            .collect();
        remaining.sort();
        for (_, name) in remaining {
            self.initialize_pending(&name)?;
        }

        Ok(())
    }

    /// Top-level step: skip modules that already settled, contain optional failures.
    ///
    /// A required module that failed before this pass (for example on lazy
    /// access) still aborts the pass.
    fn initialize_pending(&mut self, name: &str) -> Result<(), ModuleSystemError> {
        match self.registry.get(name).map(|d| (d.state(), d.is_required())) {
            Some((ModuleState::Initialized, _)) | Some((ModuleState::InitFailed, false)) => return Ok(()),
            Some((ModuleState::InitFailed, true)) => return Err(self.earlier_failure(name)),
            _ => {}
        }
        match self.initialize_module(name) {
            Ok(_) => Ok(()),
            Err(error) if error.is_contained() => {
                log::debug!("Continuing bootstrap after contained failure of '{}'", name);
                Ok(())
            }
            Err(error) => Err(error),
        }
    }

    /// Bring `name` and, first, its whole dependency chain to `Initialized`.
    ///
    /// Idempotent: an initialized module returns its handle without calling
    /// `initialize` again. A module that already failed is reported as
    /// [`ModuleSystemError::ModuleNotFound`].
    pub fn initialize_module(&mut self, name: &str) -> Result<ModuleHandle, ModuleSystemError> {
        let (state, dependencies) = match self.registry.get(name) {
            Some(descriptor) => (descriptor.state(), descriptor.dependencies().to_vec()),
            None => {
                return Err(ModuleSystemError::ModuleNotRegistered {
                    name: name.to_string(),
                })
            }
        };

        match state {
            ModuleState::Initialized => {
                return self.registry.initialized_handle(name).ok_or_else(|| {
                    ModuleSystemError::ModuleNotFound {
                        name: name.to_string(),
                    }
                });
            }
            ModuleState::InitFailed => {
                return Err(ModuleSystemError::ModuleNotFound {
                    name: name.to_string(),
                })
            }
            ModuleState::Initializing => {
                let start = self.stack.iter().position(|n| n == name).unwrap_or(0);
                let mut path = self.stack[start..].to_vec();
                path.push(name.to_string());
                return Err(self.cycle_error(path));
            }
            ModuleState::Registered => {}
        }

        self.set_state(name, ModuleState::Initializing);
        self.stack.push(name.to_string());
        log::debug!("Initializing module '{}'", name);

        // Dependencies first, recursing into any that are not up yet
        let mut handles = BTreeMap::new();
        for dependency in &dependencies {
            match self.initialize_module(dependency) {
                Ok(handle) => {
                    handles.insert(dependency.clone(), handle);
                }
                Err(source) => {
                    let cause = InitFailureCause::Dependency {
                        dependency: dependency.clone(),
                        source: Box::new(source),
                    };
                    return Err(self.fail(name, cause));
                }
            }
        }

        let constructed = match self.registry.get_mut(name) {
            Some(descriptor) => descriptor.instance_or_construct(),
            None => {
                return Err(ModuleSystemError::ModuleNotRegistered {
                    name: name.to_string(),
                })
            }
        };
        let handle = match constructed {
            Ok(handle) => handle,
            Err(e) => return Err(self.fail(name, InitFailureCause::Construction(e))),
        };

        let dispatch = ModuleConfig {
            settings: self.dispatch_settings(name),
            dependencies: handles,
        };
        if let Err(e) = handle.initialize(dispatch) {
            return Err(self.fail(name, InitFailureCause::Initialize(e)));
        }

        self.set_state(name, ModuleState::Initialized);
        self.stack.pop();
        self.init_order.push(name.to_string());
        log::info!("Module '{}' initialized", name);
        Ok(handle)
    }

    /// Registration settings overlaid with the composed `modules.<name>` branch
    fn dispatch_settings(&self, name: &str) -> ConfigData {
        let mut settings = self
            .registry
            .get(name)
            .map(|descriptor| descriptor.config().clone())
            .unwrap_or_default();
        settings.merge(&module_section(self.config, name));
        settings
    }

    fn set_state(&mut self, name: &str, state: ModuleState) {
        if let Some(descriptor) = self.registry.get_mut(name) {
            descriptor.set_state(state);
        }
    }

    /// Move `name` to `InitFailed`, classify the failure and report it
    fn fail(&mut self, name: &str, cause: InitFailureCause) -> ModuleSystemError {
        if self.stack.last().map(String::as_str) == Some(name) {
            self.stack.pop();
        }

        let required = self.is_required(name);
        if let Some(descriptor) = self.registry.get_mut(name) {
            descriptor.record_failure(cause.to_string());
        }

        let error = match cause {
            // A required module is down: that stays fatal whoever reached it first
            InitFailureCause::Dependency { dependency, source }
                if !required && self.is_required(&dependency) =>
            {
                log::debug!(
                    "Optional module '{}' stopped by failed required module '{}'",
                    name,
                    dependency
                );
                return match *source {
                    fatal @ (ModuleSystemError::RequiredModuleInitFailed { .. }
                    | ModuleSystemError::CyclicDependency { .. }) => fatal,
                    _ => self.earlier_failure(&dependency),
                };
            }
            cause if required => ModuleSystemError::RequiredModuleInitFailed {
                module: name.to_string(),
                source: Box::new(cause),
            },
            cause => ModuleSystemError::OptionalModuleInitFailed {
                module: name.to_string(),
                source: Box::new(cause),
            },
        };
        self.supervisor.report_error(self.registry, &error);
        error
    }

    fn is_required(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .is_some_and(|descriptor| descriptor.is_required())
    }

    /// Fatal error for a required module left `InitFailed` by an earlier attempt
    fn earlier_failure(&self, name: &str) -> ModuleSystemError {
        let recorded = self
            .registry
            .get(name)
            .and_then(|descriptor| descriptor.last_error())
            .unwrap_or("unknown cause")
            .to_string();
        ModuleSystemError::RequiredModuleInitFailed {
            module: name.to_string(),
            source: Box::new(InitFailureCause::Earlier(recorded)),
        }
    }
}
