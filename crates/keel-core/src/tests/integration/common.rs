#![cfg(test)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use crate::config::ConfigData;
use crate::module_system::descriptor::ModuleRegistration;
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{
    LogLevel, LogSink, Module, ModuleBase, ModuleConfig, ModuleFactory, ModuleHandle, ModuleStatus,
};

// ===== PROBE =====

#[derive(Debug, Default)]
struct ProbeLog {
    events: Vec<String>,
    init_calls: HashMap<String, usize>,
    settings: HashMap<String, ConfigData>,
    dependencies: HashMap<String, Vec<String>>,
    constructed: HashMap<String, usize>,
}

/// Shared recorder the mock modules write into
#[derive(Debug, Clone, Default)]
pub struct Probe {
    inner: Arc<Mutex<ProbeLog>>,
}

impl Probe {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, event: String) {
        self.inner.lock().unwrap().events.push(event);
    }

    /// Every recorded event, e.g. `init:logger`, `shutdown:cache`, `error:cyclic_dependency`
    pub fn events(&self) -> Vec<String> {
        self.inner.lock().unwrap().events.clone()
    }

    /// Module names in the order their `initialize` succeeded
    pub fn init_order(&self) -> Vec<String> {
        self.events_with_prefix("init:")
    }

    pub fn shutdown_order(&self) -> Vec<String> {
        self.events_with_prefix("shutdown:")
    }

    /// Codes received through `LogSink::log_error`
    pub fn logged_errors(&self) -> Vec<String> {
        self.events_with_prefix("error:")
    }

    fn events_with_prefix(&self, prefix: &str) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    /// Raw calls to `initialize`, including no-op repeats
    pub fn init_calls(&self, name: &str) -> usize {
        self.inner.lock().unwrap().init_calls.get(name).copied().unwrap_or(0)
    }

    pub fn constructed(&self, name: &str) -> usize {
        self.inner.lock().unwrap().constructed.get(name).copied().unwrap_or(0)
    }

    /// Settings dispatched to the module's first `initialize`
    pub fn settings(&self, name: &str) -> Option<ConfigData> {
        self.inner.lock().unwrap().settings.get(name).cloned()
    }

    /// Dependency handles dispatched to the module's first `initialize`
    pub fn dependencies(&self, name: &str) -> Option<Vec<String>> {
        self.inner.lock().unwrap().dependencies.get(name).cloned()
    }
}

// ===== MOCK MODULE =====

/// How a [`MockModule`] misbehaves
#[derive(Debug, Clone, Copy, Default)]
pub struct Behavior {
    pub fail_init: bool,
    pub fail_construct: bool,
    pub fail_shutdown: bool,
    /// Answer `as_log_sink` with itself
    pub log_sink: bool,
}

impl Behavior {
    pub fn failing() -> Self {
        Self {
            fail_init: true,
            ..Self::default()
        }
    }

    pub fn sink() -> Self {
        Self {
            log_sink: true,
            ..Self::default()
        }
    }
}

/// Module that records every lifecycle call into a [`Probe`]
pub struct MockModule {
    name: String,
    base: ModuleBase,
    probe: Probe,
    behavior: Behavior,
}

impl MockModule {
    pub fn new(name: &str, probe: Probe, behavior: Behavior) -> Self {
        {
            let mut log = probe.inner.lock().unwrap();
            *log.constructed.entry(name.to_string()).or_insert(0) += 1;
        }
        Self {
            name: name.to_string(),
            base: ModuleBase::new(),
            probe,
            behavior,
        }
    }
}

impl Module for MockModule {
    fn name(&self) -> &str {
        &self.name
    }

    fn initialize(&self, config: ModuleConfig) -> Result<(), ModuleError> {
        {
            let mut log = self.probe.inner.lock().unwrap();
            *log.init_calls.entry(self.name.clone()).or_insert(0) += 1;
            log.settings
                .entry(self.name.clone())
                .or_insert_with(|| config.settings.clone());
            log.dependencies
                .entry(self.name.clone())
                .or_insert_with(|| config.dependencies.keys().cloned().collect());
        }

        if self.behavior.fail_init {
            return Err(ModuleError::InitFailed(format!("{} refused to start", self.name)));
        }
        let first = self.base.initialize_once(config, |_| Ok(()))?;
        if first {
            self.probe.record(format!("init:{}", self.name));
        }
        Ok(())
    }

    fn config(&self) -> ConfigData {
        self.base.config()
    }

    fn update_config(&self, partial: &ConfigData) {
        self.base.update_config(partial);
    }

    fn is_initialized(&self) -> bool {
        self.base.is_initialized()
    }

    fn status(&self) -> ModuleStatus {
        ModuleStatus::new(self.is_initialized()).with("mock", true)
    }

    fn shutdown(&self) -> Result<(), ModuleError> {
        self.probe.record(format!("shutdown:{}", self.name));
        self.base.reset();
        if self.behavior.fail_shutdown {
            return Err(ModuleError::ShutdownFailed(format!("{} hung", self.name)));
        }
        Ok(())
    }

    fn as_log_sink(&self) -> Option<&dyn LogSink> {
        if self.behavior.log_sink {
            Some(self)
        } else {
            None
        }
    }
}

impl LogSink for MockModule {
    fn log_error(&self, code: &str, _context: &Value) {
        self.probe.record(format!("error:{}", code));
    }

    fn log_message(&self, text: &str, category: &str, _level: LogLevel) {
        self.probe.record(format!("message:{}:{}", category, text));
    }
}

// ===== REGISTRATION HELPERS =====

/// Registration for a well-behaved mock
pub fn mock(name: &str, probe: &Probe) -> ModuleRegistration {
    mock_with(name, probe, Behavior::default())
}

/// Registration for a mock whose `initialize` fails
pub fn failing_mock(name: &str, probe: &Probe) -> ModuleRegistration {
    mock_with(name, probe, Behavior::failing())
}

pub fn mock_with(name: &str, probe: &Probe, behavior: Behavior) -> ModuleRegistration {
    let module_name = name.to_string();
    let probe = probe.clone();
    let factory: ModuleFactory = Arc::new(move || {
        if behavior.fail_construct {
            return Err(ModuleError::InitFailed(format!("cannot construct {}", module_name)));
        }
        Ok(Arc::new(MockModule::new(&module_name, probe.clone(), behavior)) as ModuleHandle)
    });
    ModuleRegistration::with_factory(name, factory)
}

/// Registration whose factory builds a module reporting a different name
pub fn misnamed_mock(registered: &str, actual: &str, probe: &Probe) -> ModuleRegistration {
    let actual = actual.to_string();
    let probe = probe.clone();
    ModuleRegistration::new(registered, move || MockModule::new(&actual, probe.clone(), Behavior::default()))
}
