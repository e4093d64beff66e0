use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};

use crate::config::ConfigData;
use crate::kernel::constants::{LOGGER_MODULE, METRICS_MODULE};
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{LogLevel, LogSink, Module, ModuleBase, ModuleConfig, ModuleStatus};
use crate::modules::logger::LoggingModule;

/// Named counters.
///
/// With `enabled: false` every increment is dropped.
#[derive(Debug)]
pub struct MetricsModule {
    base: ModuleBase,
    enabled: AtomicBool,
    counters: Mutex<BTreeMap<String, u64>>,
    logger: RwLock<Option<Arc<LoggingModule>>>,
}

impl MetricsModule {
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(),
            enabled: AtomicBool::new(true),
            counters: Mutex::new(BTreeMap::new()),
            logger: RwLock::new(None),
        }
    }

    pub fn default_settings() -> Value {
        json!({ "enabled": true })
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    pub fn increment(&self, name: &str) {
        self.increment_by(name, 1);
    }

    pub fn increment_by(&self, name: &str, amount: u64) {
        if !self.is_enabled() {
            return;
        }
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = counters.entry(name.to_string()).or_insert(0);
        *counter = counter.saturating_add(amount);
    }

    /// Current value, zero for unknown counters
    pub fn get(&self, name: &str) -> u64 {
        self.counters
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .copied()
            .unwrap_or(0)
    }

    pub fn counters(&self) -> BTreeMap<String, u64> {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn reset(&self) {
        self.counters.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn apply_settings(&self, settings: &ConfigData) -> Result<(), ModuleError> {
        let enabled = match settings.get_path("enabled") {
            None => true,
            Some(Value::Bool(enabled)) => *enabled,
            Some(other) => {
                return Err(ModuleError::InvalidConfig {
                    key: "enabled".to_string(),
                    reason: format!("expected a boolean, got {}", other),
                })
            }
        };
        self.enabled.store(enabled, Ordering::SeqCst);
        Ok(())
    }
}

impl Default for MetricsModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for MetricsModule {
    fn name(&self) -> &str {
        METRICS_MODULE
    }

    fn initialize(&self, config: ModuleConfig) -> Result<(), ModuleError> {
        self.base.initialize_once(config, |dispatched| {
            self.apply_settings(&dispatched.settings)?;
            let logger = dispatched.dependency_as::<LoggingModule>(LOGGER_MODULE)?;
            if !self.is_enabled() {
                logger.log_message("metrics collection disabled", METRICS_MODULE, LogLevel::Info);
            }
            *self.logger.write().unwrap_or_else(PoisonError::into_inner) = Some(logger);
            Ok(())
        })?;
        Ok(())
    }

    fn config(&self) -> ConfigData {
        self.base.config()
    }

    fn update_config(&self, partial: &ConfigData) {
        self.base.update_config(partial);
        if let Err(e) = self.apply_settings(&self.base.config()) {
            if let Some(logger) = self.logger.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
                logger.log_message(&e.to_string(), METRICS_MODULE, LogLevel::Warn);
            }
        }
    }

    fn is_initialized(&self) -> bool {
        self.base.is_initialized()
    }

    fn status(&self) -> ModuleStatus {
        let counters = self.counters();
        ModuleStatus::new(self.is_initialized())
            .with("enabled", self.is_enabled())
            .with("counter_count", counters.len())
            .with("counters", json!(counters))
    }

    fn shutdown(&self) -> Result<(), ModuleError> {
        self.base.reset();
        Ok(())
    }
}
