use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use serde_json::{json, Value};

use crate::config::ConfigData;
use crate::kernel::constants::{CACHE_MODULE, LOGGER_MODULE};
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{LogLevel, LogSink, Module, ModuleBase, ModuleConfig, ModuleStatus};
use crate::modules::logger::LoggingModule;

const DEFAULT_MAX_ENTRIES: usize = 1024;

#[derive(Debug, Default)]
struct Store {
    values: HashMap<String, Value>,
    /// Insertion order, oldest first, for eviction
    order: VecDeque<String>,
}

/// Bounded in-memory key/value cache.
///
/// Once `max_entries` is reached the oldest key is evicted. Depends on the
/// logger module for eviction and flush notices.
#[derive(Debug)]
pub struct CacheModule {
    base: ModuleBase,
    store: Mutex<Store>,
    max_entries: Mutex<usize>,
    logger: RwLock<Option<Arc<LoggingModule>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl CacheModule {
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(),
            store: Mutex::new(Store::default()),
            max_entries: Mutex::new(DEFAULT_MAX_ENTRIES),
            logger: RwLock::new(None),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn default_settings() -> Value {
        json!({ "max_entries": DEFAULT_MAX_ENTRIES })
    }

    pub fn get(&self, key: &str) -> Option<Value> {
        let store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        match store.values.get(key) {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or replace a value, evicting the oldest entry when full
    pub fn set(&self, key: impl Into<String>, value: Value) {
        let key = key.into();
        let max_entries = self.max_entries();
        let mut evicted = Vec::new();
        {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            if store.values.insert(key.clone(), value).is_none() {
                store.order.push_back(key);
            }
            while store.values.len() > max_entries {
                let Some(oldest) = store.order.pop_front() else {
                    break;
                };
                store.values.remove(&oldest);
                evicted.push(oldest);
            }
        }

        for key in evicted {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.notify(&format!("evicted '{}'", key), LogLevel::Debug);
        }
    }

    pub fn delete(&self, key: &str) -> bool {
        let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
        let removed = store.values.remove(key).is_some();
        if removed {
            store.order.retain(|k| k != key);
        }
        removed
    }

    pub fn flush(&self) {
        let flushed = {
            let mut store = self.store.lock().unwrap_or_else(PoisonError::into_inner);
            let count = store.values.len();
            store.values.clear();
            store.order.clear();
            count
        };
        self.notify(&format!("flushed {} entries", flushed), LogLevel::Info);
    }

    pub fn len(&self) -> usize {
        self.store.lock().unwrap_or_else(PoisonError::into_inner).values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_entries(&self) -> usize {
        *self.max_entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn notify(&self, text: &str, level: LogLevel) {
        if let Some(logger) = self.logger.read().unwrap_or_else(PoisonError::into_inner).as_ref() {
            logger.log_message(text, CACHE_MODULE, level);
        }
    }

    fn apply_settings(&self, settings: &ConfigData) -> Result<(), ModuleError> {
        let max_entries = match settings.get_path("max_entries") {
            None => DEFAULT_MAX_ENTRIES,
            Some(value) => value
                .as_u64()
                .filter(|n| *n > 0)
                .map(|n| n as usize)
                .ok_or_else(|| ModuleError::InvalidConfig {
                    key: "max_entries".to_string(),
                    reason: format!("expected a positive integer, got {}", value),
                })?,
        };
        *self.max_entries.lock().unwrap_or_else(PoisonError::into_inner) = max_entries;
        Ok(())
    }
}

impl Default for CacheModule {
    fn default() -> Self {
        Self::new()
    }
}

impl Module for CacheModule {
    fn name(&self) -> &str {
        CACHE_MODULE
    }

    fn initialize(&self, config: ModuleConfig) -> Result<(), ModuleError> {
        self.base.initialize_once(config, |dispatched| {
            self.apply_settings(&dispatched.settings)?;
            let logger = dispatched.dependency_as::<LoggingModule>(LOGGER_MODULE)?;
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
            self.notify(&e.to_string(), LogLevel::Warn);
        }
    }

    fn is_initialized(&self) -> bool {
        self.base.is_initialized()
    }

    fn status(&self) -> ModuleStatus {
        ModuleStatus::new(self.is_initialized())
            .with("entries", self.len())
            .with("max_entries", self.max_entries())
            .with("hits", self.hits.load(Ordering::Relaxed))
            .with("misses", self.misses.load(Ordering::Relaxed))
            .with("evictions", self.evictions.load(Ordering::Relaxed))
    }

    fn shutdown(&self) -> Result<(), ModuleError> {
        self.flush();
        self.base.reset();
        Ok(())
    }
}
