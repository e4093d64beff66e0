use std::collections::VecDeque;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use log::LevelFilter;
use serde::Serialize;
use serde_json::{json, Value};

use crate::config::ConfigData;
use crate::kernel::constants::LOGGER_MODULE;
use crate::module_system::error::ModuleError;
use crate::module_system::traits::{LogLevel, LogSink, Module, ModuleBase, ModuleConfig, ModuleStatus};

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_MAX_ENTRIES: usize = 100;
const LOG_TARGET: &str = "keel::modules";

/// One entry in the logger's recent-history ring
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    pub level: String,
    pub category: String,
    pub message: String,
}

/// Logging collaborator module.
///
/// Forwards to the `log` facade and keeps a bounded ring of recent entries
/// for introspection. Settings: `level` (`error`..`trace`, default `info`)
/// and `max_entries` (default 100).
#[derive(Debug)]
pub struct LoggingModule {
    base: ModuleBase,
    level: Mutex<LevelFilter>,
    max_entries: Mutex<usize>,
    recent: Mutex<VecDeque<LogEntry>>,
    errors_logged: AtomicU64,
    messages_logged: AtomicU64,
}

impl LoggingModule {
    pub fn new() -> Self {
        Self {
            base: ModuleBase::new(),
            level: Mutex::new(LevelFilter::Info),
            max_entries: Mutex::new(DEFAULT_MAX_ENTRIES),
            recent: Mutex::new(VecDeque::new()),
            errors_logged: AtomicU64::new(0),
            messages_logged: AtomicU64::new(0),
        }
    }

    /// Default settings contributed to the built-in configuration layer
    pub fn default_settings() -> Value {
        json!({ "level": DEFAULT_LEVEL, "max_entries": DEFAULT_MAX_ENTRIES })
    }

    /// Most recent entries, oldest first
    pub fn recent_entries(&self) -> Vec<LogEntry> {
        self.recent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .cloned()
            .collect()
    }

    pub fn level(&self) -> LevelFilter {
        *self.level.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn apply_settings(&self, settings: &ConfigData) -> Result<(), ModuleError> {
        let level_str = settings.get::<String>("level").unwrap_or_else(|| DEFAULT_LEVEL.to_string());
        let level = LevelFilter::from_str(&level_str).map_err(|_| ModuleError::InvalidConfig {
            key: "level".to_string(),
            reason: format!("unknown log level '{}'", level_str),
        })?;
        let max_entries = settings.get::<usize>("max_entries").unwrap_or(DEFAULT_MAX_ENTRIES);

        *self.level.lock().unwrap_or_else(PoisonError::into_inner) = level;
        *self.max_entries.lock().unwrap_or_else(PoisonError::into_inner) = max_entries;
        Ok(())
    }

    fn remember(&self, level: LogLevel, category: &str, message: String) {
        let max_entries = *self.max_entries.lock().unwrap_or_else(PoisonError::into_inner);
        let mut recent = self.recent.lock().unwrap_or_else(PoisonError::into_inner);
        recent.push_back(LogEntry {
            level: level.as_str().to_lowercase(),
            category: category.to_string(),
            message,
        });
        while recent.len() > max_entries {
            recent.pop_front();
        }
    }
}

impl Default for LoggingModule {
    fn default() -> Self {
        Self::new()
    }
}

impl LogSink for LoggingModule {
    fn log_error(&self, code: &str, context: &Value) {
        self.errors_logged.fetch_add(1, Ordering::Relaxed);
        log::error!(target: LOG_TARGET, "[{}] {}", code, context);
        self.remember(LogLevel::Error, code, context.to_string());
    }

    fn log_message(&self, text: &str, category: &str, level: LogLevel) {
        if level > self.level() {
            return;
        }
        self.messages_logged.fetch_add(1, Ordering::Relaxed);
        log::log!(target: LOG_TARGET, level, "[{}] {}", category, text);
        self.remember(level, category, text.to_string());
    }
}

impl Module for LoggingModule {
    fn name(&self) -> &str {
        LOGGER_MODULE
    }

    fn initialize(&self, config: ModuleConfig) -> Result<(), ModuleError> {
        self.base
            .initialize_once(config, |dispatched| self.apply_settings(&dispatched.settings))?;
        Ok(())
    }

    fn config(&self) -> ConfigData {
        self.base.config()
    }

    fn update_config(&self, partial: &ConfigData) {
        self.base.update_config(partial);
        if let Err(e) = self.apply_settings(&self.base.config()) {
            self.log_error("invalid_config", &json!({ "module": LOGGER_MODULE, "message": e.to_string() }));
        }
    }

    fn is_initialized(&self) -> bool {
        self.base.is_initialized()
    }

    fn status(&self) -> ModuleStatus {
        ModuleStatus::new(self.is_initialized())
            .with("level", self.level().to_string().to_lowercase())
            .with("errors_logged", self.errors_logged.load(Ordering::Relaxed))
            .with("messages_logged", self.messages_logged.load(Ordering::Relaxed))
            .with("buffered_entries", self.recent.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    fn as_log_sink(&self) -> Option<&dyn LogSink> {
        Some(self)
    }
}
