use serde::Serialize;
use serde_json::{json, Value};

use crate::module_system::error::ModuleSystemError;
use crate::module_system::registry::ModuleRegistry;

/// One reported failure, kept for the status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureRecord {
    pub code: String,
    pub module: Option<String>,
    pub message: String,
    /// Fatal failures abort bootstrap; the rest were contained
    pub fatal: bool,
}

/// Routes failures to the logging module, or to stderr when it is unavailable.
///
/// The logging module is only used once it has reached `Initialized`, so a
/// broken or not-yet-started logger can never take the supervisor down with it.
#[derive(Debug)]
pub struct FailureSupervisor {
    log_module: String,
    ledger: Vec<FailureRecord>,
}

impl FailureSupervisor {
    pub fn new(log_module: impl Into<String>) -> Self {
        Self {
            log_module: log_module.into(),
            ledger: Vec::new(),
        }
    }

    /// Name of the module consulted as log sink
    pub fn log_module(&self) -> &str {
        &self.log_module
    }

    /// Report a module-system error
    pub fn report_error(&mut self, registry: &ModuleRegistry, error: &ModuleSystemError) {
        let record = FailureRecord {
            code: error.code().to_string(),
            module: error.module_name().map(str::to_string),
            message: error.to_string(),
            fatal: !error.is_contained(),
        };
        self.report(registry, record);
    }

    /// Report an arbitrary failure record
    pub fn report(&mut self, registry: &ModuleRegistry, record: FailureRecord) {
        let context = json!({
            "module": record.module,
            "message": record.message,
            "fatal": record.fatal,
        });

        match registry.initialized_handle(&self.log_module) {
            Some(handle) => match handle.as_log_sink() {
                Some(sink) => sink.log_error(&record.code, &context),
                None => Self::write_fallback(&record.code, &context),
            },
            None => Self::write_fallback(&record.code, &context),
        }

        self.ledger.push(record);
    }

    /// Bare process-level diagnostic
    fn write_fallback(code: &str, context: &Value) {
        eprintln!("[keel] {}: {}", code, context);
    }

    /// Every failure reported so far, oldest first
    pub fn failures(&self) -> &[FailureRecord] {
        &self.ledger
    }

    pub fn failures_for(&self, module: &str) -> impl Iterator<Item = &FailureRecord> {
        self.ledger
            .iter()
            .filter(move |record| record.module.as_deref() == Some(module))
    }
}
