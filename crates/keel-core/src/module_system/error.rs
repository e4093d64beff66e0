//! # Keel Core Module System Errors
//!
//! Defines the error types of the module system.
//!
//! - [`ModuleError`] is what an individual module returns from its own
//!   lifecycle methods.
//! - [`ModuleSystemError`] is raised by the registry and the scheduler. Its
//!   initialization variants carry an [`InitFailureCause`] and are split into
//!   a fatal kind ([`ModuleSystemError::RequiredModuleInitFailed`]) and a
//!   contained kind ([`ModuleSystemError::OptionalModuleInitFailed`]).

/// Error returned by a module implementation.
#[derive(Debug, thiserror::Error)]
pub enum ModuleError {
    #[error("Module initialization failed: {0}")]
    InitFailed(String),

    #[error("Invalid configuration value for '{key}': {reason}")]
    InvalidConfig { key: String, reason: String },

    #[error("Missing dependency handle '{0}'")]
    MissingDependency(String),

    #[error("Factory produced module '{actual}' for registration '{expected}'")]
    NameMismatch { expected: String, actual: String },

    #[error("Module shutdown failed: {0}")]
    ShutdownFailed(String),

    #[error(transparent)]
    Other(#[from] Box<dyn std::error::Error + Send + Sync>),
}

/// Why a module could not reach the `Initialized` state.
#[derive(Debug, thiserror::Error)]
pub enum InitFailureCause {
    #[error("construction failed: {0}")]
    Construction(#[source] ModuleError),

    #[error("initialize failed: {0}")]
    Initialize(#[source] ModuleError),

    /// The module failed during an earlier pass; carries the recorded error
    #[error("failed earlier: {0}")]
    Earlier(String),

    #[error("dependency '{dependency}' unavailable: {source}")]
    Dependency {
        dependency: String,
        #[source]
        source: Box<ModuleSystemError>,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ModuleSystemError {
    #[error("Invalid module '{name}': {reason}")]
    InvalidModule { name: String, reason: String },

    #[error("Module '{name}' is already registered")]
    DuplicateModule { name: String },

    #[error("Module '{module}' depends on unknown module '{dependency}'")]
    UnknownDependency { module: String, dependency: String },

    #[error("Module '{name}' is not registered")]
    ModuleNotRegistered { name: String },

    #[error("Module '{name}' not found")]
    ModuleNotFound { name: String },

    #[error("Module '{name}' is not of type {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    #[error("Circular module dependency detected: {}", .path.join(" -> "))]
    CyclicDependency { path: Vec<String> },

    #[error("Required module '{module}' failed to initialize, bootstrap aborted: {source}")]
    RequiredModuleInitFailed {
        module: String,
        #[source]
        source: Box<InitFailureCause>,
    },

    #[error("Optional module '{module}' failed to initialize: {source}")]
    OptionalModuleInitFailed {
        module: String,
        #[source]
        source: Box<InitFailureCause>,
    },
}

impl ModuleSystemError {
    /// Stable code used when reporting the error to a log sink.
    pub fn code(&self) -> &'static str {
        match self {
            ModuleSystemError::InvalidModule { .. } => "invalid_module",
            ModuleSystemError::DuplicateModule { .. } => "duplicate_module",
            ModuleSystemError::UnknownDependency { .. } => "unknown_dependency",
            ModuleSystemError::ModuleNotRegistered { .. } => "module_not_registered",
            ModuleSystemError::ModuleNotFound { .. } => "module_not_found",
            ModuleSystemError::TypeMismatch { .. } => "module_type_mismatch",
            ModuleSystemError::CyclicDependency { .. } => "cyclic_dependency",
            ModuleSystemError::RequiredModuleInitFailed { .. } => "required_module_init_failed",
            ModuleSystemError::OptionalModuleInitFailed { .. } => "optional_module_init_failed",
        }
    }

    /// Name of the module the error is about, if any.
    pub fn module_name(&self) -> Option<&str> {
        match self {
            ModuleSystemError::InvalidModule { name, .. }
            | ModuleSystemError::DuplicateModule { name }
            | ModuleSystemError::ModuleNotRegistered { name }
            | ModuleSystemError::ModuleNotFound { name }
            | ModuleSystemError::TypeMismatch { name, .. } => Some(name),
            ModuleSystemError::UnknownDependency { module, .. }
            | ModuleSystemError::RequiredModuleInitFailed { module, .. }
            | ModuleSystemError::OptionalModuleInitFailed { module, .. } => Some(module),
            ModuleSystemError::CyclicDependency { path } => path.first().map(String::as_str),
        }
    }

    /// Contained failures are logged and bootstrap continues.
    pub fn is_contained(&self) -> bool {
        matches!(self, ModuleSystemError::OptionalModuleInitFailed { .. })
    }
}
