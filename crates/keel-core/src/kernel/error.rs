//! # Keel Core Kernel Errors
//!
//! Defines error types specific to the Keel kernel.
//!
//! [`Error`] aggregates the subsystem errors ([`ModuleSystemError`],
//! [`ConfigError`]) and adds the kernel's own lifecycle and singleton
//! failures. [`Error::is_fatal`] tells a host whether bootstrap was aborted.
use std::result::Result as StdResult;

use thiserror::Error as ThisError;

use crate::config::error::ConfigError;
use crate::module_system::error::ModuleSystemError;

/// Top-level error type of the kernel
#[derive(Debug, ThisError)]
pub enum Error {
    /// Registration, scheduling or lookup error
    #[error("Module system error: {0}")]
    ModuleSystem(#[from] ModuleSystemError),

    /// Configuration could not be loaded or composed
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Operation the kernel refuses, such as a second process claim
    #[error("Unsupported operation '{operation}': {reason}")]
    UnsupportedOperation { operation: String, reason: String },

    /// Error occurring during a specific kernel lifecycle phase.
    #[error("Kernel lifecycle error during {phase}: {message}")]
    KernelLifecycleError {
        phase: KernelLifecyclePhase,
        message: String,
    },
}

/// Represents a specific phase in the kernel's lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ThisError)]
pub enum KernelLifecyclePhase {
    #[error("Build")]
    Build,
    #[error("Initialize")]
    Initialize,
    #[error("Shutdown")]
    Shutdown,
}

/// Shorthand for Result with our Error type
pub type Result<T> = StdResult<T, Error>;

impl Error {
    pub fn lifecycle(phase: KernelLifecyclePhase, message: impl Into<String>) -> Self {
        Error::KernelLifecycleError {
            phase,
            message: message.into(),
        }
    }

    /// Whether the error aborted (or would abort) bootstrap.
    /// Only contained optional-module failures are not fatal.
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::ModuleSystem(e) => !e.is_contained(),
            _ => true,
        }
    }

    /// Module the error is about, if any
    pub fn module_name(&self) -> Option<&str> {
        match self {
            Error::ModuleSystem(e) => e.module_name(),
            _ => None,
        }
    }

    pub fn as_module_system(&self) -> Option<&ModuleSystemError> {
        match self {
            Error::ModuleSystem(e) => Some(e),
            _ => None,
        }
    }
}
