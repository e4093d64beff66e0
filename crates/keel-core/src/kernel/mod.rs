//! # Keel Core Kernel
//!
//! The `kernel` module is the orchestrator of `keel-core`. It owns the
//! module registry, composes configuration, drives initialization and
//! supervises failures.
//!
//! ## Key Responsibilities & Components:
//!
//! - **Bootstrapping**: [`KernelBuilder`](bootstrap::KernelBuilder) composes the
//!   configuration layers and registers the built-in catalog;
//!   [`Kernel`](bootstrap::Kernel) initializes, serves and shuts down modules.
//!   [`Kernel::claim_process`](bootstrap::Kernel::claim_process) guards the
//!   one-per-process instance.
//! - **Failure Supervision**: [`FailureSupervisor`](supervisor::FailureSupervisor)
//!   routes failures to the logging module, or to stderr when it is down.
//! - **Status Reporting**: [`KernelStatus`](status::KernelStatus), a
//!   serializable snapshot that never triggers initialization.
//! - **Core Constants**: names of the built-in modules and application metadata.
//! - **Error Handling**: [`Error`](error::Error) and a `Result` alias.
pub mod bootstrap;
pub mod constants;
pub mod error;
pub mod status;
pub mod supervisor;

pub use bootstrap::{Kernel, KernelBuilder, KernelState, SharedKernel};
pub use error::{Error, KernelLifecyclePhase, Result};
pub use status::{KernelStatus, ModuleReport};
pub use supervisor::{FailureRecord, FailureSupervisor};

// Test module declaration
#[cfg(test)]
mod tests;
