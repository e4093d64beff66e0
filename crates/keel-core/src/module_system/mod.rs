//! # Keel Core Module System
//!
//! Everything the kernel needs to host independently developed modules:
//! the contract a module implements, the registry that holds their
//! descriptors, and the scheduler that brings them up in dependency order.
//!
//! ## Key Submodules and Responsibilities:
//!
//! - **[`traits`]**: the [`Module`] contract, [`ModuleConfig`] dispatch
//!   configuration, [`ModuleStatus`], the [`LogSink`] capability and the
//!   [`ModuleBase`] helper for module authors.
//! - **[`descriptor`]**: [`ModuleRegistration`] (what a caller supplies) and
//!   [`ModuleDescriptor`] (the registry's record, holding the singleton
//!   instance and lifecycle [`ModuleState`]).
//! - **[`registry`]**: [`ModuleRegistry`], which validates names, rejects
//!   duplicates and unknown dependencies.
//! - **[`dependency`]**: [`DependencyGraph`] with colour-marking cycle detection.
//! - **[`tier`]**: the hand-authored [`TierTable`] and its placement check.
//! - **[`scheduler`]**: [`Scheduler`], tier-by-tier initialization that
//!   recurses into dependencies on demand and splits failures into fatal
//!   (required) and contained (optional).
//! - **[`catalog`]**: the built-in [`Catalog`] and default configuration layer.
//! - **[`error`]**: [`ModuleError`] and [`ModuleSystemError`].
pub mod catalog;
pub mod dependency;
pub mod descriptor;
pub mod error;
pub mod registry;
pub mod scheduler;
pub mod tier;
pub mod traits;

pub use catalog::{builtin_defaults, Catalog};
pub use dependency::DependencyGraph;
pub use descriptor::{ModuleDescriptor, ModuleRegistration, ModuleState};
pub use error::{InitFailureCause, ModuleError, ModuleSystemError};
pub use registry::ModuleRegistry;
pub use scheduler::Scheduler;
pub use tier::{TierTable, TierViolation};
pub use traits::{
    downcast_module, LogLevel, LogSink, Module, ModuleBase, ModuleConfig, ModuleFactory, ModuleHandle,
    ModuleStatus,
};

// Test module declaration
#[cfg(test)]
mod tests;
