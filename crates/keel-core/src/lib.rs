pub mod config;
pub mod kernel;
pub mod module_system;
pub mod modules;

// Re-export key public types/traits for easier use by the binary and module authors
pub use config::{ConfigData, ConfigSource, FileConfigSource, StaticConfigSource};
pub use kernel::error::Error as KernelError;
pub use kernel::{Kernel, KernelBuilder, KernelState, KernelStatus, SharedKernel};
pub use module_system::{
    Catalog, LogSink, Module, ModuleBase, ModuleConfig, ModuleError, ModuleHandle, ModuleRegistration,
    ModuleStatus, ModuleSystemError,
};

#[cfg(test)]
mod tests;
