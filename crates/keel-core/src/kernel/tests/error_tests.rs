use crate::config::ConfigError;
use crate::kernel::error::{Error, KernelLifecyclePhase};
use crate::module_system::error::{InitFailureCause, ModuleError, ModuleSystemError};

fn init_failure(required: bool) -> ModuleSystemError {
    let source = Box::new(InitFailureCause::Initialize(ModuleError::InitFailed("disk full".to_string())));
    if required {
        ModuleSystemError::RequiredModuleInitFailed {
            module: "store".to_string(),
            source,
        }
    } else {
        ModuleSystemError::OptionalModuleInitFailed {
            module: "store".to_string(),
            source,
        }
    }
}

#[test]
fn test_only_optional_failures_are_not_fatal() {
    assert!(Error::from(init_failure(true)).is_fatal());
    assert!(!Error::from(init_failure(false)).is_fatal());
    let unknown_format = ConfigError::LoadError {
        path: "x.ini".into(),
        message: "unknown format".to_string(),
        source: None,
    };
    assert!(Error::from(unknown_format).is_fatal());
    assert!(Error::lifecycle(KernelLifecyclePhase::Initialize, "nope").is_fatal());
}

#[test]
fn test_required_failure_message_names_module_and_cause() {
    let error = Error::from(init_failure(true));
    let message = error.to_string();

    assert!(message.contains("store"), "message was: {}", message);
    assert!(message.contains("disk full"), "message was: {}", message);
    assert_eq!(error.module_name(), Some("store"));
    assert_eq!(error.as_module_system().map(ModuleSystemError::code), Some("required_module_init_failed"));
}

#[test]
fn test_error_source_chain_reaches_module_error() {
    use std::error::Error as StdError;

    let error = init_failure(false);
    let cause = error.source().expect("init failures carry a cause");
    let root = cause.source().expect("cause wraps the module error");
    assert_eq!(root.to_string(), "Module initialization failed: disk full");
}

#[test]
fn test_lifecycle_error_display() {
    let error = Error::lifecycle(KernelLifecyclePhase::Shutdown, "modules failed to stop: a");
    assert_eq!(
        error.to_string(),
        "Kernel lifecycle error during Shutdown: modules failed to stop: a"
    );
}
