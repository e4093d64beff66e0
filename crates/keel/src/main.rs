mod cli; // Declare the cli module

use std::process::ExitCode;
use std::sync::PoisonError;

use clap::Parser;
use keel_core::config::FileConfigSource;
use keel_core::kernel::{Kernel, KernelBuilder, KernelStatus};
use log::{error, info};
use tracing_subscriber::EnvFilter;

use crate::cli::{CliArgs, Commands};

/// Route `log` records through a `tracing` fmt subscriber on stderr
fn init_tracing(filter: Option<&str>) {
    if let Err(e) = tracing_log::LogTracer::init() {
        eprintln!("Failed to bridge log records: {}", e);
    }
    let filter = filter
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to install tracing subscriber: {}", e);
    }
}

fn print_status(status: &KernelStatus, compact: bool) {
    let rendered = if compact {
        serde_json::to_string(status)
    } else {
        serde_json::to_string_pretty(status)
    };
    match rendered {
        Ok(text) => println!("{}", text),
        Err(e) => eprintln!("Failed to render status: {}", e),
    }
}

fn print_modules(status: &KernelStatus) {
    for (name, report) in &status.modules {
        let state = match report.state {
            Some(state) => state.as_str(),
            None => "unregistered",
        };
        let kind = if report.required { "required" } else { "optional" };
        let dependencies = if report.dependencies.is_empty() {
            "-".to_string()
        } else {
            report.dependencies.join(",")
        };
        println!("{:<12} {:<13} {:<9} {}", name, state, kind, dependencies);
    }
}

fn main() -> ExitCode {
    // Parse command-line arguments
    let args = CliArgs::parse();

    // Handle simple ping command
    if args.ping {
        println!("pong");
        return ExitCode::SUCCESS;
    }

    init_tracing(args.log_filter.as_deref());

    let mut builder = KernelBuilder::new().runtime_overrides(args.runtime_overrides());
    if let Some(path) = &args.config {
        builder = builder.deployment_source(FileConfigSource::new(path));
    }

    let shared = match Kernel::claim_process(builder) {
        Ok(shared) => shared,
        Err(e) => {
            eprintln!("Failed to build kernel: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let mut kernel = shared.lock().unwrap_or_else(PoisonError::into_inner);

    let bootstrap = kernel.initialize();
    let status = kernel.status();
    match args.command.unwrap_or(Commands::Status { compact: false }) {
        Commands::Status { compact } => print_status(&status, compact),
        Commands::Modules => print_modules(&status),
    }

    let mut code = ExitCode::SUCCESS;
    if let Err(e) = bootstrap {
        eprintln!("Bootstrap aborted: {}", e);
        code = ExitCode::FAILURE;
    } else {
        info!("Kernel up: {} modules initialized", status.initialized_modules().len());
    }

    if let Err(e) = kernel.shutdown() {
        error!("Shutdown incomplete: {}", e);
    }
    code
}
