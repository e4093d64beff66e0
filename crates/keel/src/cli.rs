use std::path::PathBuf;

use clap::{Parser, Subcommand};
use keel_core::config::ConfigData;
use serde_json::Value;

/// Keel: a pluggable module host
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Simple ping command for testing
    #[arg(long)]
    pub ping: bool,

    /// Deployment configuration file (JSON, YAML or TOML)
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Runtime override, e.g. `modules.cache.max_entries=64`. Repeatable.
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_override)]
    pub overrides: Vec<(String, Value)>,

    /// Deployment environment reported by the kernel
    #[arg(long)]
    pub env: Option<String>,

    /// Log filter directives; falls back to RUST_LOG, then `warn`
    #[arg(long, value_name = "FILTER")]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commands {
    /// Bootstrap the kernel and print its status snapshot as JSON
    Status {
        /// Print on a single line
        #[arg(long)]
        compact: bool,
    },
    /// Bootstrap the kernel and list its modules
    Modules,
}

/// Parse `key=value`. The value is read as JSON when it parses, else as a string.
pub fn parse_override(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", raw))?;
    let key = key.trim();
    if key.is_empty() || key.split('.').any(str::is_empty) {
        return Err(format!("invalid key '{}'", key));
    }
    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((key.to_string(), value))
}

impl CliArgs {
    /// The runtime configuration layer built from `--set` and `--env`
    pub fn runtime_overrides(&self) -> ConfigData {
        let mut overrides = ConfigData::new();
        for (key, value) in &self.overrides {
            overrides.set_path(key, value.clone());
        }
        if let Some(env) = &self.env {
            overrides.set_path("kernel.environment", Value::String(env.clone()));
        }
        overrides
    }
}
