use std::fs::OpenOptions;
use std::sync::Mutex;

use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

/// When set, logs are appended to this file instead of stderr
pub const ENV_LOG_FILE: &str = "CHRONICLE_LOG_FILE";

pub fn init_tracing() -> Result<()> {
    init_tracing_with_default("info")
}

/// Install the global subscriber. `RUST_LOG` wins over `default_directive`.
pub fn init_tracing_with_default(default_directive: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    match std::env::var(ENV_LOG_FILE).ok().filter(|p| !p.is_empty()) {
        Some(log_path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("failed to open log file {log_path}"))?;

            builder
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("failed to install tracing subscriber: {e}"))
        }
        None => builder
            .with_writer(std::io::stderr)
            .try_init()
            .map_err(|e| anyhow!("failed to install tracing subscriber: {e}")),
    }
}
