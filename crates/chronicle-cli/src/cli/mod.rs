mod commands;
mod config;

pub use commands::{execute, CliCommand, Session};
pub use config::{resolve_core_config, CliConfig};
