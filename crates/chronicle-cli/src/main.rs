use std::io;
use std::path::PathBuf;

use chronicle_cli::cli::{execute, resolve_core_config, CliCommand, CliConfig};
use chronicle_core::tracing_setup::init_tracing_with_default;
use chronicle_core::EventBus;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "chronicle")]
#[command(about = "Browse and edit persisted chat history")]
struct Cli {
    /// Directory holding the history file
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    /// Path to JSON config file (dataDir, storageKey)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List history entries, oldest first
    List {
        /// Only show entries whose query or response contains this text
        #[arg(long, short = 's')]
        search: Option<String>,
    },

    /// Record a conversation turn
    Add {
        /// The user's message
        message: String,
        /// The model's response
        #[arg(long, short = 'r')]
        response: Option<String>,
    },

    /// Read bridge events (one JSON object per line) from stdin
    Ingest,

    /// Open an entry as the active conversation
    Show {
        /// 1-based position in the list
        position: usize,
    },

    /// Delete an entry
    Delete {
        /// 1-based position in the list
        position: usize,
        /// Position of the entry currently open in the conversation view
        #[arg(long)]
        selected: Option<usize>,
    },
}

fn main() {
    let cli = Cli::parse();

    // Keep logs quiet unless asked for; stdout carries command output
    if let Err(e) = init_tracing_with_default("warn") {
        eprintln!("Warning: {}", e);
    }

    let file_config = match cli.config.as_deref().map(CliConfig::load).transpose() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    };
    let config = resolve_core_config(cli.data_dir, file_config);

    let command = match cli.command {
        Commands::List { search } => CliCommand::List { search },
        Commands::Add { message, response } => CliCommand::Add { message, response },
        Commands::Ingest => CliCommand::Ingest,
        Commands::Show { position } => CliCommand::Show { position },
        Commands::Delete { position, selected } => CliCommand::Delete { position, selected },
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(e) = execute(command, &config, EventBus::global(), stdin.lock(), &mut stdout.lock()) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
