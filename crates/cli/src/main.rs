//! Lorebase CLI
//!
//! Main entry point for the lorebase command-line tool: a local
//! knowledge base over a directory of documents, searchable by
//! similarity and usable as retrieved context in LLM chat.

mod commands;

use clap::{Parser, Subcommand};
use commands::{ChatCommand, KbCommand};
use lorebase_core::{config::AppConfig, logging, AppResult};
use std::path::PathBuf;

/// Lorebase - document retrieval and retrieval-augmented chat
#[derive(Parser, Debug)]
#[command(name = "lorebase")]
#[command(about = "Index local documents and chat over them", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding the knowledge base documents
    #[arg(short = 'd', long, global = true, env = "LOREBASE_KB_DIR")]
    kb_dir: Option<PathBuf>,

    /// Path to config file
    #[arg(short, long, global = true, env = "LOREBASE_CONFIG")]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    no_color: bool,

    /// LLM provider (openrouter)
    #[arg(short, long, global = true, env = "LOREBASE_PROVIDER")]
    provider: Option<String>,

    /// Model identifier
    #[arg(short, long, global = true, env = "LOREBASE_MODEL")]
    model: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Knowledge base operations (load, search, context, documents)
    Kb(KbCommand),

    /// Chat with retrieval-augmented context
    Chat(ChatCommand),
}

#[tokio::main]
async fn main() -> AppResult<()> {
    // Parse command-line arguments first (needed for logging config)
    let cli = Cli::parse();

    // Load base configuration from environment
    let config = AppConfig::load()?;

    // Apply CLI overrides
    let config = config.with_overrides(
        cli.kb_dir,
        cli.config,
        cli.provider,
        cli.model,
        cli.log_level,
        cli.verbose,
        cli.no_color,
    );

    // Initialize logging with final configuration
    logging::init_logging(config.log_level.as_deref(), config.no_color)?;

    tracing::info!("Lorebase starting");
    tracing::debug!("Knowledge base directory: {:?}", config.kb_dir);
    tracing::debug!("Provider: {}", config.provider);
    tracing::debug!("Model: {}", config.model);

    let command_name = match &cli.command {
        Commands::Kb(_) => "kb",
        Commands::Chat(_) => "chat",
    };
    let _span = tracing::info_span!("command", name = command_name).entered();

    // Route to command handlers
    let result = match cli.command {
        Commands::Kb(cmd) => cmd.execute(&config).await,
        Commands::Chat(cmd) => cmd.execute(&config).await,
    };

    match &result {
        Ok(_) => tracing::info!("Command completed successfully"),
        Err(e) => tracing::error!("Command failed: {}", e),
    }

    result
}
