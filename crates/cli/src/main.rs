//! ragchat CLI — the main entry point.
//!
//! Commands:
//! - `chat`       — Interactive chat or single-message mode (default)
//! - `search`     — Search the knowledge base
//! - `knowledge`  — Knowledge base summary
//! - `doctor`     — Diagnose configuration and backend health
//! - `config`     — Print the effective configuration

use clap::{Parser, Subcommand};

mod commands;

use commands::Overrides;

#[derive(Parser)]
#[command(
    name = "ragchat",
    about = "ragchat — local chatbot with keyword retrieval over a knowledge file",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    overrides: Overrides,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model
    Chat {
        /// Send a single message instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,
    },

    /// Search the knowledge base
    Search {
        /// Free-text query
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },

    /// Show knowledge base statistics
    Knowledge,

    /// Diagnose configuration and backend health
    Doctor,

    /// Print the effective configuration as TOML
    Config {
        /// Print built-in defaults instead
        #[arg(long)]
        default: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so chat output stays clean
    let filter = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let command = cli.command.unwrap_or(Commands::Chat { message: None });
    match command {
        Commands::Chat { message } => commands::chat::run(cli.overrides.resolve()?, message).await?,
        Commands::Search { query } => {
            commands::search::run(cli.overrides.resolve()?, &query.join(" ")).await?
        }
        Commands::Knowledge => commands::knowledge::run(cli.overrides.resolve()?).await?,
        Commands::Doctor => commands::doctor::run(&cli.overrides).await?,
        Commands::Config { default } => commands::config_cmd::run(&cli.overrides, default).await?,
    }

    Ok(())
}
