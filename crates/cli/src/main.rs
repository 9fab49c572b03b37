//! Campanile CLI — the main entry point.
//!
//! Commands:
//! - `init`    — Write a default config file
//! - `ask`     — One-shot question through the full pipeline
//! - `chat`    — Interactive conversation over a single session
//! - `status`  — Show configuration and archive status
//! - `doctor`  — Diagnose configuration and provider health

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod pipeline;

#[derive(Parser)]
#[command(
    name = "campanile",
    about = "Campanile — university assistant over your document corpus",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the configuration file
    Init,

    /// Ask a single question
    Ask {
        /// The question to ask
        #[arg(short, long)]
        message: String,

        /// JSONL file of pre-embedded document chunks
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// User name for the session
        #[arg(long, default_value = "guest")]
        user: String,

        /// Session role: student, faculty or admin
        #[arg(long, default_value = "student")]
        role: String,
    },

    /// Chat interactively over one session
    Chat {
        /// JSONL file of pre-embedded document chunks
        #[arg(short, long)]
        corpus: Option<PathBuf>,

        /// User name for the session
        #[arg(long, default_value = "guest")]
        user: String,

        /// Session role: student, faculty or admin
        #[arg(long, default_value = "student")]
        role: String,
    },

    /// Show configuration and archive status
    Status,

    /// Diagnose configuration and provider health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Init => commands::init::run().await?,
        Commands::Ask {
            message,
            corpus,
            user,
            role,
        } => commands::ask::run(&message, corpus.as_deref(), &user, &role).await?,
        Commands::Chat { corpus, user, role } => {
            commands::chat::run(corpus.as_deref(), &user, &role).await?
        }
        Commands::Status => commands::status::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
