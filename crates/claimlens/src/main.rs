//! ClaimLens CLI - AI-powered vehicle damage assessment.
//!
//! ClaimLens sends photos of damaged cars to a vision model (OpenAI or
//! Google Gemini) and turns the answer into a structured damage report:
//! vehicle identification, per-part damage with severity and cost bands,
//! and a drivability verdict.
//!
//! # Usage
//!
//! ```bash
//! # Start the web UI and API
//! claimlens serve
//!
//! # Analyze a single photo
//! claimlens analyze crash.jpg
//!
//! # Analyze a directory, streaming JSONL
//! claimlens analyze ./claims/ --format jsonl --output reports.jsonl
//!
//! # View configuration
//! claimlens config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;
mod server;

/// ClaimLens - AI-powered vehicle damage assessment.
#[derive(Parser, Debug)]
#[command(name = "claimlens")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the upload UI and analysis API server
    Serve(cli::serve::ServeArgs),

    /// Analyze an image file or directory from the command line
    Analyze(cli::analyze::AnalyzeArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before anything reads ${OPENAI_API_KEY}-style references
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match claimlens_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `claimlens config path`."
            );
            claimlens_core::Config::default()
        }
    };
    logging::init_from_config(&config, cli.verbose, cli.json_logs);

    tracing::debug!("ClaimLens v{}", claimlens_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Serve(args) => cli::serve::execute(args, config).await,
        Commands::Analyze(args) => cli::analyze::execute(args, config).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
