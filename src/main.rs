//! Binary entry point for the Atlas of Us API.

// Allow print_stderr in main binary for CLI output
#![allow(clippy::print_stderr)]
#![allow(clippy::print_stdout)]
// Allow multiple crate versions from transitive dependencies
#![allow(clippy::multiple_crate_versions)]

use anyhow::Context;
use atlas::AtlasConfig;
use atlas::observability::{self, ObservabilityConfig};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;

/// Atlas of Us - knowledge graph API over Neo4j.
#[derive(Parser)]
#[command(name = "atlas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file.
    #[arg(short, long, global = true, env = "ATLAS_CONFIG_PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP API.
    Serve {
        /// Address to listen on (overrides configuration).
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },

    /// Create the vector index and account constraint.
    InitSchema {
        /// Embedding dimensions (defaults to the configured value).
        #[arg(short, long)]
        dimensions: Option<usize>,
    },

    /// Execute every `.cypher` file under a directory.
    LoadCypher {
        /// Directory to load.
        dir: PathBuf,

        /// Delete every node and relationship first.
        #[arg(long)]
        wipe: bool,
    },

    /// Print a random secret for `JWT_SECRET`.
    GenerateKey,
}

/// Main entry point.
#[tokio::main]
async fn main() -> ExitCode {
    // A missing .env file is normal outside development.
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let config = match AtlasConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        },
    };

    let observability = match observability::init(ObservabilityConfig::from_settings(
        &config.observability,
        cli.verbose,
    )) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Failed to initialize observability: {e}");
            return ExitCode::FAILURE;
        },
    };

    match run_command(cli.command, config, observability).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Command failed");
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        },
    }
}

/// Runs the selected command.
async fn run_command(
    command: Commands,
    config: AtlasConfig,
    observability: observability::ObservabilityHandle,
) -> anyhow::Result<()> {
    match command {
        Commands::Serve { listen } => {
            atlas::cli::serve(config, listen, observability.prometheus().cloned())
                .await
                .context("server failed")?;
        },

        Commands::InitSchema { dimensions } => {
            atlas::cli::init_schema(&config, dimensions)
                .await
                .context("schema initialization failed")?;
        },

        Commands::LoadCypher { dir, wipe } => {
            let summary = atlas::cli::load_cypher(&config, &dir, wipe)
                .await
                .with_context(|| format!("loading {} failed", dir.display()))?;
            println!(
                "Loaded {} file(s), {} failed, {} statement(s)",
                summary.files_loaded, summary.files_failed, summary.statements
            );
        },

        Commands::GenerateKey => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{}", atlas::cli::generate_key())?;
        },
    }
    Ok(())
}
