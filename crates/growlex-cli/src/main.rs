//! Growlex CLI - benchmark ASR models on sung vocals

use anyhow::Result;
use clap::{Parser, Subcommand};
use growlex_core::Config;

mod commands;

#[derive(Parser)]
#[command(name = "growlex")]
#[command(version)]
#[command(about = "Benchmark ASR models on sung (and growled) vocals", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Verbose output (show per-file debug info)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Download manifest-listed songs and separate their vocals
    Fetch {
        /// Re-download and re-separate even when files exist
        #[arg(short, long)]
        force: bool,

        /// Skip vocal separation
        #[arg(long)]
        no_vocals: bool,
    },

    /// Transcribe the corpus with every configured model
    Transcribe {
        /// Restrict to one dataset-path prefix (e.g. songs/death)
        #[arg(short, long)]
        dataset: Option<String>,

        /// Restrict to one model id
        #[arg(short, long)]
        model: Option<String>,

        /// Discard cached transcripts and redo everything
        #[arg(short, long)]
        force: bool,
    },

    /// Score cached transcripts against every lyrics version
    Score {
        /// Restrict to one dataset-path prefix
        #[arg(short, long)]
        dataset: Option<String>,

        /// Discard cached scores and redo everything
        #[arg(short, long)]
        force: bool,
    },

    /// Aggregate best scores per style and write the summary report
    Report {
        /// Restrict to one dataset-path prefix
        #[arg(short, long)]
        dataset: Option<String>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,

    /// Write the resolved configuration to the default path
    Init,

    /// Show config file path
    Path,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(false)
        .init();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Fetch { force, no_vocals } => commands::fetch::run(&config, force, no_vocals),

        Commands::Transcribe {
            dataset,
            model,
            force,
        } => commands::transcribe::run(&config, dataset.as_deref(), model.as_deref(), force),

        Commands::Score { dataset, force } => {
            commands::score::run(&config, dataset.as_deref(), force)
        }

        Commands::Report { dataset } => commands::report::run(&config, dataset.as_deref()),

        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&config),
            ConfigAction::Init => commands::config::init(&config),
            ConfigAction::Path => commands::config::show_path(),
        },
    }
}
