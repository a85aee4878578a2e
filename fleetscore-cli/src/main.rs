//! fleetscore CLI: train and report the driver skill and fleet maintenance models.

mod commands;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// fleetscore: driver skill scores and vehicle maintenance levels from telemetry CSVs
#[derive(Parser, Debug)]
#[command(name = "fleetscore", version, about, long_about = None)]
struct Cli {
    /// Workspace directory
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Score drivers: synthesize skill labels, train, print per-driver predictions
    Drivers(RunArgs),
    /// Score vehicles: synthesize maintenance levels, train, print metrics and a sample
    Fleet(RunArgs),
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Flags shared by both pipelines. Each one overrides the loaded configuration.
#[derive(clap::Args, Debug, Default, Clone, PartialEq)]
struct RunArgs {
    /// Input CSV file
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Seed for the split and the forest
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of rows held out for evaluation
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Trees per label
    #[arg(long)]
    trees: Option<usize>,

    /// Also write the full report as JSON to this file
    #[arg(long)]
    json: Option<PathBuf>,

    /// Print the per-entity average of the synthesized labels
    #[arg(long)]
    show_actual: bool,
}

#[derive(clap::Subcommand, Debug, Clone, Copy, PartialEq)]
enum ConfigAction {
    /// Write a default .fleetscore/config.toml into the workspace
    Init,
    /// Print the effective configuration as TOML
    Show,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let log_dir = directories::ProjectDirs::from("dev", "fleetscore", "fleetscore")
        .map(|d| d.data_dir().join("logs"))
        .unwrap_or_else(|| PathBuf::from("."));
    let _ = std::fs::create_dir_all(&log_dir);
    let file_appender = tracing_appender::rolling::daily(&log_dir, "fleetscore.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let json_layer = tracing_subscriber::fmt::layer()
        .json()
        .with_writer(non_blocking)
        .with_filter(EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    commands::handle_command(cli.command, &workspace, cli.config.as_deref())
}
