//! `tally` — retail sales warehouse ETL.
//!
//! Reads `tally.toml` (or the path given with `--config`, overridable with
//! `TALLY_*` environment variables), opens the SQLite warehouse, and runs
//! the requested pipeline step.
//!
//! ```
//! tally run              # extract → transform → load → integrity scan
//! tally check            # integrity scan only
//! tally tables           # list warehouse tables and columns
//! ```

mod pipeline;

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use serde::Deserialize;
use tally_warehouse::SqliteWarehouse;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

// ─── CLI args ─────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "tally", about = "Retail sales warehouse ETL")]
struct Cli {
  /// Path to the TOML configuration file.
  #[arg(short, long, default_value = "tally.toml")]
  config: PathBuf,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Run the full pipeline: extract, transform, load, integrity scan.
  Run,
  /// Run only the null-value integrity scan.
  Check,
  /// List warehouse tables and their columns.
  Tables,
}

// ─── Configuration ────────────────────────────────────────────────────────────

/// Pipeline settings, layered from the TOML file and `TALLY_*` environment
/// variables. A missing database path is fatal before any work starts.
#[derive(Debug, Clone, Deserialize)]
struct PipelineConfig {
  /// SQLite database file holding the warehouse.
  database_path: PathBuf,

  /// Directory of raw spreadsheet exports.
  #[serde(default = "default_input_dir")]
  input_dir: PathBuf,

  /// Directory receiving the cleaned artifacts.
  #[serde(default = "default_output_dir")]
  output_dir: PathBuf,
}

fn default_input_dir() -> PathBuf {
  PathBuf::from("data/raw")
}

fn default_output_dir() -> PathBuf {
  PathBuf::from("data/cleaned")
}

// ─── Entry point ──────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
  // Initialise tracing.
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy(),
    )
    .init();

  let cli = Cli::parse();

  // Load configuration.
  let settings = config::Config::builder()
    .add_source(config::File::from(cli.config).required(false))
    .add_source(config::Environment::with_prefix("TALLY"))
    .build()
    .context("failed to read configuration")?;

  let cfg: PipelineConfig = settings
    .try_deserialize()
    .context("invalid pipeline configuration")?;

  // Open the warehouse.
  let warehouse = SqliteWarehouse::open(&cfg.database_path)
    .await
    .with_context(|| {
      format!("failed to open warehouse at {}", cfg.database_path.display())
    })?;

  match cli.command {
    Command::Run => {
      pipeline::run(&warehouse, &cfg.input_dir, &cfg.output_dir).await
    }
    Command::Check => pipeline::check(&warehouse).await,
    Command::Tables => pipeline::tables(&warehouse).await,
  }
}
