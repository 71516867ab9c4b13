//! The orchestration loop: extract → transform → load, then the integrity
//! scan.
//!
//! Error containment follows the batch boundaries: an unparsable file or a
//! failed batch load is logged and skipped while the run continues;
//! configuration, schema, extraction, and catalog failures propagate and
//! terminate the run.

use std::path::Path;

use anyhow::Context as _;
use tally_core::warehouse::Warehouse;
use tracing::{info, warn};

/// Run the full pipeline against `warehouse`.
pub async fn run<W: Warehouse>(
  warehouse: &W,
  input_dir: &Path,
  output_dir: &Path,
) -> anyhow::Result<()> {
  info!("starting ETL run");

  warehouse
    .ensure_schema()
    .await
    .context("schema creation failed")?;

  std::fs::create_dir_all(output_dir).with_context(|| {
    format!("failed to create output directory {}", output_dir.display())
  })?;

  let batches =
    tally_ingest::list_batches(input_dir).context("extraction failed")?;
  if batches.is_empty() {
    info!(dir = %input_dir.display(), "no input files found");
  }

  let total = batches.len();
  for (idx, source) in batches.iter().enumerate() {
    info!(
      file = %source.path.display(),
      "processing file {}/{total}",
      idx + 1
    );

    let outcome = match tally_ingest::clean_batch(source) {
      Ok(outcome) => outcome,
      Err(e) => {
        warn!(file = %source.path.display(), error = %e, "skipping unparsable file");
        continue;
      }
    };

    if let Err(e) = tally_ingest::write_artifacts(output_dir, &outcome.batch) {
      warn!(batch = %outcome.batch.name, error = %e, "skipping batch: artifacts not written");
      continue;
    }

    match warehouse.load_batch(&outcome.batch).await {
      Ok(summary) => info!(
        batch = %summary.batch,
        staged = summary.staged,
        customers = summary.dimensions.customers,
        products = summary.dimensions.products,
        dates = summary.dimensions.dates,
        facts = summary.facts.inserted,
        unmatched = summary.facts.unmatched,
        "batch loaded"
      ),
      // The failed batch was rolled back; earlier batches stay committed.
      Err(e) => {
        warn!(batch = %outcome.batch.name, error = %e, "batch abandoned");
        continue;
      }
    }
  }

  check(warehouse).await?;
  info!("ETL run complete");
  Ok(())
}

/// Scan every warehouse column for nulls and log the full report,
/// zero-null columns included.
pub async fn check<W: Warehouse>(warehouse: &W) -> anyhow::Result<()> {
  let report = warehouse
    .scan_for_nulls()
    .await
    .context("integrity scan failed")?;

  for entry in &report {
    if entry.nulls > 0 {
      warn!(
        table = %entry.table,
        column = %entry.column,
        nulls = entry.nulls,
        "null values found"
      );
    } else {
      info!(table = %entry.table, column = %entry.column, "no null values");
    }
  }
  Ok(())
}

/// Print the warehouse catalog.
pub async fn tables<W: Warehouse>(warehouse: &W) -> anyhow::Result<()> {
  let tables = warehouse
    .list_tables()
    .await
    .context("failed to list warehouse tables")?;

  if tables.is_empty() {
    println!("no tables found");
    return Ok(());
  }

  for table in tables {
    println!("{}", table.name);
    for column in table.columns {
      println!("  - {column}");
    }
  }
  Ok(())
}
