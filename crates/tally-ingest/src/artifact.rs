//! Cleaned-artifact persistence.
//!
//! Each cleaned batch is written to the output directory in two redundant
//! formats — `<batch>_cleaned.csv` and `<batch>_cleaned.jsonl` — as the
//! auditable intermediate between transform and load.

use std::{
  io::Write as _,
  path::{Path, PathBuf},
};

use tally_core::row::CleanBatch;

use crate::error::{Error, Result};

/// Where one batch's cleaned artifacts landed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
  pub csv:   PathBuf,
  pub jsonl: PathBuf,
}

/// Write both artifact formats for `batch`, overwriting previous runs.
pub fn write_artifacts(out_dir: &Path, batch: &CleanBatch) -> Result<ArtifactPaths> {
  let csv_path = out_dir.join(format!("{}_cleaned.csv", batch.name));
  let jsonl_path = out_dir.join(format!("{}_cleaned.jsonl", batch.name));

  write_csv(&csv_path, batch)?;
  write_jsonl(&jsonl_path, batch)?;

  tracing::info!(
    batch = %batch.name,
    csv = %csv_path.display(),
    jsonl = %jsonl_path.display(),
    "wrote cleaned artifacts"
  );

  Ok(ArtifactPaths {
    csv:   csv_path,
    jsonl: jsonl_path,
  })
}

fn write_csv(path: &Path, batch: &CleanBatch) -> Result<()> {
  let mut writer =
    csv::Writer::from_path(path).map_err(Error::ArtifactEncode)?;
  for row in &batch.rows {
    writer.serialize(row).map_err(Error::ArtifactEncode)?;
  }
  writer.flush().map_err(|source| Error::Artifact {
    path: path.to_path_buf(),
    source,
  })
}

fn write_jsonl(path: &Path, batch: &CleanBatch) -> Result<()> {
  let file = std::fs::File::create(path).map_err(|source| Error::Artifact {
    path: path.to_path_buf(),
    source,
  })?;
  let mut out = std::io::BufWriter::new(file);
  for row in &batch.rows {
    serde_json::to_writer(&mut out, row)?;
    out.write_all(b"\n").map_err(|source| Error::Artifact {
      path: path.to_path_buf(),
      source,
    })?;
  }
  out.flush().map_err(|source| Error::Artifact {
    path: path.to_path_buf(),
    source,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────
