//! Error type for `tally-ingest`.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The input directory could not be read. Fatal to the run.
  #[error("input directory unreadable: {path}: {source}")]
  Extraction {
    path:   PathBuf,
    source: std::io::Error,
  },

  /// A source file is entirely unparsable. The file is skipped; the
  /// pipeline continues with the remaining files.
  #[error("unparsable source file: {path}: {source}")]
  Transform {
    path:   PathBuf,
    source: csv::Error,
  },

  /// A source file is missing one of the required columns.
  #[error("source file {path} is missing required column {column:?}")]
  MissingColumn {
    path:   PathBuf,
    column: &'static str,
  },

  /// A cleaned artifact could not be written.
  #[error("artifact write failed: {path}: {source}")]
  Artifact {
    path:   PathBuf,
    source: std::io::Error,
  },

  #[error("artifact encode error: {0}")]
  ArtifactEncode(#[source] csv::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
