//! Error type for `tally-warehouse`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// Warehouse DDL could not be executed. Fatal to the pipeline run.
  #[error("schema creation failed: {0}")]
  Schema(#[source] tokio_rusqlite::Error),

  /// A batch's stage/dimension/fact load failed and was rolled back. The
  /// batch is abandoned; previously committed batches are unaffected.
  #[error("load failed for batch {batch:?}: {source}")]
  Load {
    batch:  String,
    #[source]
    source: tokio_rusqlite::Error,
  },

  /// The catalog itself could not be queried during the integrity scan.
  #[error("integrity scan failed: {0}")]
  Integrity(#[source] tokio_rusqlite::Error),

  /// A batch name yields no usable staging identifier.
  #[error("batch name {0:?} yields no valid staging identifier")]
  InvalidIdentifier(String),

  #[error("core error: {0}")]
  Core(#[from] tally_core::Error),

  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
