//! Extraction and transformation for the Tally warehouse pipeline.
//!
//! Discovers raw spreadsheet batches, cleans them into staging-ready rows,
//! and persists the cleaned artifacts. Pure filesystem + CPU; no database
//! dependencies.
//!
//! # Quick start
//!
//! ```no_run
//! use std::path::Path;
//!
//! let batches = tally_ingest::list_batches(Path::new("data/raw")).unwrap();
//! for batch in &batches {
//!   let outcome = tally_ingest::clean_batch(batch).unwrap();
//!   tally_ingest::write_artifacts(Path::new("data/cleaned"), &outcome.batch)
//!     .unwrap();
//! }
//! ```

mod artifact;
mod clean;
mod extract;

pub mod error;

pub use artifact::{ArtifactPaths, write_artifacts};
pub use clean::{CleanOutcome, clean_batch};
pub use error::{Error, Result};
pub use extract::{SourceBatch, list_batches};
