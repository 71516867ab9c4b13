//! Error types for `tally-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// An invoice date string did not match the canonical format.
  #[error("invalid canonical date: {0:?}")]
  BadDate(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
