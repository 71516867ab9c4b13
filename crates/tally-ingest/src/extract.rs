//! Batch discovery over the raw input directory.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// One raw input file awaiting transformation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBatch {
  /// Batch name: the file stem, e.g. `online_retail_2011`.
  pub name: String,
  pub path: PathBuf,
}

/// List the `.csv` files directly inside `input_dir`, in directory-listing
/// order (not guaranteed stable across filesystems).
///
/// Does not open any file. An empty directory yields an empty list — the
/// caller decides whether that is fatal. An unreadable directory is
/// [`Error::Extraction`].
pub fn list_batches(input_dir: &Path) -> Result<Vec<SourceBatch>> {
  let entries = std::fs::read_dir(input_dir).map_err(|source| {
    Error::Extraction {
      path: input_dir.to_path_buf(),
      source,
    }
  })?;

  let mut batches = Vec::new();
  for entry in entries {
    let entry = entry.map_err(|source| Error::Extraction {
      path: input_dir.to_path_buf(),
      source,
    })?;
    let path = entry.path();

    let is_csv = path
      .extension()
      .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if !is_csv || !path.is_file() {
      continue;
    }

    let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
      continue; // non-UTF-8 name; nothing to call the batch
    };

    batches.push(SourceBatch {
      name: stem.to_string(),
      path,
    });
  }

  tracing::info!(count = batches.len(), dir = %input_dir.display(), "found input files");
  Ok(batches)
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn empty_directory_yields_empty_list() {
    let dir = tempfile::tempdir().unwrap();
    let batches = list_batches(dir.path()).unwrap();
    assert!(batches.is_empty());
  }

  #[test]
  fn only_csv_files_are_listed() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("sales.csv"), "a,b\n").unwrap();
    std::fs::write(dir.path().join("notes.txt"), "skip me").unwrap();
    std::fs::write(dir.path().join("SALES2.CSV"), "a,b\n").unwrap();
    std::fs::create_dir(dir.path().join("nested.csv")).unwrap();

    let mut names: Vec<_> =
      list_batches(dir.path()).unwrap().into_iter().map(|b| b.name).collect();
    names.sort();
    assert_eq!(names, ["SALES2", "sales"]);
  }

  #[test]
  fn missing_directory_is_extraction_error() {
    let dir = tempfile::tempdir().unwrap();
    let gone = dir.path().join("no_such_dir");
    let err = list_batches(&gone).unwrap_err();
    assert!(matches!(err, Error::Extraction { .. }));
  }
}
