//! Structured results returned by warehouse operations.

use serde::Serialize;

// ─── Load reporting ──────────────────────────────────────────────────────────

/// Row counts from populating the dimension tables for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DimensionCounts {
  pub customers: usize,
  pub products:  usize,
  pub dates:     usize,
}

/// Row counts from populating the fact table for one batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FactCounts {
  pub inserted:  usize,
  /// Staging rows whose dimension lookup failed. Should be zero given the
  /// load ordering; reported rather than silently discarded.
  pub unmatched: usize,
}

/// The outcome of loading one batch end to end.
#[derive(Debug, Clone, Serialize)]
pub struct LoadSummary {
  pub batch:      String,
  /// Rows written to the staging table.
  pub staged:     usize,
  pub dimensions: DimensionCounts,
  pub facts:      FactCounts,
}

// ─── Integrity reporting ─────────────────────────────────────────────────────

/// Null occurrences for one column; emitted for every column scanned,
/// zero-null columns included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NullCount {
  pub table:  String,
  pub column: String,
  pub nulls:  i64,
}

/// One table in the warehouse catalog with its column names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableInfo {
  pub name:    String,
  pub columns: Vec<String>,
}

// ─── Collaborator read models ────────────────────────────────────────────────

/// Per-customer aggregate consumed by the segmentation collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerActivity {
  pub customer_id: i64,
  pub total_spent: f64,
  pub purchases:   i64,
}

/// Per-month aggregate consumed by the forecasting collaborator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlySales {
  pub year:        i32,
  /// English month name, matching the time dimension.
  pub month:       String,
  pub total_sales: f64,
}
