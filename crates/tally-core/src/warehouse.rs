//! The `Warehouse` trait and load-stage contracts.
//!
//! The trait is implemented by storage backends (e.g. `tally-warehouse`).
//! The orchestrator (`tally-cli`) depends on this abstraction, not on any
//! concrete backend.

use std::future::Future;

use crate::{
  report::{
    CustomerActivity, DimensionCounts, FactCounts, LoadSummary, MonthlySales,
    NullCount, TableInfo,
  },
  row::CleanBatch,
};

/// Abstraction over a star-schema warehouse backend.
///
/// Load order is part of the contract: dimensions are populated before
/// facts, so every fact row's foreign keys resolve. Each sub-operation is
/// idempotent — staging replaces wholesale, dimension and fact inserts
/// ignore existing keys — and [`Warehouse::load_batch`] composes all three
/// inside a single transaction so a failed batch leaves no partial state.
pub trait Warehouse: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Create the warehouse tables if absent. Safe to call any number of
  /// times; a DDL failure is fatal to the pipeline run.
  fn ensure_schema(
    &self,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Per-batch load steps ──────────────────────────────────────────────

  /// Replace the batch's staging table with `batch.rows` and return the
  /// staging table name.
  fn stage<'a>(
    &'a self,
    batch: &'a CleanBatch,
  ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'a;

  /// Upsert distinct customer, product, and time tuples from a staging
  /// table into the dimension tables, skipping existing keys.
  fn populate_dimensions<'a>(
    &'a self,
    staging: &'a str,
  ) -> impl Future<Output = Result<DimensionCounts, Self::Error>> + Send + 'a;

  /// Join a staging table to the dimensions and append fact rows, skipping
  /// already-loaded lines. Unmatched rows are counted, never dropped
  /// silently.
  fn populate_facts<'a>(
    &'a self,
    staging: &'a str,
  ) -> impl Future<Output = Result<FactCounts, Self::Error>> + Send + 'a;

  /// Run stage → dimensions → facts for one batch in a single transaction,
  /// rolling back all three on any failure.
  fn load_batch<'a>(
    &'a self,
    batch: &'a CleanBatch,
  ) -> impl Future<Output = Result<LoadSummary, Self::Error>> + Send + 'a;

  // ── Data-quality gate ─────────────────────────────────────────────────

  /// Count nulls in every column of every warehouse table. Read-only;
  /// finding nulls is a reportable outcome, not an error.
  fn scan_for_nulls(
    &self,
  ) -> impl Future<Output = Result<Vec<NullCount>, Self::Error>> + Send + '_;

  /// List every table in the warehouse with its columns.
  fn list_tables(
    &self,
  ) -> impl Future<Output = Result<Vec<TableInfo>, Self::Error>> + Send + '_;

  // ── Collaborator reads ────────────────────────────────────────────────

  /// Per-customer spend and purchase-count aggregates.
  fn customer_activity(
    &self,
  ) -> impl Future<Output = Result<Vec<CustomerActivity>, Self::Error>> + Send + '_;

  /// Monthly sales totals in chronological order.
  fn monthly_sales(
    &self,
  ) -> impl Future<Output = Result<Vec<MonthlySales>, Self::Error>> + Send + '_;
}
