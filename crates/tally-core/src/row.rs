//! Row types — the units of data moving through the pipeline.
//!
//! A [`RawRecord`] is one line of a source spreadsheet exactly as decoded,
//! every field optional. A [`CleanRow`] is the staging-ready shape produced
//! by the transformer: fully populated, typed measures, canonical date
//! string. Serde renames preserve the upstream export's column names so the
//! cleaned artifacts keep the source header contract.

use serde::{Deserialize, Serialize};

// ─── RawRecord ───────────────────────────────────────────────────────────────

/// One undecoded source line. Empty cells decode to `None`; the transformer
/// decides which absences are fatal to the row.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawRecord {
  #[serde(rename = "InvoiceNo")]
  pub invoice_no:   Option<String>,
  #[serde(rename = "StockCode")]
  pub stock_code:   Option<String>,
  #[serde(rename = "Description")]
  pub description:  Option<String>,
  #[serde(rename = "Quantity")]
  pub quantity:     Option<String>,
  #[serde(rename = "InvoiceDate")]
  pub invoice_date: Option<String>,
  #[serde(rename = "UnitPrice")]
  pub unit_price:   Option<String>,
  #[serde(rename = "CustomerID")]
  pub customer_id:  Option<String>,
  #[serde(rename = "Country")]
  pub country:      Option<String>,
}

/// The source columns every input file must carry, in export order.
pub const REQUIRED_COLUMNS: [&str; 8] = [
  "InvoiceNo",
  "StockCode",
  "Description",
  "Quantity",
  "InvoiceDate",
  "UnitPrice",
  "CustomerID",
  "Country",
];

// ─── CleanRow ────────────────────────────────────────────────────────────────

/// A transaction line that survived cleaning.
///
/// Invariants guaranteed by the transformer: no field is empty,
/// `quantity > 0`, `unit_price > 0`, `invoice_date` is in the canonical
/// format (see [`crate::calendar::CANONICAL_FORMAT`]), and single quotes in
/// `description` are doubled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CleanRow {
  #[serde(rename = "InvoiceNo")]
  pub invoice_no:   String,
  #[serde(rename = "StockCode")]
  pub stock_code:   String,
  #[serde(rename = "Description")]
  pub description:  String,
  #[serde(rename = "Quantity")]
  pub quantity:     i64,
  #[serde(rename = "InvoiceDate")]
  pub invoice_date: String,
  #[serde(rename = "UnitPrice")]
  pub unit_price:   f64,
  #[serde(rename = "CustomerID")]
  pub customer_id:  i64,
  #[serde(rename = "Country")]
  pub country:      String,
  /// 1-based position of the line in its source file; part of the fact
  /// natural key so a legitimately repeated line is still distinct.
  #[serde(rename = "LineNo")]
  pub line_no:      u32,
}

// ─── CleanBatch ──────────────────────────────────────────────────────────────

/// The cleaned contents of one ingestion batch, named after its source file.
#[derive(Debug, Clone)]
pub struct CleanBatch {
  /// Batch name derived from the source file stem (unsanitised; storage
  /// backends derive their own staging identifier from it).
  pub name: String,
  pub rows: Vec<CleanRow>,
}
