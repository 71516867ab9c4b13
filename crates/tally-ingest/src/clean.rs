//! The transformer: one raw spreadsheet in, staging-ready rows out.
//!
//! Pipeline, per file:
//!   decode CSV
//!     └─ coerce_date()       → datetime or missing-marker
//!          └─ required-field check → drop incomplete rows
//!               └─ canonical render + quote escaping
//!                    └─ positive quantity/price filter
//!
//! Date coercion runs BEFORE the missing-field check so a malformed date
//! becomes an ordinary missing value and is dropped with the rest — it can
//! never survive as non-null garbage. A per-row problem only removes that
//! row; only a wholly unreadable file fails the batch.

use chrono::{NaiveDate, NaiveDateTime};
use tally_core::{
  calendar,
  row::{CleanBatch, CleanRow, RawRecord, REQUIRED_COLUMNS},
};

use crate::{
  error::{Error, Result},
  extract::SourceBatch,
};

// ─── Outcome ─────────────────────────────────────────────────────────────────

/// A cleaned batch plus the per-step drop counts, for logging.
#[derive(Debug)]
pub struct CleanOutcome {
  pub batch:              CleanBatch,
  /// Data rows read from the source file.
  pub read:               usize,
  /// Rows dropped for a missing or undecodable required field (including
  /// coerced-away invoice dates).
  pub dropped_missing:    usize,
  /// Rows dropped for non-positive quantity or unit price (returns,
  /// cancellations, zero-priced lines).
  pub dropped_nonpositive: usize,
}

// ─── Date coercion ───────────────────────────────────────────────────────────

/// Source datetime formats seen in the upstream exports, tried in order.
/// The canonical form is accepted too, so re-cleaning a cleaned file is a
/// no-op.
const SOURCE_FORMATS: [&str; 5] = [
  calendar::CANONICAL_FORMAT,
  "%m/%d/%Y %H:%M",
  "%m/%d/%Y %H:%M:%S",
  "%Y-%m-%d %H:%M:%S",
  "%Y-%m-%dT%H:%M:%S",
];

/// Parse a source invoice-date cell. Unparseable input becomes `None` — the
/// missing-marker — rather than an error.
fn coerce_date(value: Option<&str>) -> Option<NaiveDateTime> {
  let s = value?.trim();
  if s.is_empty() {
    return None;
  }
  for fmt in SOURCE_FORMATS {
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
      return Some(dt);
    }
  }
  // Date-only exports: midnight.
  NaiveDate::parse_from_str(s, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
}

// ─── Field helpers ───────────────────────────────────────────────────────────

/// Return `Some(trimmed)` when non-empty, `None` otherwise.
fn opt_str(value: &Option<String>) -> Option<&str> {
  let s = value.as_deref()?.trim();
  if s.is_empty() { None } else { Some(s) }
}

fn parse_i64(s: &str) -> Option<i64> {
  if let Ok(n) = s.parse::<i64>() {
    return Some(n);
  }
  // Spreadsheet exports render integral identifiers as floats ("17850.0").
  let f = s.parse::<f64>().ok()?;
  if f.fract() == 0.0 && f.is_finite() {
    Some(f as i64)
  } else {
    None
  }
}

/// Double embedded single quotes so the text stays inert if it ever meets
/// raw SQL downstream.
fn escape_quotes(s: &str) -> String {
  s.replace('\'', "''")
}

// ─── Row cleaning ────────────────────────────────────────────────────────────

/// Clean one decoded record. `None` means the row lacked a required field.
fn clean_record(raw: &RawRecord, line_no: u32) -> Option<CleanRow> {
  let invoice_date = coerce_date(raw.invoice_date.as_deref())?;

  let invoice_no = opt_str(&raw.invoice_no)?;
  let stock_code = opt_str(&raw.stock_code)?;
  let description = opt_str(&raw.description)?;
  let country = opt_str(&raw.country)?;
  let quantity = parse_i64(opt_str(&raw.quantity)?)?;
  let unit_price = opt_str(&raw.unit_price)?.parse::<f64>().ok()?;
  let customer_id = parse_i64(opt_str(&raw.customer_id)?)?;

  Some(CleanRow {
    invoice_no: invoice_no.to_string(),
    stock_code: stock_code.to_string(),
    description: escape_quotes(description),
    quantity,
    invoice_date: calendar::format_canonical(invoice_date),
    unit_price,
    customer_id,
    country: country.to_string(),
    line_no,
  })
}

// ─── Batch cleaning ──────────────────────────────────────────────────────────

/// Clean every row of one source file.
///
/// Fails with [`Error::Transform`] or [`Error::MissingColumn`] only when the
/// file itself cannot be decoded; individual bad rows are counted and
/// dropped.
pub fn clean_batch(source: &SourceBatch) -> Result<CleanOutcome> {
  let mut reader =
    csv::Reader::from_path(&source.path).map_err(|e| Error::Transform {
      path:   source.path.clone(),
      source: e,
    })?;

  let headers = reader
    .headers()
    .map_err(|e| Error::Transform {
      path:   source.path.clone(),
      source: e,
    })?
    .clone();
  for column in REQUIRED_COLUMNS {
    if !headers.iter().any(|h| h == column) {
      return Err(Error::MissingColumn {
        path: source.path.clone(),
        column,
      });
    }
  }

  let mut rows = Vec::new();
  let mut read = 0usize;
  let mut dropped_missing = 0usize;
  let mut dropped_nonpositive = 0usize;

  for (idx, record) in reader.deserialize::<RawRecord>().enumerate() {
    read += 1;
    let line_no = (idx + 1) as u32;

    let raw = match record {
      Ok(raw) => raw,
      Err(_) => {
        // Malformed line (field count, encoding); drop it like a null row.
        dropped_missing += 1;
        continue;
      }
    };

    let Some(row) = clean_record(&raw, line_no) else {
      dropped_missing += 1;
      continue;
    };

    if row.quantity <= 0 || row.unit_price <= 0.0 {
      dropped_nonpositive += 1;
      continue;
    }

    rows.push(row);
  }

  tracing::info!(
    batch = %source.name,
    read,
    kept = rows.len(),
    dropped_missing,
    dropped_nonpositive,
    "cleaned batch"
  );

  Ok(CleanOutcome {
    batch: CleanBatch {
      name: source.name.clone(),
      rows,
    },
    read,
    dropped_missing,
    dropped_nonpositive,
  })
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use std::io::Write as _;

  use super::*;

  const HEADER: &str =
    "InvoiceNo,StockCode,Description,Quantity,InvoiceDate,UnitPrice,CustomerID,Country\n";

  fn batch_from(lines: &[&str]) -> (tempfile::TempDir, SourceBatch) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("fixture.csv");
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(HEADER.as_bytes()).unwrap();
    for line in lines {
      writeln!(f, "{line}").unwrap();
    }
    drop(f);
    let batch = SourceBatch {
      name: "fixture".to_string(),
      path,
    };
    (dir, batch)
  }

  #[test]
  fn keeps_only_positive_quantity_and_price() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,12/1/2010 8:26,2.5,17850,United Kingdom",
      "C536379,85123A,WHITE HANGING HEART,-1,12/1/2010 9:41,3.0,17850,United Kingdom",
      "536380,22632,HAND WARMER,5,12/1/2010 9:41,0,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();

    assert_eq!(outcome.read, 3);
    assert_eq!(outcome.dropped_nonpositive, 2);
    assert_eq!(outcome.batch.rows.len(), 1);

    let row = &outcome.batch.rows[0];
    assert_eq!(row.quantity, 10);
    assert_eq!(row.unit_price, 2.5);
    assert!(outcome.batch.rows.iter().all(|r| r.quantity > 0 && r.unit_price > 0.0));
  }

  #[test]
  fn drops_rows_with_missing_fields() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,12/1/2010 8:26,2.5,17850,United Kingdom",
      "536366,85123A,,10,12/1/2010 8:26,2.5,17850,United Kingdom",
      "536367,85123A,RED LANTERN,10,12/1/2010 8:26,2.5,,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    assert_eq!(outcome.dropped_missing, 2);
    assert_eq!(outcome.batch.rows.len(), 1);
  }

  #[test]
  fn malformed_date_is_coerced_then_dropped() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,not-a-date,2.5,17850,United Kingdom",
      "536366,85123A,WHITE HANGING HEART,10,31/31/2010 8:26,2.5,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    // Garbage dates never survive as text; the rows fall with the nulls.
    assert_eq!(outcome.dropped_missing, 2);
    assert!(outcome.batch.rows.is_empty());
  }

  #[test]
  fn dates_render_in_canonical_format() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,12/1/2010 8:26,2.5,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    assert_eq!(outcome.batch.rows[0].invoice_date, "01/12/2010 08:26:00 AM");
  }

  #[test]
  fn recleaning_canonical_dates_is_stable() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,01/12/2010 08:26:00 AM,2.5,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    assert_eq!(outcome.batch.rows[0].invoice_date, "01/12/2010 08:26:00 AM");
  }

  #[test]
  fn single_quotes_are_doubled() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,KID'S PAINT SET,10,12/1/2010 8:26,2.5,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    assert_eq!(outcome.batch.rows[0].description, "KID''S PAINT SET");
  }

  #[test]
  fn float_form_customer_ids_are_accepted() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,12/1/2010 8:26,2.5,17850.0,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    assert_eq!(outcome.batch.rows[0].customer_id, 17850);
  }

  #[test]
  fn line_numbers_follow_source_order() {
    let (_dir, source) = batch_from(&[
      "536365,85123A,WHITE HANGING HEART,10,12/1/2010 8:26,2.5,17850,United Kingdom",
      "536365,85123A,WHITE HANGING HEART,-2,12/1/2010 8:26,2.5,17850,United Kingdom",
      "536365,22632,HAND WARMER,3,12/1/2010 8:26,1.85,17850,United Kingdom",
    ]);
    let outcome = clean_batch(&source).unwrap();
    let line_nos: Vec<_> = outcome.batch.rows.iter().map(|r| r.line_no).collect();
    assert_eq!(line_nos, [1, 3]);
  }

  #[test]
  fn missing_required_column_fails_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("short.csv");
    std::fs::write(&path, "InvoiceNo,StockCode\n1,2\n").unwrap();
    let source = SourceBatch {
      name: "short".to_string(),
      path,
    };
    let err = clean_batch(&source).unwrap_err();
    assert!(matches!(err, Error::MissingColumn { column: "Description", .. }));
  }

  #[test]
  fn unreadable_file_is_transform_error() {
    let source = SourceBatch {
      name: "ghost".to_string(),
      path: std::path::PathBuf::from("/no/such/file.csv"),
    };
    let err = clean_batch(&source).unwrap_err();
    assert!(matches!(err, Error::Transform { .. }));
  }
}
