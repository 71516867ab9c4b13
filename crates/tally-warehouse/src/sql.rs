//! Synchronous SQL routines shared by the per-step operations and the
//! transactional batch load.
//!
//! Every function takes a plain `&rusqlite::Connection`, so the same code
//! runs standalone (per-statement commit) or inside an explicit transaction.
//! Values are always bound; the staging identifier is pre-sanitised by
//! [`crate::ident`] and quoted here.

use rusqlite::{Connection, OptionalExtension as _, params};
use sha2::{Digest, Sha256};
use tally_core::{calendar::CalendarDate, row::CleanRow};

use crate::ident::quote_ident;

/// Columns of every staging table, mirroring the source export plus the
/// line sequence number.
const STAGING_COLUMNS: &str = "
    \"InvoiceNo\"   TEXT,
    \"StockCode\"   TEXT,
    \"Description\" TEXT,
    \"Quantity\"    INTEGER,
    \"InvoiceDate\" TEXT,
    \"UnitPrice\"   REAL,
    \"CustomerID\"  INTEGER,
    \"Country\"     TEXT,
    \"LineNo\"      INTEGER
";

// ─── Staging ─────────────────────────────────────────────────────────────────

/// Replace `staging` wholesale with `rows`. Destructive to any prior
/// staging contents under the same name.
pub fn stage_rows(
  conn: &Connection,
  staging: &str,
  rows: &[CleanRow],
) -> rusqlite::Result<usize> {
  let table = quote_ident(staging);

  conn.execute_batch(&format!(
    "DROP TABLE IF EXISTS {table};
     CREATE TABLE {table} ({STAGING_COLUMNS});"
  ))?;

  let mut insert = conn.prepare(&format!(
    "INSERT INTO {table} (
       \"InvoiceNo\", \"StockCode\", \"Description\", \"Quantity\",
       \"InvoiceDate\", \"UnitPrice\", \"CustomerID\", \"Country\", \"LineNo\"
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"
  ))?;

  for row in rows {
    insert.execute(params![
      row.invoice_no,
      row.stock_code,
      row.description,
      row.quantity,
      row.invoice_date,
      row.unit_price,
      row.customer_id,
      row.country,
      row.line_no,
    ])?;
  }

  Ok(rows.len())
}

// ─── Dimensions ──────────────────────────────────────────────────────────────

/// Upsert distinct (customer, country) tuples from staging. Returns rows
/// actually inserted; existing keys are ignored.
pub fn insert_customers(
  conn: &Connection,
  staging: &str,
) -> rusqlite::Result<usize> {
  let table = quote_ident(staging);
  conn.execute(
    &format!(
      "INSERT OR IGNORE INTO dim_customers (customer_id, country)
       SELECT DISTINCT \"CustomerID\", \"Country\"
       FROM {table}
       WHERE \"CustomerID\" IS NOT NULL"
    ),
    [],
  )
}

/// Upsert distinct (stock code, description, unit price) tuples from
/// staging into the product dimension.
pub fn insert_products(
  conn: &Connection,
  staging: &str,
) -> rusqlite::Result<usize> {
  let table = quote_ident(staging);
  conn.execute(
    &format!(
      "INSERT OR IGNORE INTO dim_products (product_id, description, unit_price)
       SELECT DISTINCT \"StockCode\", \"Description\", \"UnitPrice\"
       FROM {table}
       WHERE \"StockCode\" IS NOT NULL"
    ),
    [],
  )
}

/// Insert one time-dimension row per distinct calendar date seen in
/// staging. The canonical date strings are parsed and derived in Rust;
/// dates already present are ignored.
pub fn insert_time(conn: &Connection, staging: &str) -> rusqlite::Result<usize> {
  let table = quote_ident(staging);

  let mut select = conn.prepare(&format!(
    "SELECT DISTINCT \"InvoiceDate\" FROM {table}
     WHERE \"InvoiceDate\" IS NOT NULL"
  ))?;
  let dates = select
    .query_map([], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut insert = conn.prepare(
    "INSERT OR IGNORE INTO dim_time
       (invoice_date, day_of_week, month, year, quarter)
     VALUES (?1, ?2, ?3, ?4, ?5)",
  )?;

  let mut inserted = 0;
  for value in dates {
    let cal = CalendarDate::from_canonical(&value).map_err(bad_date)?;
    inserted += insert.execute(params![
      cal.iso_date(),
      cal.day_of_week,
      cal.month,
      cal.year,
      cal.quarter,
    ])?;
  }
  Ok(inserted)
}

// ─── Facts ───────────────────────────────────────────────────────────────────

/// Result of a fact population pass.
pub struct FactInsert {
  pub inserted:  usize,
  /// Staging rows whose dimension lookup failed.
  pub unmatched: usize,
}

struct StagedLine {
  invoice_no:   String,
  stock_code:   String,
  customer_id:  i64,
  invoice_date: String,
  quantity:     i64,
  unit_price:   f64,
  line_no:      i64,
}

/// Join staging rows to the dimensions and append fact rows.
///
/// Rows already loaded (same `line_key`) are ignored; rows whose dimension
/// lookup fails are counted as unmatched, never silently dropped.
pub fn insert_facts(
  conn: &Connection,
  staging: &str,
) -> rusqlite::Result<FactInsert> {
  let table = quote_ident(staging);

  let mut select = conn.prepare(&format!(
    "SELECT \"InvoiceNo\", \"StockCode\", \"CustomerID\", \"InvoiceDate\",
            \"Quantity\", \"UnitPrice\", \"LineNo\"
     FROM {table}
     WHERE \"InvoiceNo\" IS NOT NULL"
  ))?;
  let lines = select
    .query_map([], |row| {
      Ok(StagedLine {
        invoice_no:   row.get(0)?,
        stock_code:   row.get(1)?,
        customer_id:  row.get(2)?,
        invoice_date: row.get(3)?,
        quantity:     row.get(4)?,
        unit_price:   row.get(5)?,
        line_no:      row.get(6)?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  let mut product_lookup =
    conn.prepare("SELECT product_id FROM dim_products WHERE product_id = ?1")?;
  let mut customer_lookup = conn
    .prepare("SELECT customer_id FROM dim_customers WHERE customer_id = ?1")?;
  let mut time_lookup =
    conn.prepare("SELECT time_id FROM dim_time WHERE invoice_date = ?1")?;
  let mut insert = conn.prepare(
    "INSERT OR IGNORE INTO fact_sales
       (line_key, product_id, customer_id, time_id,
        quantity, unit_price, total_amount)
     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
  )?;

  let mut inserted = 0;
  let mut unmatched = 0;

  for line in lines {
    let cal = CalendarDate::from_canonical(&line.invoice_date).map_err(bad_date)?;
    let iso_date = cal.iso_date();

    let product: Option<String> = product_lookup
      .query_row(params![line.stock_code], |row| row.get(0))
      .optional()?;
    let customer: Option<i64> = customer_lookup
      .query_row(params![line.customer_id], |row| row.get(0))
      .optional()?;
    let time_id: Option<i64> = time_lookup
      .query_row(params![iso_date], |row| row.get(0))
      .optional()?;

    let (Some(product_id), Some(customer_id), Some(time_id)) =
      (product, customer, time_id)
    else {
      unmatched += 1;
      continue;
    };

    let key = line_key(
      &line.invoice_no,
      &line.stock_code,
      line.customer_id,
      &line.invoice_date,
      line.line_no,
    );
    let total = line.quantity as f64 * line.unit_price;

    inserted += insert.execute(params![
      key,
      product_id,
      customer_id,
      time_id,
      line.quantity,
      line.unit_price,
      total,
    ])?;
  }

  Ok(FactInsert {
    inserted,
    unmatched,
  })
}

/// Stable natural key for one transaction line: SHA-256 over the business
/// identifiers plus the line sequence, hex-encoded.
///
/// Keyed on content, not on the surrogate id, so reprocessing a batch after
/// a partial failure cannot duplicate business lines.
pub fn line_key(
  invoice_no: &str,
  stock_code: &str,
  customer_id: i64,
  canonical_date: &str,
  line_no: i64,
) -> String {
  let mut hasher = Sha256::new();
  hasher.update(invoice_no.as_bytes());
  hasher.update([0u8]);
  hasher.update(stock_code.as_bytes());
  hasher.update([0u8]);
  hasher.update(customer_id.to_le_bytes());
  hasher.update(canonical_date.as_bytes());
  hasher.update([0u8]);
  hasher.update(line_no.to_le_bytes());
  hex::encode(hasher.finalize())
}

// ─── Error mapping ───────────────────────────────────────────────────────────

/// A canonical date column that fails to parse is a column conversion
/// failure as far as rusqlite is concerned.
fn bad_date(e: tally_core::Error) -> rusqlite::Error {
  rusqlite::Error::FromSqlConversionFailure(
    0,
    rusqlite::types::Type::Text,
    Box::new(e),
  )
}

// ─── Tests ───────────────────────────────────────────────────────────────────
