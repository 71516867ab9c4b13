//! Integration tests for `SqliteWarehouse` against an in-memory database.

use tally_core::{
  row::{CleanBatch, CleanRow},
  warehouse::Warehouse,
};

use crate::{Error, SqliteWarehouse};

async fn warehouse() -> SqliteWarehouse {
  let w = SqliteWarehouse::open_in_memory()
    .await
    .expect("in-memory warehouse");
  w.ensure_schema().await.expect("schema");
  w
}

fn row(
  stock_code: &str,
  quantity: i64,
  date: &str,
  unit_price: f64,
  customer_id: i64,
  line_no: u32,
) -> CleanRow {
  CleanRow {
    invoice_no: "536365".to_string(),
    stock_code: stock_code.to_string(),
    description: format!("PRODUCT {stock_code}"),
    quantity,
    invoice_date: date.to_string(),
    unit_price,
    customer_id,
    country: "United Kingdom".to_string(),
    line_no,
  }
}

fn batch(name: &str, rows: Vec<CleanRow>) -> CleanBatch {
  CleanBatch {
    name: name.to_string(),
    rows,
  }
}

// ─── Schema ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn ensure_schema_is_idempotent() {
  let w = warehouse().await;
  w.ensure_schema().await.unwrap();
  w.ensure_schema().await.unwrap();

  let names: Vec<String> =
    w.list_tables().await.unwrap().into_iter().map(|t| t.name).collect();
  assert_eq!(
    names,
    ["dim_customers", "dim_products", "dim_time", "fact_sales"]
  );
}

// ─── Loading ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn single_row_batch_produces_one_fact() {
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1)],
  );

  let summary = w.load_batch(&b).await.unwrap();
  assert_eq!(summary.staged, 1);
  assert_eq!(summary.dimensions.customers, 1);
  assert_eq!(summary.dimensions.products, 1);
  assert_eq!(summary.dimensions.dates, 1);
  assert_eq!(summary.facts.inserted, 1);
  assert_eq!(summary.facts.unmatched, 0);

  // total_amount = quantity * unit_price, exactly.
  let activity = w.customer_activity().await.unwrap();
  assert_eq!(activity.len(), 1);
  assert_eq!(activity[0].customer_id, 17850);
  assert_eq!(activity[0].total_spent, 25.0);
  assert_eq!(activity[0].purchases, 1);
}

#[tokio::test]
async fn reloading_a_batch_inserts_nothing() {
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![
      row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1),
      row("22632", 3, "01/12/2010 09:41:00 AM", 1.85, 17850, 2),
    ],
  );

  w.load_batch(&b).await.unwrap();
  let second = w.load_batch(&b).await.unwrap();

  assert_eq!(second.dimensions.customers, 0);
  assert_eq!(second.dimensions.products, 0);
  assert_eq!(second.dimensions.dates, 0);
  assert_eq!(second.facts.inserted, 0);
  assert_eq!(second.facts.unmatched, 0);
}

#[tokio::test]
async fn shared_customer_across_batches_is_stored_once() {
  let w = warehouse().await;
  let first = batch(
    "january",
    vec![row("85123A", 10, "05/01/2011 10:00:00 AM", 2.5, 1001, 1)],
  );
  let second = batch(
    "february",
    vec![row("22632", 4, "07/02/2011 11:00:00 AM", 1.85, 1001, 1)],
  );

  w.load_batch(&first).await.unwrap();
  let summary = w.load_batch(&second).await.unwrap();
  assert_eq!(summary.dimensions.customers, 0); // 1001 already present

  let activity = w.customer_activity().await.unwrap();
  assert_eq!(activity.len(), 1);
  assert_eq!(activity[0].purchases, 2);
}

#[tokio::test]
async fn repeated_identical_lines_stay_distinct() {
  // Two legitimate lines with the same product/customer/instant differ only
  // by line sequence; both must load.
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![
      row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1),
      row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 2),
    ],
  );

  let summary = w.load_batch(&b).await.unwrap();
  assert_eq!(summary.facts.inserted, 2);
}

#[tokio::test]
async fn distinct_times_on_one_date_share_a_time_row() {
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![
      row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1),
      row("22632", 3, "01/12/2010 03:45:00 PM", 1.85, 17850, 2),
    ],
  );

  let summary = w.load_batch(&b).await.unwrap();
  assert_eq!(summary.dimensions.dates, 1);
  assert_eq!(summary.facts.inserted, 2);
}

#[tokio::test]
async fn facts_without_dimensions_are_counted_unmatched() {
  let w = warehouse().await;
  let b = batch(
    "orphan",
    vec![row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1)],
  );

  // Stage only; skip populate_dimensions so every lookup fails.
  let staging = w.stage(&b).await.unwrap();
  let facts = w.populate_facts(&staging).await.unwrap();

  assert_eq!(facts.inserted, 0);
  assert_eq!(facts.unmatched, 1);
}

#[tokio::test]
async fn restaging_replaces_previous_contents() {
  let w = warehouse().await;
  let original = batch(
    "retail",
    vec![row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 1111, 1)],
  );
  let replacement = batch(
    "retail",
    vec![row("22632", 3, "01/12/2010 09:41:00 AM", 1.85, 2222, 1)],
  );

  w.stage(&original).await.unwrap();
  let staging = w.stage(&replacement).await.unwrap();
  w.populate_dimensions(&staging).await.unwrap();
  let facts = w.populate_facts(&staging).await.unwrap();

  // Had the first staging survived, customer 1111 would be an unmatched row.
  assert_eq!(facts.inserted, 1);
  assert_eq!(facts.unmatched, 0);

  let activity = w.customer_activity().await.unwrap();
  assert_eq!(activity.len(), 1);
  assert_eq!(activity[0].customer_id, 2222);
}

#[tokio::test]
async fn batch_name_with_no_alphanumerics_is_rejected() {
  let w = warehouse().await;
  let b = batch("..", vec![]);
  let err = w.load_batch(&b).await.unwrap_err();
  assert!(matches!(err, Error::InvalidIdentifier(_)));
}

// ─── Integrity scan ──────────────────────────────────────────────────────────

#[tokio::test]
async fn null_scan_reports_every_column() {
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![row("85123A", 10, "01/12/2010 08:26:00 AM", 2.5, 17850, 1)],
  );
  w.load_batch(&b).await.unwrap();

  let report = w.scan_for_nulls().await.unwrap();

  // Every column of every table appears, zero-null columns included.
  let tables: std::collections::BTreeSet<_> =
    report.iter().map(|c| c.table.as_str()).collect();
  assert!(tables.contains("dim_customers"));
  assert!(tables.contains("dim_products"));
  assert!(tables.contains("dim_time"));
  assert!(tables.contains("fact_sales"));
  assert!(tables.contains("stg_retail"));
  assert!(report.iter().all(|c| c.nulls == 0));
}

#[tokio::test]
async fn null_scan_counts_injected_nulls() {
  let dir = tempfile::tempdir().unwrap();
  let path = dir.path().join("warehouse.db");

  let w = SqliteWarehouse::open(&path).await.unwrap();
  w.ensure_schema().await.unwrap();

  // Inject a null through a second raw connection on the same file.
  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute(
      "INSERT INTO dim_customers (customer_id, country) VALUES (9999, NULL)",
      [],
    )
    .unwrap();
  drop(raw);

  let report = w.scan_for_nulls().await.unwrap();
  let country = report
    .iter()
    .find(|c| c.table == "dim_customers" && c.column == "country")
    .unwrap();
  assert_eq!(country.nulls, 1);

  let others_clean = report
    .iter()
    .filter(|c| !(c.table == "dim_customers" && c.column == "country"))
    .all(|c| c.nulls == 0);
  assert!(others_clean);
}

// ─── Collaborator reads ──────────────────────────────────────────────────────

#[tokio::test]
async fn monthly_sales_is_chronological() {
  let w = warehouse().await;
  let b = batch(
    "retail",
    vec![
      row("85123A", 2, "15/03/2011 10:00:00 AM", 5.0, 17850, 1),
      row("85123A", 1, "20/12/2010 10:00:00 AM", 5.0, 17850, 2),
      row("85123A", 3, "10/01/2011 10:00:00 AM", 5.0, 17850, 3),
    ],
  );
  w.load_batch(&b).await.unwrap();

  let months = w.monthly_sales().await.unwrap();
  let labels: Vec<_> =
    months.iter().map(|m| (m.year, m.month.as_str())).collect();
  assert_eq!(
    labels,
    [(2010, "December"), (2011, "January"), (2011, "March")]
  );
  assert_eq!(months[0].total_sales, 5.0);
  assert_eq!(months[1].total_sales, 15.0);
  assert_eq!(months[2].total_sales, 10.0);
}
