//! [`SqliteWarehouse`] — the SQLite implementation of [`Warehouse`].

use std::path::Path;

use tally_core::{
  report::{
    CustomerActivity, DimensionCounts, FactCounts, LoadSummary, MonthlySales,
    NullCount, TableInfo,
  },
  row::CleanBatch,
  warehouse::Warehouse,
};

use crate::{
  Error, Result,
  ident::{quote_ident, staging_table_name},
  schema::{PRAGMAS, SCHEMA},
  sql,
};

// ─── Warehouse ───────────────────────────────────────────────────────────────

/// A Tally warehouse backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted. The handle
/// is only ever driven by one pipeline step at a time; dimension upserts use
/// `INSERT OR IGNORE`, so even concurrent loaders with their own connections
/// cannot duplicate keys.
#[derive(Clone)]
pub struct SqliteWarehouse {
  conn: tokio_rusqlite::Connection,
}

impl SqliteWarehouse {
  /// Open (or create) a warehouse at `path` and apply connection pragmas.
  /// Table creation is deferred to [`Warehouse::ensure_schema`].
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  /// Open an in-memory warehouse — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.apply_pragmas().await?;
    Ok(store)
  }

  async fn apply_pragmas(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(PRAGMAS)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Enumerate warehouse tables with their columns, in name order.
  /// Shared by the catalog listing and the null scan.
  async fn catalog(&self) -> Result<Vec<TableInfo>, tokio_rusqlite::Error> {
    self
      .conn
      .call(|conn| {
        let mut tables_stmt = conn.prepare(
          "SELECT name FROM sqlite_master
           WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
           ORDER BY name",
        )?;
        let names = tables_stmt
          .query_map([], |row| row.get::<_, String>(0))?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut infos = Vec::with_capacity(names.len());
        for name in names {
          let mut cols_stmt =
            conn.prepare("SELECT name FROM pragma_table_info(?1)")?;
          let columns = cols_stmt
            .query_map([&name], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
          infos.push(TableInfo { name, columns });
        }
        Ok(infos)
      })
      .await
  }
}

// ─── Warehouse impl ──────────────────────────────────────────────────────────

impl Warehouse for SqliteWarehouse {
  type Error = Error;

  async fn ensure_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::Schema)?;
    tracing::debug!("warehouse schema ensured");
    Ok(())
  }

  // ── Per-batch load steps ──────────────────────────────────────────────

  async fn stage(&self, batch: &CleanBatch) -> Result<String> {
    let staging = staging_table_name(&batch.name)?;
    let rows = batch.rows.clone();

    let table = staging.clone();
    self
      .conn
      .call(move |conn| {
        sql::stage_rows(conn, &table, &rows)?;
        Ok(())
      })
      .await
      .map_err(|source| Error::Load {
        batch: batch.name.clone(),
        source,
      })?;

    Ok(staging)
  }

  async fn populate_dimensions(&self, staging: &str) -> Result<DimensionCounts> {
    let table = staging.to_string();
    let counts = self
      .conn
      .call(move |conn| {
        Ok(DimensionCounts {
          customers: sql::insert_customers(conn, &table)?,
          products:  sql::insert_products(conn, &table)?,
          dates:     sql::insert_time(conn, &table)?,
        })
      })
      .await
      .map_err(|source| Error::Load {
        batch: staging.to_string(),
        source,
      })?;
    Ok(counts)
  }

  async fn populate_facts(&self, staging: &str) -> Result<FactCounts> {
    let table = staging.to_string();
    let outcome = self
      .conn
      .call(move |conn| Ok(sql::insert_facts(conn, &table)?))
      .await
      .map_err(|source| Error::Load {
        batch: staging.to_string(),
        source,
      })?;
    Ok(FactCounts {
      inserted:  outcome.inserted,
      unmatched: outcome.unmatched,
    })
  }

  async fn load_batch(&self, batch: &CleanBatch) -> Result<LoadSummary> {
    let staging = staging_table_name(&batch.name)?;
    let name = batch.name.clone();
    let rows = batch.rows.clone();

    let (staged, dimensions, facts) = self
      .conn
      .call(move |conn| {
        // One transaction per batch: a failure in any sub-step rolls back
        // staging, dimensions, and facts together.
        let tx = conn.transaction()?;

        let staged = sql::stage_rows(&tx, &staging, &rows)?;
        let dimensions = DimensionCounts {
          customers: sql::insert_customers(&tx, &staging)?,
          products:  sql::insert_products(&tx, &staging)?,
          dates:     sql::insert_time(&tx, &staging)?,
        };
        let fact_insert = sql::insert_facts(&tx, &staging)?;

        tx.commit()?;
        Ok((staged, dimensions, fact_insert))
      })
      .await
      .map_err(|source| Error::Load {
        batch: batch.name.clone(),
        source,
      })?;

    if facts.unmatched > 0 {
      tracing::warn!(
        batch = %name,
        unmatched = facts.unmatched,
        "staging rows failed dimension lookup"
      );
    }

    Ok(LoadSummary {
      batch: name,
      staged,
      dimensions,
      facts: FactCounts {
        inserted:  facts.inserted,
        unmatched: facts.unmatched,
      },
    })
  }

  // ── Data-quality gate ─────────────────────────────────────────────────

  async fn scan_for_nulls(&self) -> Result<Vec<NullCount>> {
    let catalog = self.catalog().await.map_err(Error::Integrity)?;

    let report = self
      .conn
      .call(move |conn| {
        let mut report = Vec::new();
        for table in &catalog {
          let qtable = quote_ident(&table.name);
          for column in &table.columns {
            let qcolumn = quote_ident(column);
            let nulls: i64 = conn.query_row(
              &format!(
                "SELECT COUNT(*) FROM {qtable} WHERE {qcolumn} IS NULL"
              ),
              [],
              |row| row.get(0),
            )?;
            report.push(NullCount {
              table:  table.name.clone(),
              column: column.clone(),
              nulls,
            });
          }
        }
        Ok(report)
      })
      .await
      .map_err(Error::Integrity)?;

    Ok(report)
  }

  async fn list_tables(&self) -> Result<Vec<TableInfo>> {
    Ok(self.catalog().await?)
  }

  // ── Collaborator reads ────────────────────────────────────────────────

  async fn customer_activity(&self) -> Result<Vec<CustomerActivity>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT c.customer_id,
                  SUM(f.total_amount) AS total_spent,
                  COUNT(f.sales_id)   AS purchases
           FROM fact_sales f
           JOIN dim_customers c ON f.customer_id = c.customer_id
           GROUP BY c.customer_id
           ORDER BY c.customer_id",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(CustomerActivity {
              customer_id: row.get(0)?,
              total_spent: row.get(1)?,
              purchases:   row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }

  async fn monthly_sales(&self) -> Result<Vec<MonthlySales>> {
    let rows = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT t.year, t.month, SUM(f.total_amount) AS total_sales
           FROM fact_sales f
           JOIN dim_time t ON f.time_id = t.time_id
           GROUP BY t.year, t.month
           ORDER BY t.year, MIN(t.invoice_date)",
        )?;
        let rows = stmt
          .query_map([], |row| {
            Ok(MonthlySales {
              year:        row.get(0)?,
              month:       row.get(1)?,
              total_sales: row.get(2)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(rows)
  }
}
