//! SQL schema for the Tally SQLite warehouse.
//!
//! Star schema: three dimension tables around one append-only fact table.
//! Staging tables (`stg_*`) are created per batch at load time and carry no
//! constraints.

/// Per-connection pragmas, applied at open.
pub const PRAGMAS: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;
";

/// Warehouse DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS dim_customers (
    customer_id  INTEGER PRIMARY KEY,
    country      TEXT
);

CREATE TABLE IF NOT EXISTS dim_products (
    product_id   TEXT PRIMARY KEY,    -- source stock code
    description  TEXT,
    unit_price   REAL
);

-- One row per distinct calendar date across all loaded batches.
CREATE TABLE IF NOT EXISTS dim_time (
    time_id      INTEGER PRIMARY KEY AUTOINCREMENT,
    invoice_date TEXT NOT NULL UNIQUE,   -- ISO YYYY-MM-DD
    day_of_week  TEXT,
    month        TEXT,
    year         INTEGER,
    quarter      TEXT                    -- 'Q1'..'Q4'
);

-- Append-only. line_key is the stable natural key (invoice, product,
-- customer, date, line sequence) so reloading a batch inserts nothing new.
CREATE TABLE IF NOT EXISTS fact_sales (
    sales_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    line_key     TEXT NOT NULL UNIQUE,
    product_id   TEXT NOT NULL REFERENCES dim_products(product_id),
    customer_id  INTEGER NOT NULL REFERENCES dim_customers(customer_id),
    time_id      INTEGER NOT NULL REFERENCES dim_time(time_id),
    quantity     INTEGER NOT NULL,
    unit_price   REAL NOT NULL,
    total_amount REAL NOT NULL
);

CREATE INDEX IF NOT EXISTS fact_sales_product_idx  ON fact_sales(product_id);
CREATE INDEX IF NOT EXISTS fact_sales_customer_idx ON fact_sales(customer_id);
CREATE INDEX IF NOT EXISTS fact_sales_time_idx     ON fact_sales(time_id);
";
