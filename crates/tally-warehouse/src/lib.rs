//! SQLite backend for the Tally warehouse.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Implements the
//! [`tally_core::warehouse::Warehouse`] trait: idempotent schema creation,
//! per-batch staging, dimension/fact population, the null-scan integrity
//! gate, and the collaborator read queries.

mod ident;
mod schema;
mod sql;
mod warehouse;

pub mod error;

pub use error::{Error, Result};
pub use warehouse::SqliteWarehouse;

#[cfg(test)]
mod tests;
