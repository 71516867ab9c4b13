//! Core types and trait definitions for the Tally retail warehouse.
//!
//! This crate is deliberately free of database and filesystem dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod calendar;
pub mod error;
pub mod report;
pub mod row;
pub mod warehouse;

pub use error::{Error, Result};
