//! The canonical invoice-date contract and its calendar derivations.
//!
//! The transformer renders every surviving invoice date into
//! [`CANONICAL_FORMAT`]; the loader parses that exact format back when it
//! builds the time dimension. Both sides go through this module, so the one
//! bit-exact inter-stage contract cannot drift.

use chrono::{Datelike, NaiveDate, NaiveDateTime};

use crate::{Error, Result};

/// `DD/MM/YYYY hh:mm:ss AM|PM` — e.g. `05/03/2011 02:30:00 PM`.
pub const CANONICAL_FORMAT: &str = "%d/%m/%Y %I:%M:%S %p";

/// Render a datetime into the canonical staging string.
pub fn format_canonical(dt: NaiveDateTime) -> String {
  dt.format(CANONICAL_FORMAT).to_string()
}

/// Parse a canonical staging string back into a datetime.
pub fn parse_canonical(s: &str) -> Result<NaiveDateTime> {
  NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT)
    .map_err(|_| Error::BadDate(s.to_string()))
}

// ─── CalendarDate ────────────────────────────────────────────────────────────

/// One time-dimension row: a calendar date with its derived attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarDate {
  pub date:        NaiveDate,
  /// English day name, e.g. `Saturday`.
  pub day_of_week: String,
  /// English month name, e.g. `March`.
  pub month:       String,
  pub year:        i32,
  /// Quarter label `Q1`..`Q4`.
  pub quarter:     String,
}

impl CalendarDate {
  pub fn from_date(date: NaiveDate) -> Self {
    Self {
      date,
      day_of_week: date.format("%A").to_string(),
      month: date.format("%B").to_string(),
      year: date.year(),
      quarter: format!("Q{}", date.month0() / 3 + 1),
    }
  }

  /// Derive the calendar row for a canonical invoice-date string.
  pub fn from_canonical(s: &str) -> Result<Self> {
    Ok(Self::from_date(parse_canonical(s)?.date()))
  }

  /// ISO `YYYY-MM-DD` storage form of the date.
  pub fn iso_date(&self) -> String {
    self.date.format("%Y-%m-%d").to_string()
  }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
