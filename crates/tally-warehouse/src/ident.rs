//! Identifier handling for the one dynamic name in the warehouse: the
//! per-batch staging table.
//!
//! Values always travel through bind parameters; identifiers cannot, so the
//! staging name is rewritten onto a strict `[a-z0-9_]` alphabet and then
//! double-quoted. Catalog-sourced names used by the integrity scan are
//! quoted the same way.

use crate::error::{Error, Result};

/// The prefix marking a table as per-batch staging.
pub const STAGING_PREFIX: &str = "stg_";

/// Derive the staging table name for a batch: `stg_` plus the batch name
/// lowercased with every non-alphanumeric character replaced by `_`.
///
/// A name with no alphanumeric characters at all is rejected — there is
/// nothing left to identify the batch by.
pub fn staging_table_name(batch: &str) -> Result<String> {
  let mut name = String::with_capacity(STAGING_PREFIX.len() + batch.len());
  name.push_str(STAGING_PREFIX);

  let mut has_alnum = false;
  for c in batch.chars() {
    if c.is_ascii_alphanumeric() {
      name.push(c.to_ascii_lowercase());
      has_alnum = true;
    } else {
      name.push('_');
    }
  }

  if !has_alnum {
    return Err(Error::InvalidIdentifier(batch.to_string()));
  }
  Ok(name)
}

/// Double-quote an identifier for direct inclusion in SQL text, doubling any
/// embedded quotes.
pub fn quote_ident(name: &str) -> String {
  format!("\"{}\"", name.replace('"', "\"\""))
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plain_stem_passes_through() {
    assert_eq!(
      staging_table_name("online_retail_2011").unwrap(),
      "stg_online_retail_2011"
    );
  }

  #[test]
  fn hostile_characters_are_rewritten() {
    assert_eq!(
      staging_table_name("Retail; DROP TABLE fact_sales--").unwrap(),
      "stg_retail__drop_table_fact_sales__"
    );
  }

  #[test]
  fn empty_alphabet_is_rejected() {
    assert!(matches!(
      staging_table_name("../.."),
      Err(Error::InvalidIdentifier(_))
    ));
  }

  #[test]
  fn quoting_doubles_embedded_quotes() {
    assert_eq!(quote_ident("a\"b"), "\"a\"\"b\"");
  }
}
