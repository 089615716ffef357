//! CSV imports: parsed tables kept verbatim so forms can be derived later.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One data row, keyed by header.
pub type CsvRow = BTreeMap<String, String>;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CsvImport {
  pub csv_import_id:  Uuid,
  pub filename:       String,
  /// Column headers in file order. Derived forms use this order for fields.
  pub headers:        Vec<String>,
  pub rows:           Vec<CsvRow>,
  pub uploaded_at:    DateTime<Utc>,
  /// Set the first time a form is derived from this import; never reset.
  pub form_generated: bool,
}

impl CsvImport {
  pub fn column_count(&self) -> usize { self.headers.len() }

  pub fn row_count(&self) -> usize { self.rows.len() }
}
