//! CSV parsing into header-keyed rows.

use std::collections::HashSet;

use formdesk_core::csv_import::CsvRow;

use crate::Result;

/// A parsed CSV file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CsvTable {
  /// Trimmed header cells in file order. Blank cells are named
  /// `column_<n>` (1-based) and repeats get a `_2`, `_3`, ... suffix, so
  /// every column has its own key.
  pub headers: Vec<String>,
  /// One map per data record, keyed by header.
  pub rows:    Vec<CsvRow>,
}

/// Parse `bytes` as a CSV file with a header record.
///
/// Records may be ragged: missing trailing cells become empty strings and
/// surplus cells are dropped. Invalid UTF-8 is replaced rather than rejected.
pub fn parse_csv(bytes: &[u8]) -> Result<CsvTable> {
  let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);

  let mut reader = csv::ReaderBuilder::new()
    .flexible(true)
    .trim(csv::Trim::All)
    .from_reader(bytes);

  let headers = unique_headers(
    reader
      .byte_headers()?
      .iter()
      .enumerate()
      .map(|(i, cell)| {
        let cell = String::from_utf8_lossy(cell).trim().to_owned();
        if cell.is_empty() { format!("column_{}", i + 1) } else { cell }
      }),
  );

  if headers.is_empty() {
    return Ok(CsvTable::default());
  }

  let mut rows = Vec::new();
  for record in reader.byte_records() {
    let record = record?;
    let row: CsvRow = headers
      .iter()
      .enumerate()
      .map(|(i, header)| {
        let value = record
          .get(i)
          .map(|cell| String::from_utf8_lossy(cell).into_owned())
          .unwrap_or_default();
        (header.clone(), value)
      })
      .collect();
    rows.push(row);
  }

  Ok(CsvTable { headers, rows })
}

/// Suffix repeated names with `_2`, `_3`, ... until each one is free.
fn unique_headers(names: impl Iterator<Item = String>) -> Vec<String> {
  let mut taken = HashSet::new();
  names
    .map(|name| {
      let mut candidate = name.clone();
      let mut n = 2;
      while taken.contains(&candidate) {
        candidate = format!("{name}_{n}");
        n += 1;
      }
      taken.insert(candidate.clone());
      candidate
    })
    .collect()
}
