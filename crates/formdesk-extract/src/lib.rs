//! Content extraction for uploaded files.
//!
//! Two kinds of file are read: CSV, which is parsed into a header-keyed
//! table, and plain text. Everything else is stored as-is and reported as
//! unsupported.
//!
//! # Example
//!
//! ```rust
//! let out = formdesk_extract::extract("notes.txt", "text/plain", b"a\nb\n").unwrap();
//! assert!(out.content.processed);
//! assert!(out.table.is_none());
//! ```

pub mod error;
mod table;

use chrono::{SubsecRound as _, Utc};
pub use error::{Error, Result};
use formdesk_core::document::{ExtractedContent, ExtractionDetails};
pub use table::{CsvTable, parse_csv};

const OCTET_STREAM: &str = "application/octet-stream";

const TEXT_EXTENSIONS: &[&str] = &["txt", "md", "json", "log", "xml"];
const TEXT_APPLICATION_TYPES: &[&str] = &["application/json", "application/xml"];
const CSV_TYPES: &[&str] = &["text/csv", "application/csv"];

/// Output of [`extract`].
#[derive(Debug, Clone)]
pub struct Extraction {
  pub content: ExtractedContent,
  /// Present only for CSV input.
  pub table:   Option<CsvTable>,
}

/// The kind of reader chosen for a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
  Csv,
  Text,
  Other,
}

fn extension(filename: &str) -> Option<String> {
  std::path::Path::new(filename)
    .extension()
    .and_then(|e| e.to_str())
    .map(str::to_ascii_lowercase)
}

/// Strip parameters such as `; charset=utf-8` and lowercase.
fn essence(content_type: &str) -> String {
  content_type
    .split(';')
    .next()
    .unwrap_or_default()
    .trim()
    .to_ascii_lowercase()
}

fn classify(filename: &str, content_type: &str) -> Kind {
  let ext = extension(filename);
  let mime = essence(content_type);

  if ext.as_deref() == Some("csv") || CSV_TYPES.contains(&mime.as_str()) {
    return Kind::Csv;
  }
  if mime.starts_with("text/")
    || TEXT_APPLICATION_TYPES.contains(&mime.as_str())
    || ext.as_deref().is_some_and(|e| TEXT_EXTENSIONS.contains(&e))
  {
    return Kind::Text;
  }
  Kind::Other
}

/// Whether `filename` names a CSV file by extension.
pub fn is_csv_filename(filename: &str) -> bool {
  extension(filename).as_deref() == Some("csv")
}

/// The content type to record for an upload.
///
/// A declared type wins unless it is blank or the generic octet-stream,
/// in which case the type is guessed from the filename.
pub fn resolve_content_type(filename: &str, declared: Option<&str>) -> String {
  match declared.map(str::trim) {
    Some(d) if !d.is_empty() && essence(d) != OCTET_STREAM => d.to_owned(),
    _ => mime_guess::from_path(filename)
      .first()
      .map(|m| m.essence_str().to_owned())
      .unwrap_or_else(|| OCTET_STREAM.to_owned()),
  }
}

/// Read `bytes` according to the file's name and content type.
///
/// Fails only when a CSV file cannot be parsed.
pub fn extract(filename: &str, content_type: &str, bytes: &[u8]) -> Result<Extraction> {
  let extracted_at = Utc::now().trunc_subsecs(6);

  match classify(filename, content_type) {
    Kind::Csv => {
      let table = parse_csv(bytes)?;
      let content = ExtractedContent {
        text: String::from_utf8_lossy(bytes).into_owned(),
        processed: true,
        extracted_at,
        details: ExtractionDetails::Csv {
          rows:    table.rows.len(),
          columns: table.headers.len(),
          headers: table.headers.clone(),
        },
      };
      Ok(Extraction { content, table: Some(table) })
    }
    Kind::Text => {
      let text = String::from_utf8_lossy(bytes).into_owned();
      let details = ExtractionDetails::Text {
        characters: text.chars().count(),
        lines:      text.lines().count(),
      };
      let content = ExtractedContent { text, processed: true, extracted_at, details };
      Ok(Extraction { content, table: None })
    }
    Kind::Other => {
      let content = ExtractedContent {
        text: String::new(),
        processed: false,
        extracted_at,
        details: ExtractionDetails::Unsupported {
          reason: format!("no extractor for content type {content_type}"),
        },
      };
      Ok(Extraction { content, table: None })
    }
  }
}
