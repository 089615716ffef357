//! Uploaded documents and the content extracted from them.
//!
//! Raw bytes never live in the store; a document carries only the location
//! the upload handler wrote them to, plus whatever text the extractor could
//! pull out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DatabaseName, Error, Result};

// ─── Extraction ──────────────────────────────────────────────────────────────

/// Type-specific facts gathered while extracting a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExtractionDetails {
  Text {
    characters: usize,
    lines:      usize,
  },
  Csv {
    rows:    usize,
    columns: usize,
    headers: Vec<String>,
  },
  /// The file was stored but its content was not read.
  Unsupported { reason: String },
}

impl ExtractionDetails {
  /// Short type label, e.g. `"csv"`.
  pub fn kind(&self) -> &'static str {
    match self {
      Self::Text { .. } => "text",
      Self::Csv { .. } => "csv",
      Self::Unsupported { .. } => "unsupported",
    }
  }
}

/// What the extractor produced for a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedContent {
  pub text:         String,
  pub processed:    bool,
  pub extracted_at: DateTime<Utc>,
  pub details:      ExtractionDetails,
}

// ─── Status ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
  /// Stored, but nothing was extracted.
  Uploaded,
  /// Stored and its content extracted.
  Processed,
}

impl DocumentStatus {
  /// The status a document is created with, given its extraction result.
  pub fn for_extraction(extracted: &ExtractedContent) -> Self {
    if extracted.processed {
      Self::Processed
    } else {
      Self::Uploaded
    }
  }
}

// ─── Document ────────────────────────────────────────────────────────────────

/// An uploaded file. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
  pub document_id:  Uuid,
  /// The filename the client sent.
  pub filename:     String,
  pub display_name: String,
  /// Where the upload handler put the bytes.
  pub storage_path: String,
  pub database:     DatabaseName,
  pub extracted:    ExtractedContent,
  pub uploaded_at:  DateTime<Utc>,
  pub status:       DocumentStatus,
  pub size_bytes:   u64,
  pub content_type: String,
}

/// Input to [`crate::store::RecordStore::create_document`].
/// The id, `uploaded_at` and `status` are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewDocument {
  pub filename:     String,
  pub display_name: String,
  pub storage_path: String,
  pub database:     DatabaseName,
  pub extracted:    ExtractedContent,
  pub size_bytes:   u64,
  pub content_type: String,
}

impl NewDocument {
  /// Reject blank filenames and storage locations, and fill in the display
  /// name from the filename when none was given.
  pub fn validate(mut self) -> Result<Self> {
    if self.filename.trim().is_empty() {
      return Err(Error::Validation("document filename is required".into()));
    }
    if self.storage_path.trim().is_empty() {
      return Err(Error::Validation(
        "document storage location is required".into(),
      ));
    }
    if self.display_name.trim().is_empty() {
      self.display_name = self.filename.clone();
    }
    Ok(self)
  }
}
