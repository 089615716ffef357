//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as fixed-width RFC 3339 strings (microseconds, `Z`)
//! so that lexical order equals chronological order. Structured fields
//! (extraction results, field lists, provenance, payloads) are stored as
//! compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, SubsecRound as _, Utc};
use formdesk_core::{
  DatabaseName,
  csv_import::{CsvImport, CsvRow},
  document::{Document, DocumentStatus, ExtractedContent},
  form::{FieldDescriptor, Form, Provenance},
  submission::{Payload, Submission},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ─────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

/// The current time at the precision the store persists.
pub fn now() -> DateTime<Utc> { Utc::now().trunc_subsecs(6) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── DatabaseName ────────────────────────────────────────────────────────────

pub fn encode_database(db: DatabaseName) -> String { db.as_str().to_owned() }

pub fn decode_database(s: &str) -> Result<DatabaseName> {
  DatabaseName::parse(s)
    .map_err(|_| Error::Decode(format!("unknown database name: {s:?}")))
}

// ─── DocumentStatus ──────────────────────────────────────────────────────────

pub fn encode_status(status: DocumentStatus) -> &'static str {
  match status {
    DocumentStatus::Uploaded => "uploaded",
    DocumentStatus::Processed => "processed",
  }
}

pub fn decode_status(s: &str) -> Result<DocumentStatus> {
  match s {
    "uploaded" => Ok(DocumentStatus::Uploaded),
    "processed" => Ok(DocumentStatus::Processed),
    other => Err(Error::Decode(format!("unknown document status: {other:?}"))),
  }
}

// ─── Counters ────────────────────────────────────────────────────────────────

pub fn encode_count(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

pub fn decode_count(n: i64) -> u64 { u64::try_from(n).unwrap_or(0) }

// ─── JSON columns ────────────────────────────────────────────────────────────

pub fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String> {
  Ok(serde_json::to_string(value)?)
}

fn decode_json<T: serde::de::DeserializeOwned>(s: &str) -> Result<T> {
  Ok(serde_json::from_str(s)?)
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from a `documents` row.
pub struct RawDocument {
  pub document_id:    String,
  pub filename:       String,
  pub display_name:   String,
  pub storage_path:   String,
  pub database_name:  String,
  pub extracted_json: String,
  pub uploaded_at:    String,
  pub status:         String,
  pub size_bytes:     i64,
  pub content_type:   String,
}

impl RawDocument {
  pub const COLUMNS: &'static str = "document_id, filename, display_name, \
    storage_path, database_name, extracted_json, uploaded_at, status, \
    size_bytes, content_type";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      document_id:    row.get(0)?,
      filename:       row.get(1)?,
      display_name:   row.get(2)?,
      storage_path:   row.get(3)?,
      database_name:  row.get(4)?,
      extracted_json: row.get(5)?,
      uploaded_at:    row.get(6)?,
      status:         row.get(7)?,
      size_bytes:     row.get(8)?,
      content_type:   row.get(9)?,
    })
  }

  pub fn into_document(self) -> Result<Document> {
    let extracted: ExtractedContent = decode_json(&self.extracted_json)?;
    Ok(Document {
      document_id: decode_uuid(&self.document_id)?,
      filename: self.filename,
      display_name: self.display_name,
      storage_path: self.storage_path,
      database: decode_database(&self.database_name)?,
      extracted,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      status: decode_status(&self.status)?,
      size_bytes: decode_count(self.size_bytes),
      content_type: self.content_type,
    })
  }
}

/// Raw strings read directly from a `csv_imports` row.
pub struct RawCsvImport {
  pub csv_import_id:  String,
  pub filename:       String,
  pub headers_json:   String,
  pub rows_json:      String,
  pub uploaded_at:    String,
  pub form_generated: bool,
}

impl RawCsvImport {
  pub const COLUMNS: &'static str =
    "csv_import_id, filename, headers_json, rows_json, uploaded_at, form_generated";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      csv_import_id:  row.get(0)?,
      filename:       row.get(1)?,
      headers_json:   row.get(2)?,
      rows_json:      row.get(3)?,
      uploaded_at:    row.get(4)?,
      form_generated: row.get(5)?,
    })
  }

  pub fn into_csv_import(self) -> Result<CsvImport> {
    let headers: Vec<String> = decode_json(&self.headers_json)?;
    let rows: Vec<CsvRow> = decode_json(&self.rows_json)?;
    Ok(CsvImport {
      csv_import_id: decode_uuid(&self.csv_import_id)?,
      filename: self.filename,
      headers,
      rows,
      uploaded_at: decode_dt(&self.uploaded_at)?,
      form_generated: self.form_generated,
    })
  }
}

/// Raw strings read directly from a `forms` row.
pub struct RawForm {
  pub form_id:          String,
  pub name:             String,
  pub fields_json:      String,
  pub database_name:    String,
  pub provenance:       String,
  pub created_at:       String,
  pub submission_count: i64,
}

impl RawForm {
  pub const COLUMNS: &'static str = "form_id, name, fields_json, database_name, \
    provenance, created_at, submission_count";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      form_id:          row.get(0)?,
      name:             row.get(1)?,
      fields_json:      row.get(2)?,
      database_name:    row.get(3)?,
      provenance:       row.get(4)?,
      created_at:       row.get(5)?,
      submission_count: row.get(6)?,
    })
  }

  pub fn into_form(self) -> Result<Form> {
    let form_id = decode_uuid(&self.form_id)?;
    let fields: Vec<FieldDescriptor> = decode_json(&self.fields_json)?;
    let provenance: Provenance = decode_json(&self.provenance)?;
    Ok(Form {
      form_id,
      name: self.name,
      fields,
      database: decode_database(&self.database_name)?,
      public_path: Form::public_path_for(form_id),
      created_at: decode_dt(&self.created_at)?,
      provenance,
      submission_count: decode_count(self.submission_count),
    })
  }
}

/// Raw strings read directly from a `submissions` row.
pub struct RawSubmission {
  pub submission_id:  i64,
  pub form_id:        String,
  pub payload_json:   String,
  pub submitted_at:   String,
  pub client_address: Option<String>,
}

impl RawSubmission {
  pub const COLUMNS: &'static str =
    "submission_id, form_id, payload_json, submitted_at, client_address";

  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      submission_id:  row.get(0)?,
      form_id:        row.get(1)?,
      payload_json:   row.get(2)?,
      submitted_at:   row.get(3)?,
      client_address: row.get(4)?,
    })
  }

  pub fn into_submission(self) -> Result<Submission> {
    let payload: Payload = decode_json(&self.payload_json)?;
    Ok(Submission {
      submission_id: self.submission_id,
      form_id: decode_uuid(&self.form_id)?,
      payload,
      submitted_at: decode_dt(&self.submitted_at)?,
      client_address: self.client_address,
    })
  }
}
