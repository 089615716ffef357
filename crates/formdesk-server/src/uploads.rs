//! Multipart upload routes.
//!
//! | Method | Path | Fields |
//! |--------|------|--------|
//! | `POST` | `/uploads/documents` | `file`, optional `name`, required `database` |
//! | `POST` | `/uploads/csv` | `file` (must be `.csv`), optional `database` |
//!
//! Raw bytes are written under the configured upload directory as
//! `{uuid}-{sanitised filename}`; the store only records that path.

use std::path::{Path, PathBuf};

use axum::{
  Json,
  extract::{Multipart, State, multipart::MultipartRejection},
  http::StatusCode,
  response::IntoResponse,
};
use bytes::Bytes;
use formdesk_core::{
  DatabaseName,
  csv_import::CsvImport,
  document::{Document, NewDocument},
  form::Form,
  store::RecordStore,
};
use formdesk_extract::{Extraction, is_csv_filename, resolve_content_type};
use serde::Serialize;
use uuid::Uuid;

use crate::{AppState, error::Error};

// ─── Multipart parsing ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct UploadedFile {
  pub filename:     String,
  pub content_type: Option<String>,
  pub bytes:        Bytes,
}

/// The recognised parts of an upload request. Unknown parts are skipped.
#[derive(Debug, Default)]
struct UploadParts {
  file:     Option<UploadedFile>,
  name:     Option<String>,
  database: Option<String>,
}

impl UploadParts {
  async fn read(mut multipart: Multipart) -> Result<Self, Error> {
    let mut parts = UploadParts::default();
    while let Some(field) = multipart.next_field().await? {
      let part = field.name().map(str::to_owned);
      match part.as_deref() {
        Some("file") => {
          let filename = field.file_name().unwrap_or_default().to_owned();
          let content_type = field.content_type().map(str::to_owned);
          let bytes = field.bytes().await?;
          parts.file = Some(UploadedFile { filename, content_type, bytes });
        }
        Some("name") => parts.name = non_blank(field.text().await?),
        Some("database") => parts.database = non_blank(field.text().await?),
        _ => {}
      }
    }
    Ok(parts)
  }

  fn take_file(&mut self) -> Result<UploadedFile, Error> {
    let file = self
      .file
      .take()
      .ok_or_else(|| Error::BadRequest("missing `file` part".to_owned()))?;
    if file.filename.trim().is_empty() {
      return Err(Error::BadRequest("uploaded file has no filename".to_owned()));
    }
    Ok(file)
  }

  fn database(&self) -> Result<Option<DatabaseName>, Error> {
    Ok(self.database.as_deref().map(DatabaseName::parse).transpose()?)
  }
}

fn non_blank(s: String) -> Option<String> {
  let trimmed = s.trim();
  (!trimmed.is_empty()).then(|| trimmed.to_owned())
}

// ─── Disk ────────────────────────────────────────────────────────────────────

/// Reduce a client filename to a safe single path component.
pub fn sanitize_filename(filename: &str) -> String {
  let base = filename.rsplit(['/', '\\']).next().unwrap_or_default();
  let cleaned: String = base
    .chars()
    .map(|c| {
      if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
        c
      } else {
        '_'
      }
    })
    .collect();
  let cleaned = cleaned.trim_start_matches('.');
  if cleaned.is_empty() {
    "upload".to_owned()
  } else {
    cleaned.to_owned()
  }
}

async fn save(upload_dir: &Path, file: &UploadedFile) -> Result<PathBuf, Error> {
  tokio::fs::create_dir_all(upload_dir).await?;
  let path = upload_dir.join(format!(
    "{}-{}",
    Uuid::new_v4(),
    sanitize_filename(&file.filename)
  ));
  tokio::fs::write(&path, &file.bytes).await?;
  tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "stored upload");
  Ok(path)
}

/// Remove a stored file after a failed store write. Failure to remove is
/// only logged.
async fn discard(path: &Path) {
  if let Err(e) = tokio::fs::remove_file(path).await {
    tracing::warn!(path = %path.display(), error = %e, "could not remove orphaned upload");
  }
}

async fn record_document<S: RecordStore>(
  store: &S,
  path: &Path,
  file: &UploadedFile,
  display_name: Option<String>,
  database: DatabaseName,
  content_type: String,
  extraction: &Extraction,
) -> Result<Document, Error> {
  let input = NewDocument {
    filename: file.filename.clone(),
    display_name: display_name.unwrap_or_default(),
    storage_path: path.display().to_string(),
    database,
    extracted: extraction.content.clone(),
    size_bytes: file.bytes.len() as u64,
    content_type,
  };
  store.create_document(input).await.map_err(Error::from_store)
}

// ─── Handlers ────────────────────────────────────────────────────────────────

/// `POST /uploads/documents`
pub async fn upload_document<S>(
  State(state): State<AppState<S>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, Error>
where
  S: RecordStore,
{
  let mut parts = UploadParts::read(multipart?).await?;
  let file = parts.take_file()?;
  let database = parts
    .database()?
    .ok_or_else(|| Error::BadRequest("missing `database` part".to_owned()))?;

  let content_type = resolve_content_type(&file.filename, file.content_type.as_deref());
  let extraction = formdesk_extract::extract(&file.filename, &content_type, &file.bytes)?;

  let path = save(&state.config.upload_dir, &file).await?;
  let document = match record_document(
    &*state.store,
    &path,
    &file,
    parts.name.take(),
    database,
    content_type,
    &extraction,
  )
  .await
  {
    Ok(document) => document,
    Err(e) => {
      discard(&path).await;
      return Err(e);
    }
  };

  tracing::info!(
    document_id = %document.document_id,
    filename = %document.filename,
    kind = document.extracted.details.kind(),
    "uploaded document",
  );
  Ok((StatusCode::CREATED, Json(document)))
}

/// Response body for `POST /uploads/csv`.
#[derive(Debug, Serialize)]
pub struct CsvUpload {
  pub csv_import: CsvImport,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub document:   Option<Document>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub form:       Option<Form>,
}

/// `POST /uploads/csv`
///
/// With a `database` part a form is derived immediately and the upload is
/// also kept on disk as a document. Without one only the import is stored
/// and nothing is written to the upload directory.
pub async fn upload_csv<S>(
  State(state): State<AppState<S>>,
  multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, Error>
where
  S: RecordStore,
{
  let mut parts = UploadParts::read(multipart?).await?;
  let file = parts.take_file()?;
  if !is_csv_filename(&file.filename) {
    return Err(Error::BadRequest(format!(
      "{:?} is not a .csv file",
      file.filename
    )));
  }
  let database = parts.database()?;

  let content_type = resolve_content_type(&file.filename, file.content_type.as_deref());
  let extraction = formdesk_extract::extract(&file.filename, "text/csv", &file.bytes)?;
  let table = extraction.table.clone().unwrap_or_default();

  let csv_import = state
    .store
    .create_csv_import(file.filename.clone(), table.headers, table.rows)
    .await
    .map_err(Error::from_store)?;

  let form = match database {
    Some(database) if !csv_import.headers.is_empty() => Some(
      state
        .store
        .derive_form_from_csv(csv_import.csv_import_id, database)
        .await
        .map_err(Error::from_store)?,
    ),
    _ => None,
  };

  // The file only reaches disk once a document row will reference it.
  let document = match database {
    Some(database) => {
      let path = save(&state.config.upload_dir, &file).await?;
      let recorded = record_document(
        &*state.store,
        &path,
        &file,
        parts.name.take(),
        database,
        content_type,
        &extraction,
      )
      .await;
      match recorded {
        Ok(document) => Some(document),
        Err(e) => {
          discard(&path).await;
          return Err(e);
        }
      }
    }
    None => None,
  };

  // Re-read so the response reflects the flag set by derivation.
  let csv_import = match form {
    Some(_) => state
      .store
      .get_csv_import(csv_import.csv_import_id)
      .await
      .map_err(Error::from_store)?
      .unwrap_or(csv_import),
    None => csv_import,
  };

  tracing::info!(
    csv_import_id = %csv_import.csv_import_id,
    rows = csv_import.row_count(),
    columns = csv_import.column_count(),
    derived_form = form.is_some(),
    stored_document = document.is_some(),
    "uploaded csv",
  );
  Ok((StatusCode::CREATED, Json(CsvUpload { csv_import, document, form })))
}
