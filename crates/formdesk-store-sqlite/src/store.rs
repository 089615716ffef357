//! [`SqliteStore`], the SQLite implementation of [`RecordStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use formdesk_core::{
  DatabaseName, Error as CoreError,
  csv_import::{CsvImport, CsvRow},
  document::{Document, DocumentStatus, NewDocument},
  form::{Form, FormUpdate, NewForm, Provenance, derived_form_name, fields_from_headers},
  store::RecordStore,
  submission::{Payload, Submission},
};

use crate::{
  Error, Result,
  encode::{
    RawCsvImport, RawDocument, RawForm, RawSubmission, decode_count, encode_count,
    encode_database, encode_dt, encode_json, encode_status, encode_uuid, now,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A formdesk record store backed by SQLite, either a file or process memory.
///
/// Cloning is cheap; the inner connection is reference-counted. All clones
/// share the single connection thread, which serialises every call.
#[derive(Clone)]
pub struct SqliteStore {
  conn:       tokio_rusqlite::Connection,
  persistent: bool,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, persistent: true };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store. Everything is lost when the last clone is
  /// dropped.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, persistent: false };
    store.init_schema().await?;
    Ok(store)
  }

  /// Whether records survive a process restart.
  pub fn is_persistent(&self) -> bool { self.persistent }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Insert a fully-built [`Form`]. When `source_csv` is set, the import's
  /// `form_generated` flag is set in the same transaction; `false` is
  /// returned if the import does not exist, and nothing is written.
  async fn insert_form(&self, form: &Form, source_csv: Option<Uuid>) -> Result<bool> {
    let form_id_str    = encode_uuid(form.form_id);
    let name           = form.name.clone();
    let fields_json    = encode_json(&form.fields)?;
    let database_str   = encode_database(form.database);
    let provenance_str = encode_json(&form.provenance)?;
    let created_at_str = encode_dt(form.created_at);
    let count          = encode_count(form.submission_count);
    let csv_id_str     = source_csv.map(encode_uuid);

    let inserted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        if let Some(csv_id) = csv_id_str {
          let flagged = tx.execute(
            "UPDATE csv_imports SET form_generated = 1 WHERE csv_import_id = ?1",
            rusqlite::params![csv_id],
          )?;
          if flagged == 0 {
            return Ok(false);
          }
        }

        tx.execute(
          "INSERT INTO forms (
             form_id, name, fields_json, database_name,
             provenance, created_at, submission_count
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
          rusqlite::params![
            form_id_str,
            name,
            fields_json,
            database_str,
            provenance_str,
            created_at_str,
            count,
          ],
        )?;

        tx.commit()?;
        Ok(true)
      })
      .await?;

    Ok(inserted)
  }
}

// ─── RecordStore impl ────────────────────────────────────────────────────────

impl RecordStore for SqliteStore {
  type Error = Error;

  // ── Documents ─────────────────────────────────────────────────────────────

  async fn create_document(&self, input: NewDocument) -> Result<Document> {
    let input = input.validate()?;

    let document = Document {
      document_id:  Uuid::new_v4(),
      status:       DocumentStatus::for_extraction(&input.extracted),
      filename:     input.filename,
      display_name: input.display_name,
      storage_path: input.storage_path,
      database:     input.database,
      extracted:    input.extracted,
      uploaded_at:  now(),
      size_bytes:   input.size_bytes,
      content_type: input.content_type,
    };

    let id_str         = encode_uuid(document.document_id);
    let filename       = document.filename.clone();
    let display_name   = document.display_name.clone();
    let storage_path   = document.storage_path.clone();
    let database_str   = encode_database(document.database);
    let extracted_json = encode_json(&document.extracted)?;
    let uploaded_str   = encode_dt(document.uploaded_at);
    let status_str     = encode_status(document.status).to_owned();
    let size           = encode_count(document.size_bytes);
    let content_type   = document.content_type.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO documents (
             document_id, filename, display_name, storage_path, database_name,
             extracted_json, uploaded_at, status, size_bytes, content_type
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            filename,
            display_name,
            storage_path,
            database_str,
            extracted_json,
            uploaded_str,
            status_str,
            size,
            content_type,
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::debug!(document_id = %document.document_id, status = ?document.status, "document created");
    Ok(document)
  }

  async fn get_document(&self, id: Uuid) -> Result<Option<Document>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawDocument> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM documents WHERE document_id = ?1",
          RawDocument::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawDocument::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawDocument::into_document).transpose()
  }

  async fn list_documents(&self) -> Result<Vec<Document>> {
    let raws: Vec<RawDocument> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM documents ORDER BY uploaded_at DESC, rowid DESC",
          RawDocument::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawDocument::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawDocument::into_document).collect()
  }

  // ── CSV imports ───────────────────────────────────────────────────────────

  async fn create_csv_import(
    &self,
    filename: String,
    headers:  Vec<String>,
    rows:     Vec<CsvRow>,
  ) -> Result<CsvImport> {
    if filename.trim().is_empty() {
      return Err(CoreError::Validation("csv import filename is required".into()).into());
    }

    let import = CsvImport {
      csv_import_id: Uuid::new_v4(),
      filename,
      headers,
      rows,
      uploaded_at: now(),
      form_generated: false,
    };

    let id_str       = encode_uuid(import.csv_import_id);
    let filename     = import.filename.clone();
    let headers_json = encode_json(&import.headers)?;
    let rows_json    = encode_json(&import.rows)?;
    let uploaded_str = encode_dt(import.uploaded_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO csv_imports (
             csv_import_id, filename, headers_json, rows_json, uploaded_at
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, filename, headers_json, rows_json, uploaded_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(import)
  }

  async fn get_csv_import(&self, id: Uuid) -> Result<Option<CsvImport>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCsvImport> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {} FROM csv_imports WHERE csv_import_id = ?1",
          RawCsvImport::COLUMNS
        );
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawCsvImport::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCsvImport::into_csv_import).transpose()
  }

  async fn list_csv_imports(&self) -> Result<Vec<CsvImport>> {
    let raws: Vec<RawCsvImport> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM csv_imports ORDER BY uploaded_at DESC, rowid DESC",
          RawCsvImport::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawCsvImport::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCsvImport::into_csv_import).collect()
  }

  async fn derive_form_from_csv(
    &self,
    csv_import_id: Uuid,
    database:      DatabaseName,
  ) -> Result<Form> {
    let import = self
      .get_csv_import(csv_import_id)
      .await?
      .ok_or(CoreError::CsvImportNotFound(csv_import_id))?;

    if import.headers.is_empty() {
      return Err(
        CoreError::Validation(format!(
          "csv import {csv_import_id} has no headers to derive a form from"
        ))
        .into(),
      );
    }

    let input = NewForm {
      name:       derived_form_name(&import.filename),
      fields:     fields_from_headers(&import.headers),
      database,
      provenance: Provenance::Csv { csv_import_id },
    };
    input.validate()?;

    let form_id = Uuid::new_v4();
    let form = Form {
      form_id,
      name: input.name,
      fields: input.fields,
      database: input.database,
      public_path: Form::public_path_for(form_id),
      created_at: now(),
      provenance: input.provenance,
      submission_count: 0,
    };

    if !self.insert_form(&form, Some(csv_import_id)).await? {
      return Err(CoreError::CsvImportNotFound(csv_import_id).into());
    }

    tracing::debug!(form_id = %form.form_id, %csv_import_id, "form derived from csv import");
    Ok(form)
  }

  // ── Forms ─────────────────────────────────────────────────────────────────

  async fn create_form(&self, input: NewForm) -> Result<Form> {
    input.validate()?;

    let form_id = Uuid::new_v4();
    let form = Form {
      form_id,
      name: input.name,
      fields: input.fields,
      database: input.database,
      public_path: Form::public_path_for(form_id),
      created_at: now(),
      provenance: input.provenance,
      submission_count: 0,
    };

    self.insert_form(&form, None).await?;
    Ok(form)
  }

  async fn get_form(&self, id: Uuid) -> Result<Option<Form>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawForm> = self
      .conn
      .call(move |conn| {
        let sql = format!("SELECT {} FROM forms WHERE form_id = ?1", RawForm::COLUMNS);
        Ok(
          conn
            .query_row(&sql, rusqlite::params![id_str], RawForm::from_row)
            .optional()?,
        )
      })
      .await?;

    raw.map(RawForm::into_form).transpose()
  }

  async fn list_forms(&self) -> Result<Vec<Form>> {
    let raws: Vec<RawForm> = self
      .conn
      .call(|conn| {
        let sql = format!(
          "SELECT {} FROM forms ORDER BY created_at DESC, rowid DESC",
          RawForm::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map([], RawForm::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawForm::into_form).collect()
  }

  async fn update_form(&self, id: Uuid, update: FormUpdate) -> Result<()> {
    update.validate()?;

    let id_str       = encode_uuid(id);
    let fields_json  = encode_json(&update.fields)?;
    let database_str = encode_database(update.database);
    let name         = update.name;

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE forms SET name = ?2, fields_json = ?3, database_name = ?4
           WHERE form_id = ?1",
          rusqlite::params![id_str, name, fields_json, database_str],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(CoreError::FormNotFound(id).into());
    }
    Ok(())
  }

  async fn delete_form(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    // `None` means the form did not exist.
    let cascaded: Option<usize> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let exists = tx
          .query_row(
            "SELECT 1 FROM forms WHERE form_id = ?1",
            rusqlite::params![id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let removed = tx.execute(
          "DELETE FROM submissions WHERE form_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM forms WHERE form_id = ?1", rusqlite::params![id_str])?;

        tx.commit()?;
        Ok(Some(removed))
      })
      .await?;

    let removed = cascaded.ok_or(CoreError::FormNotFound(id))?;
    tracing::debug!(form_id = %id, submissions = removed, "form deleted");
    Ok(())
  }

  // ── Submissions ───────────────────────────────────────────────────────────

  async fn record_submission(
    &self,
    form_id:        Uuid,
    payload:        Payload,
    client_address: Option<String>,
  ) -> Result<Submission> {
    let submitted_at = now();

    let form_id_str   = encode_uuid(form_id);
    let payload_json  = encode_json(&payload)?;
    let submitted_str = encode_dt(submitted_at);
    let address       = client_address.clone();

    // `None` means the form did not exist; the transaction is rolled back on
    // drop, so no submission row is written.
    let inserted: Option<i64> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;

        let bumped = tx.execute(
          "UPDATE forms SET submission_count = submission_count + 1 WHERE form_id = ?1",
          rusqlite::params![form_id_str],
        )?;
        if bumped == 0 {
          return Ok(None);
        }

        tx.execute(
          "INSERT INTO submissions (form_id, payload_json, submitted_at, client_address)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![form_id_str, payload_json, submitted_str, address],
        )?;
        let submission_id = tx.last_insert_rowid();

        tx.commit()?;
        Ok(Some(submission_id))
      })
      .await?;

    let submission_id = inserted.ok_or(CoreError::FormNotFound(form_id))?;

    Ok(Submission {
      submission_id,
      form_id,
      payload,
      submitted_at,
      client_address,
    })
  }

  async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<Submission>> {
    let form_id_str = encode_uuid(form_id);

    let raws: Option<Vec<RawSubmission>> = self
      .conn
      .call(move |conn| {
        let exists = conn
          .query_row(
            "SELECT 1 FROM forms WHERE form_id = ?1",
            rusqlite::params![form_id_str],
            |_| Ok(true),
          )
          .optional()?
          .unwrap_or(false);
        if !exists {
          return Ok(None);
        }

        let sql = format!(
          "SELECT {} FROM submissions WHERE form_id = ?1 ORDER BY submission_id",
          RawSubmission::COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params![form_id_str], RawSubmission::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(Some(rows))
      })
      .await?;

    raws
      .ok_or(CoreError::FormNotFound(form_id))?
      .into_iter()
      .map(RawSubmission::into_submission)
      .collect()
  }
}

// ─── Diagnostics ─────────────────────────────────────────────────────────────

impl SqliteStore {
  /// Forms whose stored counter disagrees with their live submission rows.
  /// Always empty unless the database was edited outside the store.
  pub async fn counter_mismatches(&self) -> Result<Vec<(Uuid, u64, u64)>> {
    let rows: Vec<(String, i64, i64)> = self
      .conn
      .call(|conn| {
        let mut stmt = conn.prepare(
          "SELECT f.form_id, f.submission_count, COUNT(s.submission_id)
           FROM forms f
           LEFT JOIN submissions s ON s.form_id = f.form_id
           GROUP BY f.form_id
           HAVING f.submission_count != COUNT(s.submission_id)",
        )?;
        let rows = stmt
          .query_map([], |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    rows
      .into_iter()
      .map(|(id, stored, live)| {
        Ok((Uuid::parse_str(&id).map_err(Error::Uuid)?, decode_count(stored), decode_count(live)))
      })
      .collect()
  }

  /// Number of submission rows whose form no longer exists.
  pub async fn orphaned_submissions(&self) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(|conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM submissions s
           WHERE NOT EXISTS (SELECT 1 FROM forms f WHERE f.form_id = s.form_id)",
          [],
          |r| r.get(0),
        )?)
      })
      .await?;
    Ok(decode_count(n))
  }
}
