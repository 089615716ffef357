//! The `RecordStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `formdesk-store-sqlite`).
//! Higher layers (`formdesk-api`, `formdesk-server`) depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  Classify, DatabaseName,
  csv_import::{CsvImport, CsvRow},
  document::{Document, NewDocument},
  form::{Form, FormUpdate, NewForm},
  submission::{Payload, Submission},
};

/// Owner of the four entity collections and their consistency rules.
///
/// - A submission always references a live form; deleting a form removes its
///   submissions first, in the same unit of work.
/// - A form's `submission_count` always equals the number of its live
///   submissions. It is an incremental counter updated together with each
///   insert.
/// - Failed operations leave the store unchanged.
///
/// All methods return `Send` futures so the trait can be used in
/// multi-threaded async runtimes (e.g. tokio with `axum`).
pub trait RecordStore: Send + Sync {
  type Error: std::error::Error + Classify + Send + Sync + 'static;

  // ── Documents ─────────────────────────────────────────────────────────

  /// Persist an uploaded document. The store assigns the id, the upload
  /// timestamp, and the status (from `extracted.processed`).
  fn create_document(
    &self,
    input: NewDocument,
  ) -> impl Future<Output = Result<Document, Self::Error>> + Send + '_;

  /// Retrieve a document by id. Returns `None` if not found.
  fn get_document(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Document>, Self::Error>> + Send + '_;

  /// All documents, newest first.
  fn list_documents(
    &self,
  ) -> impl Future<Output = Result<Vec<Document>, Self::Error>> + Send + '_;

  // ── CSV imports ───────────────────────────────────────────────────────

  /// Persist a parsed CSV. `headers` may be empty, in which case no form
  /// can be derived from the import.
  fn create_csv_import(
    &self,
    filename: String,
    headers: Vec<String>,
    rows: Vec<CsvRow>,
  ) -> impl Future<Output = Result<CsvImport, Self::Error>> + Send + '_;

  /// Retrieve an import by id. Returns `None` if not found.
  fn get_csv_import(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CsvImport>, Self::Error>> + Send + '_;

  /// All imports, newest first.
  fn list_csv_imports(
    &self,
  ) -> impl Future<Output = Result<Vec<CsvImport>, Self::Error>> + Send + '_;

  /// Create a form whose fields mirror the import's headers and mark the
  /// import as having generated a form.
  ///
  /// Calling this again for the same import creates another form.
  fn derive_form_from_csv(
    &self,
    csv_import_id: Uuid,
    database: DatabaseName,
  ) -> impl Future<Output = Result<Form, Self::Error>> + Send + '_;

  // ── Forms ─────────────────────────────────────────────────────────────

  fn create_form(
    &self,
    input: NewForm,
  ) -> impl Future<Output = Result<Form, Self::Error>> + Send + '_;

  /// Retrieve a form with its live submission count. Returns `None` if not
  /// found.
  fn get_form(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Form>, Self::Error>> + Send + '_;

  /// All forms, newest first, with live submission counts.
  fn list_forms(
    &self,
  ) -> impl Future<Output = Result<Vec<Form>, Self::Error>> + Send + '_;

  /// Replace a form's name, fields and database-name.
  fn update_form(
    &self,
    id: Uuid,
    update: FormUpdate,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a form and, before it, every submission referencing it.
  fn delete_form(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Submissions ───────────────────────────────────────────────────────

  /// Append a submission and bump the form's counter as one unit of work.
  fn record_submission(
    &self,
    form_id: Uuid,
    payload: Payload,
    client_address: Option<String>,
  ) -> impl Future<Output = Result<Submission, Self::Error>> + Send + '_;

  /// Submissions for a form, oldest first. Fails if the form does not
  /// exist.
  fn list_submissions(
    &self,
    form_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Submission>, Self::Error>> + Send + '_;
}
