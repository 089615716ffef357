//! HTTP server for formdesk.
//!
//! Mounts the JSON API from [`formdesk_api`] under `/api` and adds what
//! needs the filesystem or a browser: multipart uploads, the public HTML
//! form pages, and a health check. Works with any [`RecordStore`].

pub mod error;
pub mod html;
pub mod pages;
pub mod uploads;

pub use error::Error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  extract::DefaultBodyLimit,
  http::StatusCode,
  routing::{get, post},
};
use formdesk_core::store::RecordStore;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FORMDESK_*` environment variables. Every key has a default.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:             String,
  #[serde(default = "default_port")]
  pub port:             u16,
  /// Prefix for absolute form links, e.g. `https://forms.example.com`.
  #[serde(default = "default_base_url")]
  pub base_url:         String,
  /// SQLite file. When unset the store lives in memory and nothing survives
  /// a restart.
  #[serde(default)]
  pub store_path:       Option<PathBuf>,
  #[serde(default = "default_upload_dir")]
  pub upload_dir:       PathBuf,
  /// Request bodies above this size are rejected with 413.
  #[serde(default = "default_max_upload_bytes")]
  pub max_upload_bytes: usize,
}

fn default_host() -> String { "127.0.0.1".to_owned() }

fn default_port() -> u16 { 8080 }

fn default_base_url() -> String { "http://localhost:8080".to_owned() }

fn default_upload_dir() -> PathBuf { PathBuf::from("uploads") }

fn default_max_upload_bytes() -> usize { 16 * 1024 * 1024 }

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:             default_host(),
      port:             default_port(),
      base_url:         default_base_url(),
      store_path:       None,
      upload_dir:       default_upload_dir(),
      max_upload_bytes: default_max_upload_bytes(),
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:  Arc<S>,
  pub config: Arc<ServerConfig>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:  self.store.clone(),
      config: self.config.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the complete application router.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: RecordStore + 'static,
{
  let body_limit = state.config.max_upload_bytes;
  let store = state.store.clone();

  Router::new()
    .route("/", get(pages::index::<S>))
    .route("/f/{id}", get(pages::show::<S>).post(pages::submit::<S>))
    .route("/uploads/documents", post(uploads::upload_document::<S>))
    .route("/uploads/csv", post(uploads::upload_csv::<S>))
    .route("/health", get(health))
    .with_state(state)
    .nest("/api", formdesk_api::api_router(store))
    .layer(DefaultBodyLimit::max(body_limit))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> StatusCode { StatusCode::OK }

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use std::path::Path;

  use axum::{
    body::{Body, to_bytes},
    http::{Request, header},
    response::Response,
  };
  use formdesk_core::{
    DatabaseName,
    csv_import::{CsvImport, CsvRow},
    document::{Document, NewDocument},
    form::{FieldDescriptor, Form, FormUpdate, NewForm},
    submission::{Payload, Submission},
  };
  use formdesk_store_sqlite::SqliteStore;
  use serde_json::Value;
  use tower::ServiceExt as _;
  use uuid::Uuid;

  const BOUNDARY: &str = "formdesk-test-boundary";

  async fn make_state(upload_dir: &Path) -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();
    AppState {
      store:  Arc::new(store),
      config: Arc::new(ServerConfig {
        base_url: "http://forms.test".to_owned(),
        upload_dir: upload_dir.to_path_buf(),
        max_upload_bytes: 64 * 1024,
        ..ServerConfig::default()
      }),
    }
  }

  /// A multipart body. `file` is `(filename, content type, bytes)`.
  fn multipart(fields: &[(&str, &str)], file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    for (name, value) in fields {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
        )
        .as_bytes(),
      );
    }
    if let Some((filename, content_type, bytes)) = file {
      body.extend_from_slice(
        format!(
          "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; \
           filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
        )
        .as_bytes(),
      );
      body.extend_from_slice(bytes);
      body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
  }

  async fn oneshot_raw<S: RecordStore + 'static>(
    state:   AppState<S>,
    method:  &str,
    uri:     &str,
    headers: Vec<(header::HeaderName, &str)>,
    body:    Vec<u8>,
  ) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    for (k, v) in headers {
      builder = builder.header(k, v);
    }
    let req = builder.body(Body::from(body)).unwrap();
    router(state).oneshot(req).await.unwrap()
  }

  async fn upload<S: RecordStore + 'static>(
    state: AppState<S>,
    uri:   &str,
    body:  Vec<u8>,
  ) -> Response {
    let content_type = format!("multipart/form-data; boundary={BOUNDARY}");
    oneshot_raw(state, "POST", uri, vec![(header::CONTENT_TYPE, content_type.as_str())], body).await
  }

  fn upload_dir_entries(dir: &Path) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir)
      .unwrap()
      .map(|entry| entry.unwrap().path())
      .collect()
  }

  async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
  }

  async fn body_json(resp: Response) -> Value {
    serde_json::from_str(&body_text(resp).await).unwrap()
  }

  async fn email_form(state: &AppState<SqliteStore>) -> Form {
    let mut optional = FieldDescriptor::from_header("comment");
    optional.required = false;
    state
      .store
      .create_form(NewForm::new(
        "Newsletter",
        vec![FieldDescriptor::from_header("email"), optional],
        DatabaseName::Customers,
      ))
      .await
      .unwrap()
  }

  // ── Health & API mount ──────────────────────────────────────────────────────

  #[tokio::test]
  async fn health_and_api_are_mounted() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;

    let resp = oneshot_raw(state.clone(), "GET", "/health", vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = oneshot_raw(state, "GET", "/api/forms", vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, serde_json::json!([]));
  }

  // ── CSV uploads ─────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn csv_upload_with_database_derives_form() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let csv = b"first_name,last-name,email\nAda,Lovelace,ada@example.com\n";
    let body = multipart(
      &[("database", "employees")],
      Some(("staff_list.csv", "text/csv", csv.as_slice())),
    );

    let resp = upload(state.clone(), "/uploads/csv", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;

    assert_eq!(json["csv_import"]["headers"][1], "last-name");
    assert_eq!(json["csv_import"]["rows"][0]["email"], "ada@example.com");
    assert_eq!(json["csv_import"]["form_generated"], true);
    assert_eq!(json["form"]["name"], "Staff List Form");
    assert_eq!(json["form"]["database"], "employees");
    assert_eq!(json["form"]["fields"][0]["label"], "First Name");
    assert_eq!(json["document"]["status"], "processed");
    assert_eq!(json["document"]["extracted"]["details"]["type"], "csv");

    let stored = json["document"]["storage_path"].as_str().unwrap();
    assert!(stored.ends_with("-staff_list.csv"), "{stored}");
    assert_eq!(std::fs::read(stored).unwrap(), csv);
  }

  #[tokio::test]
  async fn csv_upload_without_database_only_imports() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let body = multipart(&[], Some(("items.csv", "text/csv", b"sku,qty\nA1,3\n".as_slice())));

    let resp = upload(state.clone(), "/uploads/csv", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["csv_import"]["form_generated"], false);
    assert!(json.get("form").is_none());
    assert!(json.get("document").is_none());
    assert!(state.store.list_forms().await.unwrap().is_empty());
    assert_eq!(state.store.list_csv_imports().await.unwrap().len(), 1);
    assert!(upload_dir_entries(dir.path()).is_empty());
  }

  #[tokio::test]
  async fn csv_upload_with_duplicate_headers_derives_distinct_fields() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let body = multipart(
      &[("database", "customers")],
      Some(("contacts.csv", "text/csv", b"email,email\na@x,b@x\n".as_slice())),
    );

    let resp = upload(state, "/uploads/csv", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["csv_import"]["rows"][0]["email_2"], "b@x");
    assert_eq!(json["form"]["fields"][0]["name"], "email");
    assert_eq!(json["form"]["fields"][1]["name"], "email_2");
  }

  #[tokio::test]
  async fn csv_upload_rejects_other_extensions() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let body = multipart(&[], Some(("items.txt", "text/csv", b"a,b\n".as_slice())));
    let resp = upload(state.clone(), "/uploads/csv", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(state.store.list_csv_imports().await.unwrap().is_empty());
  }

  // ── Document uploads ────────────────────────────────────────────────────────

  #[tokio::test]
  async fn document_upload_extracts_text() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let body = multipart(
      &[("database", "orders"), ("name", "Shipping notes")],
      Some(("notes.txt", "application/octet-stream", b"line one\nline two\n".as_slice())),
    );

    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["display_name"], "Shipping notes");
    assert_eq!(json["content_type"], "text/plain");
    assert_eq!(json["size_bytes"], 18);
    assert_eq!(json["status"], "processed");
    assert_eq!(json["extracted"]["details"]["lines"], 2);

    let documents = state.store.list_documents().await.unwrap();
    assert_eq!(documents.len(), 1);
    assert!(Path::new(&documents[0].storage_path).starts_with(dir.path()));
  }

  #[tokio::test]
  async fn binary_document_is_stored_unprocessed() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let body = multipart(
      &[("database", "inventory")],
      Some(("scan.png", "image/png", [0x89, b'P', b'N', b'G'].as_slice())),
    );
    let resp = upload(state, "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = body_json(resp).await;
    assert_eq!(json["status"], "uploaded");
    assert_eq!(json["display_name"], "scan.png");
  }

  #[tokio::test]
  async fn document_upload_requires_known_database() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;

    let body = multipart(&[], Some(("a.txt", "text/plain", b"x".as_slice())));
    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = multipart(&[("database", "payroll")], Some(("a.txt", "text/plain", b"x".as_slice())));
    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body = multipart(&[("database", "orders")], None);
    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    assert!(state.store.list_documents().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn oversized_upload_is_413() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let big = vec![b'a'; 128 * 1024];
    let body = multipart(&[("database", "orders")], Some(("big.txt", "text/plain", big.as_slice())));
    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    assert!(state.store.list_documents().await.unwrap().is_empty());
  }

  // ── Store failures ──────────────────────────────────────────────────────────

  /// Delegates to an in-memory store but refuses every document insert with
  /// a storage fault.
  struct BrokenDocuments(SqliteStore);

  impl RecordStore for BrokenDocuments {
    type Error = formdesk_store_sqlite::Error;

    async fn create_document(
      &self,
      _input: NewDocument,
    ) -> Result<Document, Self::Error> {
      Err(formdesk_store_sqlite::Error::Decode("disk full".to_owned()))
    }

    async fn get_document(&self, id: Uuid) -> Result<Option<Document>, Self::Error> {
      self.0.get_document(id).await
    }

    async fn list_documents(&self) -> Result<Vec<Document>, Self::Error> {
      self.0.list_documents().await
    }

    async fn create_csv_import(
      &self,
      filename: String,
      headers: Vec<String>,
      rows: Vec<CsvRow>,
    ) -> Result<CsvImport, Self::Error> {
      self.0.create_csv_import(filename, headers, rows).await
    }

    async fn get_csv_import(&self, id: Uuid) -> Result<Option<CsvImport>, Self::Error> {
      self.0.get_csv_import(id).await
    }

    async fn list_csv_imports(&self) -> Result<Vec<CsvImport>, Self::Error> {
      self.0.list_csv_imports().await
    }

    async fn derive_form_from_csv(
      &self,
      csv_import_id: Uuid,
      database: DatabaseName,
    ) -> Result<Form, Self::Error> {
      self.0.derive_form_from_csv(csv_import_id, database).await
    }

    async fn create_form(&self, input: NewForm) -> Result<Form, Self::Error> {
      self.0.create_form(input).await
    }

    async fn get_form(&self, id: Uuid) -> Result<Option<Form>, Self::Error> {
      self.0.get_form(id).await
    }

    async fn list_forms(&self) -> Result<Vec<Form>, Self::Error> { self.0.list_forms().await }

    async fn update_form(&self, id: Uuid, update: FormUpdate) -> Result<(), Self::Error> {
      self.0.update_form(id, update).await
    }

    async fn delete_form(&self, id: Uuid) -> Result<(), Self::Error> {
      self.0.delete_form(id).await
    }

    async fn record_submission(
      &self,
      form_id: Uuid,
      payload: Payload,
      client_address: Option<String>,
    ) -> Result<Submission, Self::Error> {
      self.0.record_submission(form_id, payload, client_address).await
    }

    async fn list_submissions(&self, form_id: Uuid) -> Result<Vec<Submission>, Self::Error> {
      self.0.list_submissions(form_id).await
    }
  }

  async fn broken_state(upload_dir: &Path) -> AppState<BrokenDocuments> {
    let healthy = make_state(upload_dir).await;
    AppState {
      store:  Arc::new(BrokenDocuments(SqliteStore::open_in_memory().await.unwrap())),
      config: healthy.config,
    }
  }

  #[tokio::test]
  async fn failed_document_insert_leaves_no_file() {
    let dir = tempfile::tempdir().unwrap();
    let state = broken_state(dir.path()).await;
    let body = multipart(
      &[("database", "orders")],
      Some(("notes.txt", "text/plain", b"hello".as_slice())),
    );

    let resp = upload(state.clone(), "/uploads/documents", body).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(upload_dir_entries(dir.path()).is_empty());
    assert!(state.store.list_documents().await.unwrap().is_empty());
  }

  #[tokio::test]
  async fn failed_csv_document_insert_leaves_no_file_or_document() {
    let dir = tempfile::tempdir().unwrap();
    let state = broken_state(dir.path()).await;
    let body = multipart(
      &[("database", "orders")],
      Some(("items.csv", "text/csv", b"sku,qty\nA1,3\n".as_slice())),
    );

    let resp = upload(state.clone(), "/uploads/csv", body).await;
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(upload_dir_entries(dir.path()).is_empty());
    assert!(state.store.list_documents().await.unwrap().is_empty());
  }

  // ── HTML pages ──────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn index_lists_forms_with_absolute_links() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let form = email_form(&state).await;

    let resp = oneshot_raw(state, "GET", "/", vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains(&format!("http://forms.test/f/{}", form.form_id)), "{html}");
    assert!(html.contains("Newsletter"));
  }

  #[tokio::test]
  async fn form_page_renders_and_unknown_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let form = email_form(&state).await;

    let resp =
      oneshot_raw(state.clone(), "GET", &format!("/f/{}", form.form_id), vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = body_text(resp).await;
    assert!(html.contains("name=\"email\""));
    assert!(html.contains("<h1>Newsletter</h1>"));

    let resp =
      oneshot_raw(state.clone(), "GET", &format!("/f/{}", Uuid::new_v4()), vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let resp = oneshot_raw(state, "GET", "/f/not-a-uuid", vec![], vec![]).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn submit_with_blank_required_field_rerenders() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let form = email_form(&state).await;

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      &format!("/f/{}", form.form_id),
      vec![(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
      b"email=++&comment=%3Cb%3Ehi".to_vec(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let html = body_text(resp).await;
    assert!(html.contains("Email is required"));
    assert!(html.contains("&lt;b&gt;hi"));

    let form = state.store.get_form(form.form_id).await.unwrap().unwrap();
    assert_eq!(form.submission_count, 0);
  }

  #[tokio::test]
  async fn submit_records_client_address() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let form = email_form(&state).await;

    let resp = oneshot_raw(
      state.clone(),
      "POST",
      &format!("/f/{}", form.form_id),
      vec![
        (header::CONTENT_TYPE, "application/x-www-form-urlencoded"),
        (header::HeaderName::from_static("x-forwarded-for"), "198.51.100.4, 10.0.0.2"),
      ],
      b"email=ada%40example.com".to_vec(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Thank you"));

    let submissions = state.store.list_submissions(form.form_id).await.unwrap();
    assert_eq!(submissions.len(), 1);
    assert_eq!(submissions[0].payload["email"], "ada@example.com");
    assert_eq!(submissions[0].client_address.as_deref(), Some("198.51.100.4"));
  }

  #[tokio::test]
  async fn submit_to_unknown_form_is_404() {
    let dir = tempfile::tempdir().unwrap();
    let state = make_state(dir.path()).await;
    let resp = oneshot_raw(
      state,
      "POST",
      &format!("/f/{}", Uuid::new_v4()),
      vec![(header::CONTENT_TYPE, "application/x-www-form-urlencoded")],
      b"email=x".to_vec(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
  }
}
