//! Async HTTP client wrapping the formdesk JSON API.

use anyhow::{Context, Result, anyhow};
use formdesk_core::{
  DatabaseName, csv_import::CsvImport, document::Document, form::Form,
  submission::Submission,
};
use reqwest::{Client, Response};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::time::Duration;
use uuid::Uuid;

/// Connection settings for the formdesk API.
#[derive(Debug, Clone)]
pub struct ApiConfig {
  pub base_url: String,
}

/// Async HTTP client for the formdesk JSON REST API.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ApiClient {
  client: Client,
  config: ApiConfig,
}

/// Body of every API error response.
#[derive(Deserialize)]
struct ErrorBody {
  error: String,
}

impl ApiClient {
  pub fn new(config: ApiConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()
      .context("failed to build HTTP client")?;
    Ok(Self { client, config })
  }

  fn url(&self, path: &str) -> String {
    format!(
      "{}/api{}",
      self.config.base_url.trim_end_matches('/'),
      path
    )
  }

  /// Turn a non-2xx response into an error carrying the server's message.
  async fn check(resp: Response, what: &str) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let message = resp
      .json::<ErrorBody>()
      .await
      .map(|b| b.error)
      .unwrap_or_default();
    Err(anyhow!("{what} → {status}: {message}"))
  }

  async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    tracing::debug!(path, "GET");
    let resp = self
      .client
      .get(self.url(path))
      .send()
      .await
      .with_context(|| format!("GET {path} failed"))?;
    Self::check(resp, &format!("GET {path}"))
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response to GET {path}"))
  }

  async fn post<T: DeserializeOwned>(&self, path: &str, body: &Value) -> Result<T> {
    tracing::debug!(path, "POST");
    let resp = self
      .client
      .post(self.url(path))
      .json(body)
      .send()
      .await
      .with_context(|| format!("POST {path} failed"))?;
    Self::check(resp, &format!("POST {path}"))
      .await?
      .json()
      .await
      .with_context(|| format!("deserialising response to POST {path}"))
  }

  // ── Forms ─────────────────────────────────────────────────────────────────

  /// `GET /api/forms`
  pub async fn list_forms(&self) -> Result<Vec<Form>> { self.get("/forms").await }

  /// `GET /api/forms/<id>`
  pub async fn get_form(&self, id: Uuid) -> Result<Form> {
    self.get(&format!("/forms/{id}")).await
  }

  /// `DELETE /api/forms/<id>`
  pub async fn delete_form(&self, id: Uuid) -> Result<()> {
    let path = format!("/forms/{id}");
    tracing::debug!(path, "DELETE");
    let resp = self
      .client
      .delete(self.url(&path))
      .send()
      .await
      .with_context(|| format!("DELETE {path} failed"))?;
    Self::check(resp, &format!("DELETE {path}")).await?;
    Ok(())
  }

  /// `GET /api/forms/<id>/submissions`
  pub async fn list_submissions(&self, id: Uuid) -> Result<Vec<Submission>> {
    self.get(&format!("/forms/{id}/submissions")).await
  }

  // ── Documents & imports ───────────────────────────────────────────────────

  /// `GET /api/documents`
  pub async fn list_documents(&self) -> Result<Vec<Document>> {
    self.get("/documents").await
  }

  /// `GET /api/csv-imports`
  pub async fn list_csv_imports(&self) -> Result<Vec<CsvImport>> {
    self.get("/csv-imports").await
  }

  /// `POST /api/csv-imports/<id>/form`
  pub async fn derive_form(&self, id: Uuid, database: DatabaseName) -> Result<Form> {
    self
      .post(&format!("/csv-imports/{id}/form"), &json!({ "database": database }))
      .await
  }

  // ── Tools ─────────────────────────────────────────────────────────────────

  /// `GET /api/stats`
  pub async fn stats(&self) -> Result<Value> { self.get("/stats").await }

  /// `POST /api/tools/call`; returns the unwrapped `result`.
  pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Value> {
    let mut body: Value = self
      .post("/tools/call", &json!({ "name": name, "arguments": arguments }))
      .await?;
    Ok(body["result"].take())
  }
}
