//! Error types and axum `IntoResponse` implementation for the upload routes.

use axum::{
  Json,
  extract::multipart::{MultipartError, MultipartRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use formdesk_core::{Classify, ErrorKind};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("not found: {0}")]
  NotFound(String),
  #[error("bad request: {0}")]
  BadRequest(String),
  #[error("multipart error: {0}")]
  Multipart(#[from] MultipartError),
  #[error("multipart rejected: {0}")]
  MultipartRejection(#[from] MultipartRejection),
  #[error("extraction failed: {0}")]
  Extract(#[from] formdesk_extract::Error),
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Map a store (or core) error by its classification.
  pub fn from_store<E>(e: E) -> Self
  where
    E: std::error::Error + Classify + Send + Sync + 'static,
  {
    match e.kind() {
      ErrorKind::Validation => Error::BadRequest(e.to_string()),
      ErrorKind::NotFound => Error::NotFound(e.to_string()),
      ErrorKind::Storage => Error::Store(Box::new(e)),
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      Error::NotFound(_) => StatusCode::NOT_FOUND,
      Error::BadRequest(_) | Error::Extract(_) => StatusCode::BAD_REQUEST,
      // Carries 413 when the body limit was hit.
      Error::Multipart(e) => e.status(),
      Error::MultipartRejection(e) => e.status(),
      Error::Io(_) | Error::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<formdesk_core::Error> for Error {
  fn from(e: formdesk_core::Error) -> Self { Error::from_store(e) }
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "upload failed");
    }
    let message = match &self {
      Error::NotFound(m) | Error::BadRequest(m) => m.clone(),
      Error::Multipart(e) => e.body_text(),
      Error::MultipartRejection(e) => e.body_text(),
      other => other.to_string(),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
