//! Error types for `formdesk-core`.

use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid input: {0}")]
  Validation(String),

  #[error("unknown database name: {0:?}")]
  UnknownDatabase(String),

  #[error("form not found: {0}")]
  FormNotFound(Uuid),

  #[error("csv import not found: {0}")]
  CsvImportNotFound(Uuid),

  #[error("document not found: {0}")]
  DocumentNotFound(Uuid),

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

// ─── Classification ──────────────────────────────────────────────────────────

/// The three fault classes every store error collapses into. Transport
/// layers map these onto their own representation (HTTP status, exit code).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
  /// Missing or malformed caller input.
  Validation,
  /// A referenced entity does not exist.
  NotFound,
  /// The underlying persistence operation failed.
  Storage,
}

/// Implemented by every error type a [`crate::store::RecordStore`] can return.
pub trait Classify {
  fn kind(&self) -> ErrorKind;
}

impl Classify for Error {
  fn kind(&self) -> ErrorKind {
    match self {
      Self::Validation(_) | Self::UnknownDatabase(_) => ErrorKind::Validation,
      Self::FormNotFound(_)
      | Self::CsvImportNotFound(_)
      | Self::DocumentNotFound(_) => ErrorKind::NotFound,
      Self::Serialization(_) => ErrorKind::Storage,
    }
  }
}
