//! Error types for `formdesk-extract`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed csv: {0}")]
  Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
