//! Handlers for `/forms/:id/submissions`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/forms/:id/submissions` | Oldest first; 404 for an unknown form |
//! | `POST` | `/forms/:id/submissions` | Body: `{"payload":{..}}`; returns 201 + submission |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use formdesk_core::{
  store::RecordStore,
  submission::{Payload, Submission},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{client::ClientAddress, error::ApiError};

/// `GET /forms/:id/submissions`
pub async fn list<S>(
  State(store): State<Arc<S>>,
  Path(form_id): Path<Uuid>,
) -> Result<Json<Vec<Submission>>, ApiError>
where
  S: RecordStore,
{
  let submissions = store
    .list_submissions(form_id)
    .await
    .map_err(ApiError::from_store)?;
  Ok(Json(submissions))
}

#[derive(Debug, Deserialize)]
pub struct SubmitBody {
  pub payload: Payload,
}

/// `POST /forms/:id/submissions`
///
/// Unlike the public HTML route, required fields are not enforced here.
pub async fn create<S>(
  State(store): State<Arc<S>>,
  Path(form_id): Path<Uuid>,
  ClientAddress(client): ClientAddress,
  body: Result<Json<SubmitBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body?;
  let submission = store
    .record_submission(form_id, body.payload, client)
    .await
    .map_err(ApiError::from_store)?;
  tracing::debug!(
    form_id = %form_id,
    submission_id = submission.submission_id,
    "recorded submission",
  );
  Ok((StatusCode::CREATED, Json(submission)))
}
