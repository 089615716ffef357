//! Handlers for `/documents` endpoints.
//!
//! Documents are created by the upload routes of the server; the API only
//! reads them.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/documents` | Newest first |
//! | `GET`  | `/documents/:id` | 404 if not found |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use formdesk_core::{document::Document, store::RecordStore};
use uuid::Uuid;

use crate::error::ApiError;

/// `GET /documents`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Document>>, ApiError>
where
  S: RecordStore,
{
  let documents = store.list_documents().await.map_err(ApiError::from_store)?;
  Ok(Json(documents))
}

/// `GET /documents/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Document>, ApiError>
where
  S: RecordStore,
{
  let document = store
    .get_document(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("document {id} not found")))?;
  Ok(Json(document))
}
