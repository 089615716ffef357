//! Handlers for `/csv-imports` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/csv-imports` | Newest first |
//! | `GET`  | `/csv-imports/:id` | 404 if not found |
//! | `POST` | `/csv-imports/:id/form` | Body: `{"database":"customers"}`; returns 201 + derived form |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use formdesk_core::{DatabaseName, csv_import::CsvImport, store::RecordStore};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /csv-imports`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<CsvImport>>, ApiError>
where
  S: RecordStore,
{
  let imports = store.list_csv_imports().await.map_err(ApiError::from_store)?;
  Ok(Json(imports))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /csv-imports/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CsvImport>, ApiError>
where
  S: RecordStore,
{
  let import = store
    .get_csv_import(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("csv import {id} not found")))?;
  Ok(Json(import))
}

// ─── Derive ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeriveBody {
  pub database: String,
}

/// `POST /csv-imports/:id/form`
pub async fn derive_form<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  body: Result<Json<DeriveBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body?;
  let database = DatabaseName::parse(&body.database)?;
  let form = store
    .derive_form_from_csv(id, database)
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(csv_import_id = %id, form_id = %form.form_id, "derived form from csv");
  Ok((StatusCode::CREATED, Json(form)))
}
