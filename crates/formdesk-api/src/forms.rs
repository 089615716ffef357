//! Handlers for `/forms` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/forms` | Newest first, with live submission counts |
//! | `POST`   | `/forms` | Body: [`FormBody`]; returns 201 + stored form |
//! | `GET`    | `/forms/:id` | 404 if not found |
//! | `PUT`    | `/forms/:id` | Body: [`FormBody`]; full replace, returns the updated form |
//! | `DELETE` | `/forms/:id` | Removes the form and its submissions; 204 |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
  http::StatusCode,
  response::IntoResponse,
};
use formdesk_core::{
  DatabaseName,
  form::{FieldDescriptor, Form, FormUpdate, NewForm},
  store::RecordStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

/// JSON body accepted by `POST /forms` and `PUT /forms/:id`.
#[derive(Debug, Deserialize)]
pub struct FormBody {
  pub name:     String,
  pub fields:   Vec<FieldDescriptor>,
  pub database: String,
}

impl FormBody {
  fn into_parts(self) -> Result<(String, Vec<FieldDescriptor>, DatabaseName), ApiError> {
    let database = DatabaseName::parse(&self.database)?;
    Ok((self.name, self.fields, database))
  }
}

async fn fetch<S: RecordStore>(store: &S, id: Uuid) -> Result<Form, ApiError> {
  store
    .get_form(id)
    .await
    .map_err(ApiError::from_store)?
    .ok_or_else(|| ApiError::NotFound(format!("form {id} not found")))
}

// ─── List ─────────────────────────────────────────────────────────────────────

/// `GET /forms`
pub async fn list<S>(
  State(store): State<Arc<S>>,
) -> Result<Json<Vec<Form>>, ApiError>
where
  S: RecordStore,
{
  let forms = store.list_forms().await.map_err(ApiError::from_store)?;
  Ok(Json(forms))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /forms`
pub async fn create<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<FormBody>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body?;
  let (name, fields, database) = body.into_parts()?;
  let form = store
    .create_form(NewForm::new(name, fields, database))
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(form_id = %form.form_id, database = %form.database, "created form");
  Ok((StatusCode::CREATED, Json(form)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /forms/:id`
pub async fn get_one<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Form>, ApiError>
where
  S: RecordStore,
{
  Ok(Json(fetch(&*store, id).await?))
}

// ─── Update ───────────────────────────────────────────────────────────────────

/// `PUT /forms/:id`
pub async fn update<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
  body: Result<Json<FormBody>, JsonRejection>,
) -> Result<Json<Form>, ApiError>
where
  S: RecordStore,
{
  let Json(body) = body?;
  let (name, fields, database) = body.into_parts()?;
  store
    .update_form(id, FormUpdate { name, fields, database })
    .await
    .map_err(ApiError::from_store)?;
  tracing::info!(form_id = %id, "updated form");
  Ok(Json(fetch(&*store, id).await?))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /forms/:id`
pub async fn delete<S>(
  State(store): State<Arc<S>>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: RecordStore,
{
  store.delete_form(id).await.map_err(ApiError::from_store)?;
  tracing::info!(form_id = %id, "deleted form");
  Ok(StatusCode::NO_CONTENT)
}
