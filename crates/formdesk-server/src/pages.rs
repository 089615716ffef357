//! Public HTML routes: the form index and the published form pages.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/` | Index of forms with absolute links |
//! | `GET`  | `/f/:id` | Rendered form; 404 page if unknown |
//! | `POST` | `/f/:id` | URL-encoded submit; 400 re-render when required fields are blank |

use axum::{
  extract::{Form as UrlEncoded, Path, State},
  http::StatusCode,
  response::{Html, IntoResponse, Response},
};
use formdesk_api::ClientAddress;
use formdesk_core::{Classify, ErrorKind, form::Form, store::RecordStore, submission::Payload};
use uuid::Uuid;

use crate::{AppState, html};

fn html_status(status: StatusCode, body: String) -> Response {
  (status, Html(body)).into_response()
}

fn not_found() -> Response { html_status(StatusCode::NOT_FOUND, html::not_found_page()) }

fn internal<E: std::error::Error>(e: E) -> Response {
  tracing::error!(error = %e, "page render failed");
  html_status(
    StatusCode::INTERNAL_SERVER_ERROR,
    "<!DOCTYPE html>\n<h1>Something went wrong</h1>\n".to_owned(),
  )
}

/// Look up a form by the raw path segment. Unparseable ids are simply not
/// found.
async fn lookup<S: RecordStore>(store: &S, raw_id: &str) -> Result<Form, Response> {
  let Ok(id) = Uuid::parse_str(raw_id) else {
    return Err(not_found());
  };
  match store.get_form(id).await {
    Ok(Some(form)) => Ok(form),
    Ok(None) => Err(not_found()),
    Err(e) => Err(internal(e)),
  }
}

/// `GET /`
pub async fn index<S>(State(state): State<AppState<S>>) -> Response
where
  S: RecordStore,
{
  match state.store.list_forms().await {
    Ok(forms) => Html(html::index(&forms, &state.config.base_url)).into_response(),
    Err(e) => internal(e),
  }
}

/// `GET /f/:id`
pub async fn show<S>(
  State(state): State<AppState<S>>,
  Path(raw_id): Path<String>,
) -> Response
where
  S: RecordStore,
{
  match lookup(&*state.store, &raw_id).await {
    Ok(form) => Html(html::form_page(&form, &Payload::new(), &[])).into_response(),
    Err(response) => response,
  }
}

/// `POST /f/:id`
pub async fn submit<S>(
  State(state): State<AppState<S>>,
  Path(raw_id): Path<String>,
  ClientAddress(client): ClientAddress,
  UrlEncoded(payload): UrlEncoded<Payload>,
) -> Response
where
  S: RecordStore,
{
  let form = match lookup(&*state.store, &raw_id).await {
    Ok(form) => form,
    Err(response) => return response,
  };

  let errors: Vec<String> = form
    .missing_required(&payload)
    .iter()
    .map(|f| format!("{} is required", f.label))
    .collect();
  if !errors.is_empty() {
    tracing::debug!(form_id = %form.form_id, missing = errors.len(), "rejected submission");
    return html_status(
      StatusCode::BAD_REQUEST,
      html::form_page(&form, &payload, &errors),
    );
  }

  match state
    .store
    .record_submission(form.form_id, payload, client)
    .await
  {
    Ok(submission) => {
      tracing::info!(
        form_id = %form.form_id,
        submission_id = submission.submission_id,
        "recorded public submission",
      );
      Html(html::submitted_page(&form, &submission)).into_response()
    }
    // The form was deleted between lookup and insert.
    Err(e) if e.kind() == ErrorKind::NotFound => not_found(),
    Err(e) => internal(e),
  }
}
