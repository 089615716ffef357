//! JSON REST API for formdesk.
//!
//! Exposes an axum [`Router`] backed by any [`formdesk_core::store::RecordStore`],
//! plus the assistant tool-call shim. Uploads, HTML pages and transport
//! concerns belong to the server.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", formdesk_api::api_router(store.clone()))
//! ```

pub mod client;
pub mod csv_imports;
pub mod documents;
pub mod error;
pub mod forms;
pub mod submissions;
pub mod tools;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use formdesk_core::store::RecordStore;

pub use client::ClientAddress;
pub use error::ApiError;

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>) -> Router<()>
where
  S: RecordStore + 'static,
{
  Router::new()
    // Documents
    .route("/documents", get(documents::list::<S>))
    .route("/documents/{id}", get(documents::get_one::<S>))
    // CSV imports
    .route("/csv-imports", get(csv_imports::list::<S>))
    .route("/csv-imports/{id}", get(csv_imports::get_one::<S>))
    .route("/csv-imports/{id}/form", post(csv_imports::derive_form::<S>))
    // Forms
    .route("/forms", get(forms::list::<S>).post(forms::create::<S>))
    .route(
      "/forms/{id}",
      get(forms::get_one::<S>)
        .put(forms::update::<S>)
        .delete(forms::delete::<S>),
    )
    .route(
      "/forms/{id}/submissions",
      get(submissions::list::<S>).post(submissions::create::<S>),
    )
    // Assistant tools
    .route("/stats", get(tools::stats::<S>))
    .route("/tools", get(tools::list))
    .route("/tools/call", post(tools::call_handler::<S>))
    .with_state(store)
}
