//! Core types and trait definitions for formdesk.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod csv_import;
pub mod database;
pub mod document;
pub mod error;
pub mod form;
pub mod store;
pub mod submission;

pub use database::DatabaseName;
pub use error::{Classify, Error, ErrorKind, Result};
