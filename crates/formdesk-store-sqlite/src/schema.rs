//! SQL schema for the formdesk SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// There is no `ON DELETE CASCADE`: with foreign keys enforced, a form row
/// cannot be deleted while submissions still reference it, so the store must
/// remove submissions first.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Documents are written once at upload and never updated.
CREATE TABLE IF NOT EXISTS documents (
    document_id    TEXT PRIMARY KEY,
    filename       TEXT NOT NULL,
    display_name   TEXT NOT NULL,
    storage_path   TEXT NOT NULL,
    database_name  TEXT NOT NULL,   -- 'customers' | 'inventory' | 'orders' | 'employees'
    extracted_json TEXT NOT NULL,   -- JSON-encoded ExtractedContent
    uploaded_at    TEXT NOT NULL,   -- RFC 3339 UTC, microsecond precision
    status         TEXT NOT NULL,   -- 'uploaded' | 'processed'
    size_bytes     INTEGER NOT NULL,
    content_type   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS csv_imports (
    csv_import_id  TEXT PRIMARY KEY,
    filename       TEXT NOT NULL,
    headers_json   TEXT NOT NULL,   -- JSON array, file order
    rows_json      TEXT NOT NULL,   -- JSON array of header -> value objects
    uploaded_at    TEXT NOT NULL,
    form_generated INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS forms (
    form_id          TEXT PRIMARY KEY,
    name             TEXT NOT NULL,
    fields_json      TEXT NOT NULL,   -- JSON array of FieldDescriptor
    database_name    TEXT NOT NULL,
    provenance       TEXT NOT NULL DEFAULT '{\"kind\":\"manual\"}',
    created_at       TEXT NOT NULL,
    submission_count INTEGER NOT NULL DEFAULT 0 CHECK (submission_count >= 0)
);

CREATE TABLE IF NOT EXISTS submissions (
    submission_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    form_id        TEXT NOT NULL REFERENCES forms(form_id),
    payload_json   TEXT NOT NULL,
    submitted_at   TEXT NOT NULL,
    client_address TEXT
);

CREATE INDEX IF NOT EXISTS documents_uploaded_idx   ON documents(uploaded_at);
CREATE INDEX IF NOT EXISTS documents_database_idx   ON documents(database_name);
CREATE INDEX IF NOT EXISTS forms_created_idx        ON forms(created_at);
CREATE INDEX IF NOT EXISTS submissions_form_idx     ON submissions(form_id);

PRAGMA user_version = 1;
";
