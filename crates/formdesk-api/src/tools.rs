//! Tool-call shim for an external assistant.
//!
//! Each tool is a thin pass-through to [`RecordStore`] plus simple
//! aggregation. Calls arrive as `{"name": .., "arguments": {..}}`; the
//! result is wrapped as `{"result": ..}`.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/tools` | Tool definitions with JSON parameter schemas |
//! | `POST` | `/tools/call` | Body: [`ToolCall`] |
//! | `GET`  | `/stats` | Same as the `get_system_stats` tool |

use std::{str::FromStr, sync::Arc};

use axum::{
  Json,
  extract::{State, rejection::JsonRejection},
};
use formdesk_core::{
  DatabaseName,
  document::Document,
  form::{FieldDescriptor, Form, NewForm, Provenance},
  store::RecordStore,
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use strum::{EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Definitions ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum Tool {
  QueryDatabase,
  GetAllDocuments,
  GetAllForms,
  GetFormSubmissions,
  CreateForm,
  GetSystemStats,
}

/// A tool as advertised to the assistant.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
  pub name:        &'static str,
  pub description: &'static str,
  /// JSON schema for the tool's arguments.
  pub parameters:  Value,
}

fn database_schema() -> Value {
  let names: Vec<String> = DatabaseName::all().map(|d| d.to_string()).collect();
  json!({ "type": "string", "enum": names })
}

impl Tool {
  /// The wire name, e.g. `"query_database"`.
  pub fn name(&self) -> &'static str { (*self).into() }

  pub fn definition(&self) -> ToolDefinition {
    let no_args = json!({ "type": "object", "properties": {} });
    let (description, parameters) = match self {
      Tool::QueryDatabase => (
        "List the documents and forms labelled with a database-name.",
        json!({
          "type": "object",
          "properties": { "database": database_schema() },
          "required": ["database"],
        }),
      ),
      Tool::GetAllDocuments => ("List every uploaded document, newest first.", no_args),
      Tool::GetAllForms => (
        "List every form with its public link and submission count.",
        no_args,
      ),
      Tool::GetFormSubmissions => (
        "List the submissions recorded for a form, oldest first.",
        json!({
          "type": "object",
          "properties": { "form_id": { "type": "string", "format": "uuid" } },
          "required": ["form_id"],
        }),
      ),
      Tool::CreateForm => (
        "Create and publish a new form.",
        json!({
          "type": "object",
          "properties": {
            "name": { "type": "string" },
            "database": database_schema(),
            "fields": {
              "type": "array",
              "minItems": 1,
              "items": {
                "type": "object",
                "properties": {
                  "name":        { "type": "string" },
                  "label":       { "type": "string" },
                  "type":        {
                    "type": "string",
                    "enum": ["text", "email", "number", "date", "tel", "url",
                             "textarea", "select", "checkbox"],
                  },
                  "required":    { "type": "boolean" },
                  "placeholder": { "type": "string" },
                  "options":     { "type": "array", "items": { "type": "string" } },
                },
                "required": ["name", "label"],
              },
            },
          },
          "required": ["name", "fields", "database"],
        }),
      ),
      Tool::GetSystemStats => (
        "Totals of documents, forms, submissions and CSV imports, with \
         counts per database-name.",
        no_args,
      ),
    };
    ToolDefinition { name: self.name(), description, parameters }
  }
}

/// Every tool, in a stable order.
pub fn definitions() -> Vec<ToolDefinition> {
  Tool::iter().map(|t| t.definition()).collect()
}

// ─── Stats ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseStats {
  pub database:    DatabaseName,
  pub documents:   u64,
  pub forms:       u64,
  pub submissions: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStats {
  pub total_documents:        u64,
  pub total_forms:            u64,
  pub total_submissions:      u64,
  pub total_csv_imports:      u64,
  pub csv_imports_with_forms: u64,
  /// One entry per recognised database-name, zero counts included.
  pub by_database:            Vec<DatabaseStats>,
}

fn count<T>(items: impl IntoIterator<Item = T>) -> u64 {
  items.into_iter().count() as u64
}

pub async fn system_stats<S: RecordStore>(store: &S) -> Result<SystemStats, ApiError> {
  let documents = store.list_documents().await.map_err(ApiError::from_store)?;
  let forms = store.list_forms().await.map_err(ApiError::from_store)?;
  let imports = store.list_csv_imports().await.map_err(ApiError::from_store)?;

  let by_database = DatabaseName::all()
    .map(|db| DatabaseStats {
      database:    db,
      documents:   count(documents.iter().filter(|d| d.database == db)),
      forms:       count(forms.iter().filter(|f| f.database == db)),
      submissions: forms
        .iter()
        .filter(|f| f.database == db)
        .map(|f| f.submission_count)
        .sum(),
    })
    .collect();

  Ok(SystemStats {
    total_documents: count(&documents),
    total_forms: count(&forms),
    total_submissions: forms.iter().map(|f| f.submission_count).sum(),
    total_csv_imports: count(&imports),
    csv_imports_with_forms: count(imports.iter().filter(|i| i.form_generated)),
    by_database,
  })
}

// ─── Dispatch ─────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /tools/call`.
#[derive(Debug, Clone, Deserialize)]
pub struct ToolCall {
  pub name:      String,
  #[serde(default)]
  pub arguments: Value,
}

#[derive(Debug, Deserialize)]
struct DatabaseArgs {
  database: String,
}

#[derive(Debug, Deserialize)]
struct FormIdArgs {
  form_id: Uuid,
}

#[derive(Debug, Deserialize)]
struct CreateFormArgs {
  name:     String,
  fields:   Vec<FieldDescriptor>,
  database: String,
}

fn args<T: DeserializeOwned>(tool: Tool, arguments: Value) -> Result<T, ApiError> {
  let arguments = if arguments.is_null() { json!({}) } else { arguments };
  serde_json::from_value(arguments).map_err(|e| {
    ApiError::BadRequest(format!("invalid arguments for {}: {e}", tool.name()))
  })
}

fn to_value<T: Serialize>(value: &T) -> Result<Value, ApiError> {
  serde_json::to_value(value).map_err(|e| ApiError::from_store(formdesk_core::Error::from(e)))
}

fn form_summary(form: &Form) -> Value {
  json!({
    "form_id": form.form_id,
    "name": form.name,
    "database": form.database,
    "public_path": form.public_path,
    "field_count": form.fields.len(),
    "submission_count": form.submission_count,
    "created_at": form.created_at,
  })
}

fn document_summary(doc: &Document) -> Value {
  json!({
    "document_id": doc.document_id,
    "display_name": doc.display_name,
    "filename": doc.filename,
    "database": doc.database,
    "status": doc.status,
    "content_type": doc.content_type,
    "size_bytes": doc.size_bytes,
    "uploaded_at": doc.uploaded_at,
  })
}

/// Run a single tool against `store`.
///
/// Unknown tool names and malformed arguments are client faults.
pub async fn call<S: RecordStore>(store: &S, tool_call: ToolCall) -> Result<Value, ApiError> {
  let tool = Tool::from_str(&tool_call.name)
    .map_err(|_| ApiError::BadRequest(format!("unknown tool: {:?}", tool_call.name)))?;
  tracing::info!(tool = tool.name(), "tool call");

  match tool {
    Tool::QueryDatabase => {
      let DatabaseArgs { database } = args(tool, tool_call.arguments)?;
      let database = DatabaseName::parse(&database)?;
      let documents: Vec<Value> = store
        .list_documents()
        .await
        .map_err(ApiError::from_store)?
        .iter()
        .filter(|d| d.database == database)
        .map(document_summary)
        .collect();
      let forms: Vec<Form> = store
        .list_forms()
        .await
        .map_err(ApiError::from_store)?
        .into_iter()
        .filter(|f| f.database == database)
        .collect();
      let submissions: u64 = forms.iter().map(|f| f.submission_count).sum();
      Ok(json!({
        "database": database,
        "document_count": documents.len(),
        "form_count": forms.len(),
        "submission_count": submissions,
        "documents": documents,
        "forms": forms.iter().map(form_summary).collect::<Vec<_>>(),
      }))
    }
    Tool::GetAllDocuments => {
      let documents = store.list_documents().await.map_err(ApiError::from_store)?;
      Ok(json!({
        "count": documents.len(),
        "documents": documents.iter().map(document_summary).collect::<Vec<_>>(),
      }))
    }
    Tool::GetAllForms => {
      let forms = store.list_forms().await.map_err(ApiError::from_store)?;
      Ok(json!({
        "count": forms.len(),
        "forms": forms.iter().map(form_summary).collect::<Vec<_>>(),
      }))
    }
    Tool::GetFormSubmissions => {
      let FormIdArgs { form_id } = args(tool, tool_call.arguments)?;
      let submissions = store
        .list_submissions(form_id)
        .await
        .map_err(ApiError::from_store)?;
      Ok(json!({
        "form_id": form_id,
        "count": submissions.len(),
        "submissions": to_value(&submissions)?,
      }))
    }
    Tool::CreateForm => {
      let CreateFormArgs { name, fields, database } = args(tool, tool_call.arguments)?;
      let input = NewForm {
        name,
        fields,
        database: DatabaseName::parse(&database)?,
        provenance: Provenance::Assistant,
      };
      let form = store.create_form(input).await.map_err(ApiError::from_store)?;
      tracing::info!(form_id = %form.form_id, "created form via tool call");
      to_value(&form)
    }
    Tool::GetSystemStats => to_value(&system_stats(store).await?),
  }
}

// ─── Handlers ─────────────────────────────────────────────────────────────────

/// `GET /tools`
pub async fn list() -> Json<Vec<ToolDefinition>> { Json(definitions()) }

/// `POST /tools/call`
pub async fn call_handler<S>(
  State(store): State<Arc<S>>,
  body: Result<Json<ToolCall>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: RecordStore,
{
  let Json(tool_call) = body?;
  let result = call(&*store, tool_call).await?;
  Ok(Json(json!({ "result": result })))
}

/// `GET /stats`
pub async fn stats<S>(State(store): State<Arc<S>>) -> Result<Json<SystemStats>, ApiError>
where
  S: RecordStore,
{
  Ok(Json(system_stats(&*store).await?))
}
