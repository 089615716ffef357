//! Forms, their field descriptors, and derivation from CSV headers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DatabaseName, Error, Result};

// ─── Fields ──────────────────────────────────────────────────────────────────

/// The HTML input a field renders as.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
  #[default]
  Text,
  Email,
  Number,
  Date,
  Tel,
  Url,
  Textarea,
  Select,
  Checkbox,
}

impl FieldType {
  /// The `type` attribute for `<input>`-rendered fields.
  pub fn input_type(&self) -> &'static str {
    match self {
      Self::Text | Self::Textarea | Self::Select => "text",
      Self::Email => "email",
      Self::Number => "number",
      Self::Date => "date",
      Self::Tel => "tel",
      Self::Url => "url",
      Self::Checkbox => "checkbox",
    }
  }
}

/// One input on a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
  /// Key under which submitted values are stored.
  pub name:        String,
  pub label:       String,
  #[serde(rename = "type", default)]
  pub field_type:  FieldType,
  #[serde(default)]
  pub required:    bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub placeholder: Option<String>,
  /// Choices for [`FieldType::Select`]; ignored otherwise.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub options:     Vec<String>,
}

impl FieldDescriptor {
  /// A required text field named and labelled after a CSV header.
  pub fn from_header(header: &str) -> Self {
    Self {
      name:        header.to_owned(),
      label:       label_from_header(header),
      field_type:  FieldType::Text,
      required:    true,
      placeholder: None,
      options:     Vec::new(),
    }
  }
}

// ─── Derivation ──────────────────────────────────────────────────────────────

/// Turn a column header into a human label: `_` and `-` become word breaks
/// and each word gets an upper-case first letter. The rest of each word is
/// left alone, so `"ZIP_code"` becomes `"ZIP Code"`.
pub fn label_from_header(header: &str) -> String {
  header
    .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
    .filter(|w| !w.is_empty())
    .map(capitalize)
    .collect::<Vec<_>>()
    .join(" ")
}

fn capitalize(word: &str) -> String {
  let mut chars = word.chars();
  match chars.next() {
    Some(first) => first.to_uppercase().chain(chars).collect(),
    None => String::new(),
  }
}

/// Field descriptors for a CSV import, one per header, in header order.
pub fn fields_from_headers(headers: &[String]) -> Vec<FieldDescriptor> {
  headers.iter().map(|h| FieldDescriptor::from_header(h)).collect()
}

/// Name for a form derived from `filename`: the humanised file stem followed
/// by `Form`, e.g. `"customer_list.csv"` gives `"Customer List Form"`.
pub fn derived_form_name(filename: &str) -> String {
  let stem = match filename.rsplit_once('.') {
    Some((stem, _)) if !stem.is_empty() => stem,
    _ => filename,
  };
  let label = label_from_header(stem);
  if label.is_empty() {
    "Imported Form".to_owned()
  } else {
    format!("{label} Form")
  }
}

// ─── Provenance ──────────────────────────────────────────────────────────────

/// How a form came to exist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Provenance {
  /// Authored by hand through the API.
  #[default]
  Manual,
  /// Derived from the headers of a CSV import.
  Csv { csv_import_id: Uuid },
  /// Created through the assistant tool shim.
  Assistant,
}

// ─── Form ────────────────────────────────────────────────────────────────────

/// A published form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Form {
  pub form_id:          Uuid,
  pub name:             String,
  pub fields:           Vec<FieldDescriptor>,
  pub database:         DatabaseName,
  /// Server-relative link at which the form is published.
  pub public_path:      String,
  pub created_at:       DateTime<Utc>,
  pub provenance:       Provenance,
  /// Number of live submissions; maintained by the store in the same
  /// transaction as each insert.
  pub submission_count: u64,
}

impl Form {
  /// The public link for a form id.
  pub fn public_path_for(form_id: Uuid) -> String { format!("/f/{form_id}") }

  /// Required fields that are absent or blank in `payload`, in field order.
  pub fn missing_required<'a>(
    &'a self,
    payload: &BTreeMap<String, String>,
  ) -> Vec<&'a FieldDescriptor> {
    self
      .fields
      .iter()
      .filter(|f| f.required)
      .filter(|f| payload.get(&f.name).is_none_or(|v| v.trim().is_empty()))
      .collect()
  }
}

/// Input to [`crate::store::RecordStore::create_form`].
#[derive(Debug, Clone)]
pub struct NewForm {
  pub name:       String,
  pub fields:     Vec<FieldDescriptor>,
  pub database:   DatabaseName,
  pub provenance: Provenance,
}

impl NewForm {
  /// A manually-authored form.
  pub fn new(
    name: impl Into<String>,
    fields: Vec<FieldDescriptor>,
    database: DatabaseName,
  ) -> Self {
    Self {
      name: name.into(),
      fields,
      database,
      provenance: Provenance::Manual,
    }
  }

  pub fn validate(&self) -> Result<()> { validate_form(&self.name, &self.fields) }
}

/// Replacement values for [`crate::store::RecordStore::update_form`]. All
/// three attributes are replaced; there is no partial patch.
#[derive(Debug, Clone)]
pub struct FormUpdate {
  pub name:     String,
  pub fields:   Vec<FieldDescriptor>,
  pub database: DatabaseName,
}

impl FormUpdate {
  pub fn validate(&self) -> Result<()> { validate_form(&self.name, &self.fields) }
}

fn validate_form(name: &str, fields: &[FieldDescriptor]) -> Result<()> {
  if name.trim().is_empty() {
    return Err(Error::Validation("form name is required".into()));
  }
  if fields.is_empty() {
    return Err(Error::Validation("a form needs at least one field".into()));
  }
  if let Some(pos) = fields.iter().position(|f| f.name.trim().is_empty()) {
    return Err(Error::Validation(format!("field {pos} has no name")));
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn labels_replace_separators_and_capitalize() {
    assert_eq!(label_from_header("first_name"), "First Name");
    assert_eq!(label_from_header("last-name"), "Last Name");
    assert_eq!(label_from_header("email"), "Email");
    assert_eq!(label_from_header("ZIP_code"), "ZIP Code");
    assert_eq!(label_from_header("date__of--birth"), "Date Of Birth");
  }

  #[test]
  fn fields_follow_header_order() {
    let headers = vec!["first_name".to_string(), "last-name".to_string()];
    let fields = fields_from_headers(&headers);

    let names: Vec<_> = fields.iter().map(|f| f.name.as_str()).collect();
    let labels: Vec<_> = fields.iter().map(|f| f.label.as_str()).collect();
    assert_eq!(names, ["first_name", "last-name"]);
    assert_eq!(labels, ["First Name", "Last Name"]);
    assert!(fields.iter().all(|f| f.required && f.field_type == FieldType::Text));
  }

  #[test]
  fn derived_names_use_the_file_stem() {
    assert_eq!(derived_form_name("customer_list.csv"), "Customer List Form");
    assert_eq!(derived_form_name("orders"), "Orders Form");
    assert_eq!(derived_form_name("__.csv"), "Imported Form");
  }

  #[test]
  fn field_type_serialises_under_type_key() {
    let field = FieldDescriptor::from_header("email");
    let json = serde_json::to_value(&field).unwrap();
    assert_eq!(json["type"], "text");
    assert_eq!(json["required"], true);
    assert!(json.get("options").is_none());

    let parsed: FieldDescriptor =
      serde_json::from_value(serde_json::json!({ "name": "age", "label": "Age" }))
        .unwrap();
    assert_eq!(parsed.field_type, FieldType::Text);
    assert!(!parsed.required);
  }

  #[test]
  fn validation_rejects_empty_forms() {
    let empty = NewForm::new("Signup", vec![], DatabaseName::Customers);
    assert!(matches!(empty.validate(), Err(Error::Validation(_))));

    let unnamed = NewForm::new(
      " ",
      vec![FieldDescriptor::from_header("email")],
      DatabaseName::Customers,
    );
    assert!(matches!(unnamed.validate(), Err(Error::Validation(_))));

    let blank_field = NewForm::new(
      "Signup",
      vec![FieldDescriptor::from_header("")],
      DatabaseName::Customers,
    );
    assert!(matches!(blank_field.validate(), Err(Error::Validation(_))));
  }

  #[test]
  fn missing_required_reports_blank_values() {
    let mut optional = FieldDescriptor::from_header("notes");
    optional.required = false;
    let form = Form {
      form_id:          Uuid::nil(),
      name:             "Contact".into(),
      fields:           vec![
        FieldDescriptor::from_header("name"),
        FieldDescriptor::from_header("email"),
        optional,
      ],
      database:         DatabaseName::Customers,
      public_path:      Form::public_path_for(Uuid::nil()),
      created_at:       Utc::now(),
      provenance:       Provenance::Manual,
      submission_count: 0,
    };

    let mut payload = BTreeMap::new();
    payload.insert("name".to_string(), "  ".to_string());
    let missing: Vec<_> =
      form.missing_required(&payload).iter().map(|f| f.name.as_str()).collect();
    assert_eq!(missing, ["name", "email"]);
  }
}
