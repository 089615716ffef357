//! Static HTML rendering for the public form pages.
//!
//! Every piece of user-supplied text passes through [`escape`] before it is
//! written into markup.

use std::fmt::Write as _;

use formdesk_core::{
  form::{FieldDescriptor, FieldType, Form},
  submission::{Payload, Submission},
};

/// Escape text for use in element content and double-quoted attributes.
pub fn escape(s: &str) -> String {
  let mut out = String::with_capacity(s.len());
  for c in s.chars() {
    match c {
      '&' => out.push_str("&amp;"),
      '<' => out.push_str("&lt;"),
      '>' => out.push_str("&gt;"),
      '"' => out.push_str("&quot;"),
      '\'' => out.push_str("&#39;"),
      _ => out.push(c),
    }
  }
  out
}

fn page(title: &str, body: &str) -> String {
  format!(
    "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
     <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
     <title>{}</title>\n</head>\n<body>\n{body}</body>\n</html>\n",
    escape(title)
  )
}

// ─── Index ────────────────────────────────────────────────────────────────────

/// The list of published forms, linked absolutely under `base_url`.
pub fn index(forms: &[Form], base_url: &str) -> String {
  let base = base_url.trim_end_matches('/');
  let mut body = String::from("<h1>Forms</h1>\n");
  if forms.is_empty() {
    body.push_str("<p>No forms have been published yet.</p>\n");
    return page("Forms", &body);
  }
  body.push_str("<ul>\n");
  for form in forms {
    let _ = writeln!(
      body,
      "<li><a href=\"{}\">{}</a> ({}, {} submissions)</li>",
      escape(&format!("{base}{}", form.public_path)),
      escape(&form.name),
      escape(form.database.as_str()),
      form.submission_count,
    );
  }
  body.push_str("</ul>\n");
  page("Forms", &body)
}

// ─── Form ─────────────────────────────────────────────────────────────────────

fn input(out: &mut String, field: &FieldDescriptor, value: &str) {
  let name = escape(&field.name);
  let required = if field.required { " required" } else { "" };
  let placeholder = field
    .placeholder
    .as_deref()
    .map(|p| format!(" placeholder=\"{}\"", escape(p)))
    .unwrap_or_default();

  match field.field_type {
    FieldType::Textarea => {
      let _ = writeln!(
        out,
        "<textarea id=\"{name}\" name=\"{name}\"{placeholder}{required}>{}</textarea>",
        escape(value),
      );
    }
    FieldType::Select => {
      let _ = writeln!(out, "<select id=\"{name}\" name=\"{name}\"{required}>");
      out.push_str("<option value=\"\"></option>\n");
      for option in &field.options {
        let selected = if option == value { " selected" } else { "" };
        let option = escape(option);
        let _ = writeln!(out, "<option value=\"{option}\"{selected}>{option}</option>");
      }
      out.push_str("</select>\n");
    }
    FieldType::Checkbox => {
      let checked = if value.is_empty() { "" } else { " checked" };
      let _ = writeln!(
        out,
        "<input type=\"checkbox\" id=\"{name}\" name=\"{name}\" value=\"on\"{checked}{required}>",
      );
    }
    _ => {
      let _ = writeln!(
        out,
        "<input type=\"{}\" id=\"{name}\" name=\"{name}\" value=\"{}\"{placeholder}{required}>",
        field.field_type.input_type(),
        escape(value),
      );
    }
  }
}

/// A form page. `values` refills inputs after a rejected submit and
/// `errors` is shown above the form.
pub fn form_page(form: &Form, values: &Payload, errors: &[String]) -> String {
  let mut body = format!("<h1>{}</h1>\n", escape(&form.name));

  if !errors.is_empty() {
    body.push_str("<ul class=\"errors\">\n");
    for error in errors {
      let _ = writeln!(body, "<li>{}</li>", escape(error));
    }
    body.push_str("</ul>\n");
  }

  let _ = writeln!(
    body,
    "<form method=\"post\" action=\"{}\">",
    escape(&form.public_path)
  );
  for field in &form.fields {
    let marker = if field.required { " *" } else { "" };
    let _ = writeln!(
      body,
      "<p>\n<label for=\"{}\">{}{marker}</label>",
      escape(&field.name),
      escape(&field.label),
    );
    let value = values.get(&field.name).map(String::as_str).unwrap_or("");
    input(&mut body, field, value);
    body.push_str("</p>\n");
  }
  body.push_str("<button type=\"submit\">Submit</button>\n</form>\n");

  page(&form.name, &body)
}

/// Shown after a submission is recorded.
pub fn submitted_page(form: &Form, submission: &Submission) -> String {
  let body = format!(
    "<h1>Thank you</h1>\n<p>Your response to {} was recorded as #{}.</p>\n\
     <p><a href=\"{}\">Submit another response</a></p>\n",
    escape(&form.name),
    submission.submission_id,
    escape(&form.public_path),
  );
  page("Thank you", &body)
}

pub fn not_found_page() -> String {
  page("Not found", "<h1>Form not found</h1>\n<p>This form does not exist or was deleted.</p>\n")
}

#[cfg(test)]
mod tests {
  use chrono::Utc;
  use formdesk_core::{DatabaseName, form::Provenance};
  use uuid::Uuid;

  use super::*;

  fn form(name: &str, fields: Vec<FieldDescriptor>) -> Form {
    let form_id = Uuid::new_v4();
    Form {
      form_id,
      name: name.to_owned(),
      fields,
      database: DatabaseName::Customers,
      public_path: Form::public_path_for(form_id),
      created_at: Utc::now(),
      provenance: Provenance::Manual,
      submission_count: 0,
    }
  }

  #[test]
  fn escapes_markup() {
    assert_eq!(
      escape("<a href=\"x\">Tom & Jerry's</a>"),
      "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
    );
  }

  #[test]
  fn form_page_escapes_user_text() {
    let mut field = FieldDescriptor::from_header("email");
    field.label = "<script>alert(1)</script>".into();
    let html = form_page(
      &form("Sign <up>", vec![field]),
      &Payload::from([("email".to_owned(), "\"><b>".to_owned())]),
      &["Bad & wrong".to_owned()],
    );
    assert!(!html.contains("<script>"));
    assert!(!html.contains("<up>"));
    assert!(!html.contains("\"><b>"));
    assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    assert!(html.contains("Bad &amp; wrong"));
  }

  #[test]
  fn required_fields_are_marked() {
    let html = form_page(
      &form("F", vec![FieldDescriptor::from_header("first_name")]),
      &Payload::new(),
      &[],
    );
    assert!(html.contains("First Name *"));
    assert!(html.contains("name=\"first_name\""));
    assert!(html.contains(" required>"));
  }

  #[test]
  fn index_links_are_absolute() {
    let f = form("Orders", vec![FieldDescriptor::from_header("sku")]);
    let html = index(std::slice::from_ref(&f), "http://forms.example/");
    assert!(html.contains(&format!("href=\"http://forms.example/f/{}\"", f.form_id)));
    assert!(index(&[], "http://x").contains("No forms"));
  }
}
