//! Compact table rendering for list commands.

use chrono::{DateTime, Utc};
use formdesk_core::{
  csv_import::CsvImport, document::Document, form::Form, submission::Submission,
};

/// Render rows as left-aligned columns separated by two spaces.
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (i, cell) in row.iter().enumerate() {
      if let Some(w) = widths.get_mut(i) {
        *w = (*w).max(cell.chars().count());
      }
    }
  }

  let line = |cells: Vec<&str>| -> String {
    let padded: Vec<String> = cells
      .iter()
      .zip(&widths)
      .map(|(cell, &w)| format!("{cell:<w$}"))
      .collect();
    padded.join("  ").trim_end().to_owned()
  };

  let mut out = line(headers.to_vec());
  out.push('\n');
  for row in rows {
    out.push_str(&line(row.iter().map(String::as_str).collect()));
    out.push('\n');
  }
  out
}

fn when(dt: DateTime<Utc>) -> String { dt.format("%Y-%m-%d %H:%M").to_string() }

pub fn forms(forms: &[Form]) -> String {
  let rows: Vec<Vec<String>> = forms
    .iter()
    .map(|f| {
      vec![
        f.form_id.to_string(),
        f.name.clone(),
        f.database.to_string(),
        f.fields.len().to_string(),
        f.submission_count.to_string(),
        when(f.created_at),
      ]
    })
    .collect();
  table(&["ID", "NAME", "DATABASE", "FIELDS", "SUBMISSIONS", "CREATED"], &rows)
}

pub fn documents(documents: &[Document]) -> String {
  let rows: Vec<Vec<String>> = documents
    .iter()
    .map(|d| {
      vec![
        d.document_id.to_string(),
        d.display_name.clone(),
        d.database.to_string(),
        d.extracted.details.kind().to_owned(),
        d.size_bytes.to_string(),
        when(d.uploaded_at),
      ]
    })
    .collect();
  table(&["ID", "NAME", "DATABASE", "KIND", "BYTES", "UPLOADED"], &rows)
}

pub fn csv_imports(imports: &[CsvImport]) -> String {
  let rows: Vec<Vec<String>> = imports
    .iter()
    .map(|i| {
      vec![
        i.csv_import_id.to_string(),
        i.filename.clone(),
        i.row_count().to_string(),
        i.column_count().to_string(),
        if i.form_generated { "yes" } else { "no" }.to_owned(),
        when(i.uploaded_at),
      ]
    })
    .collect();
  table(&["ID", "FILE", "ROWS", "COLUMNS", "FORM", "UPLOADED"], &rows)
}

pub fn submissions(submissions: &[Submission]) -> String {
  let rows: Vec<Vec<String>> = submissions
    .iter()
    .map(|s| {
      let payload = s
        .payload
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join(" ");
      vec![
        s.submission_id.to_string(),
        when(s.submitted_at),
        s.client_address.clone().unwrap_or_else(|| "-".to_owned()),
        payload,
      ]
    })
    .collect();
  table(&["#", "SUBMITTED", "CLIENT", "PAYLOAD"], &rows)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn columns_align_to_widest_cell() {
    let out = table(
      &["ID", "NAME"],
      &[
        vec!["1".into(), "short".into()],
        vec!["22".into(), "a longer name".into()],
      ],
    );
    let lines: Vec<&str> = out.lines().collect();
    assert_eq!(lines[0], "ID  NAME");
    assert_eq!(lines[1], "1   short");
    assert_eq!(lines[2], "22  a longer name");
  }

  #[test]
  fn empty_table_has_only_headers() {
    assert_eq!(table(&["A", "B"], &[]), "A  B\n");
  }
}
