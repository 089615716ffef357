//! Form submissions.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Submitted values keyed by field name. Free-form: keys are not checked
/// against the form's fields.
pub type Payload = BTreeMap<String, String>;

/// A recorded submission. Never updated; removed only when its form is
/// deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Submission {
  /// Monotonic, store-assigned.
  pub submission_id:  i64,
  pub form_id:        Uuid,
  pub payload:        Payload,
  pub submitted_at:   DateTime<Utc>,
  /// Network address of the submitting client, when known.
  pub client_address: Option<String>,
}
