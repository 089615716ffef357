//! The fixed set of owning database-names.
//!
//! A database-name groups documents and forms by business domain. It is a
//! label for filtering and reporting, not an isolation boundary.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString, IntoEnumIterator};

use crate::{Error, Result};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DatabaseName {
  Customers,
  Inventory,
  Orders,
  Employees,
}

impl DatabaseName {
  /// Parse a label, trimming surrounding whitespace and ignoring case.
  pub fn parse(s: &str) -> Result<Self> {
    let trimmed = s.trim();
    Self::from_str(&trimmed.to_ascii_lowercase())
      .map_err(|_| Error::UnknownDatabase(trimmed.to_owned()))
  }

  /// The stored and serialised form, e.g. `"customers"`.
  pub fn as_str(&self) -> &str { self.as_ref() }

  /// Every recognised database-name, in declaration order.
  pub fn all() -> impl Iterator<Item = Self> { Self::iter() }
}
