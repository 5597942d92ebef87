//! How a row is addressed when it is written back.
//!
//! A row is addressed by its primary-key values when the table has a primary
//! key and every key cell holds a value. Otherwise the whole row is sent as the
//! match criterion. Identical keyless rows produce identical identifiers; how
//! many stored rows such an identifier matches is up to the backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{api::Record, schema::PrimaryKeySet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RowIdentifier {
  #[serde(rename = "pk")]
  PrimaryKey(Record),
  #[serde(rename = "row_data")]
  FullRow(Record),
}

impl RowIdentifier {
  pub fn resolve(row: &Record, primary_key: &PrimaryKeySet) -> Self {
    if !is_pk_addressable(row, primary_key) {
      return Self::FullRow(row.clone());
    }

    let key = primary_key
      .iter()
      .filter_map(|column| row.get(column).map(|value| (column.to_string(), value.clone())))
      .collect();
    Self::PrimaryKey(key)
  }

  pub fn values(&self) -> &Record {
    match self {
      Self::PrimaryKey(values) | Self::FullRow(values) => values,
    }
  }

  pub fn is_empty(&self) -> bool {
    self.values().is_empty()
  }

  pub fn is_primary_key(&self) -> bool {
    matches!(self, Self::PrimaryKey(_))
  }
}

/// True when every primary-key column of `row` holds a non-empty value.
pub fn is_pk_addressable(row: &Record, primary_key: &PrimaryKeySet) -> bool {
  !primary_key.is_empty() && primary_key.iter().all(|column| row.get(column).is_some_and(has_value))
}

fn has_value(value: &Value) -> bool {
  match value {
    Value::Null => false,
    Value::String(s) => !s.is_empty(),
    _ => true,
  }
}

/// One element of an update batch: where the row is, and what it should now hold.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UpdateEntry {
  #[serde(flatten)]
  pub identifier: RowIdentifier,
  pub row: Record,
}

impl UpdateEntry {
  pub fn new(row: Record, primary_key: &PrimaryKeySet) -> Self {
    Self { identifier: RowIdentifier::resolve(&row, primary_key), row }
  }
}
