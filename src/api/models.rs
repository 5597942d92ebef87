use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::identity::UpdateEntry;

/// One row as the API returns it: column name to JSON value, in column order.
pub type Record = Map<String, Value>;

/// A single line of `DESCRIBE <table>` output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescription {
  #[serde(rename = "Field")]
  pub field: String,
  #[serde(rename = "Type")]
  pub type_name: String,
  #[serde(rename = "Null", default)]
  pub null: Option<String>,
  #[serde(rename = "Key", default)]
  pub key: Option<String>,
  #[serde(rename = "Default", default)]
  pub default: Option<Value>,
  #[serde(rename = "Extra", default)]
  pub extra: Option<String>,
}

impl FieldDescription {
  pub fn is_required(&self) -> bool {
    self.null.as_deref() == Some("NO")
  }

  pub fn is_auto_increment(&self) -> bool {
    self.extra.as_deref().is_some_and(|extra| extra.contains("auto_increment"))
  }
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableList {
  #[serde(default)]
  pub tables: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct PrimaryKeyResponse {
  #[serde(default)]
  pub primary_key: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TableData {
  #[serde(default)]
  pub data: Vec<Record>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRequest {
  pub data: Vec<UpdateEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsertRequest {
  pub data: Vec<Record>,
}

/// Body of a successful write (`{status}`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteStatus {
  #[serde(default)]
  pub status: Option<String>,
}

impl WriteStatus {
  pub fn message_or(&self, fallback: &str) -> String {
    self.status.clone().filter(|s| !s.is_empty()).unwrap_or_else(|| fallback.to_string())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
  pub query: String,
  pub is_natural_language: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
  #[serde(default)]
  pub status: Option<String>,
  /// SQL produced (or corrected) by the translation service.
  #[serde(default)]
  pub query: Option<String>,
  #[serde(default)]
  pub data: Option<QueryData>,
  #[serde(default)]
  pub warning: Option<String>,
  #[serde(default)]
  pub note: Option<String>,
  #[serde(default)]
  pub original_error: Option<String>,
}

/// Query results are usually a row list; the "show everything" shortcut
/// answers with one row list per table instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryData {
  Rows(Vec<Record>),
  Tables(Map<String, Value>),
}

impl QueryData {
  /// Flattens per-table results into a single row list with a leading `table` column.
  pub fn into_rows(self) -> Vec<Record> {
    match self {
      Self::Rows(rows) => rows,
      Self::Tables(tables) => tables
        .into_iter()
        .flat_map(|(table, rows)| {
          let rows = match rows {
            Value::Array(rows) => rows,
            _ => Vec::new(),
          };
          rows.into_iter().filter_map(move |row| {
            let Value::Object(fields) = row else {
              return None;
            };
            let mut record = Record::new();
            record.insert("table".to_string(), Value::String(table.clone()));
            record.extend(fields);
            Some(record)
          })
        })
        .collect(),
    }
  }
}

/// Text shown in a grid cell for a value loaded from the API.
pub fn display_value(value: &Value) -> String {
  match value {
    Value::Null => String::new(),
    Value::String(s) => s.clone(),
    Value::Bool(b) => b.to_string(),
    Value::Number(n) => n.to_string(),
    other => other.to_string(),
  }
}

/// Column names across all records, in order of first appearance.
pub fn collect_headers<'a>(records: impl IntoIterator<Item = &'a Record>) -> Vec<String> {
  let mut headers: Vec<String> = Vec::new();
  for record in records {
    for key in record.keys() {
      if !headers.iter().any(|h| h == key) {
        headers.push(key.clone());
      }
    }
  }
  headers
}
