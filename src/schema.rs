//! Column metadata and primary-key lookups.
//!
//! Both lookups are advisory: a failed primary-key fetch makes the table look
//! keyless and a failed schema fetch makes every column look untyped. Neither
//! ever blocks loading the table itself.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::api::{ApiError, FieldDescription, TableApi};

const NUMERIC_MARKERS: &[&str] = &["int", "decimal", "float", "double"];
const TEMPORAL_MARKERS: &[&str] = &["date", "time", "year"];
const TEXT_MARKERS: &[&str] = &["char", "text", "enum", "set", "json"];

/// Storage behaviour of a column, derived once from its declared type.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ColumnKind {
  /// Empty edits are written as `NULL`.
  Numeric,
  Temporal,
  Text,
  /// Unknown type, or a column the schema did not describe.
  #[default]
  Other,
}

impl ColumnKind {
  pub fn classify(type_name: &str) -> Self {
    let lowered = type_name.to_ascii_lowercase();
    let matches = |markers: &[&str]| markers.iter().any(|marker| lowered.contains(marker));

    if matches(NUMERIC_MARKERS) {
      Self::Numeric
    } else if matches(TEMPORAL_MARKERS) {
      Self::Temporal
    } else if matches(TEXT_MARKERS) {
      Self::Text
    } else {
      Self::Other
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDescriptor {
  pub name: String,
  /// Raw declared type, e.g. `int(11)` or `datetime`.
  pub type_name: String,
  pub nullable: bool,
  pub auto_generated: bool,
  pub kind: ColumnKind,
}

impl From<FieldDescription> for ColumnDescriptor {
  fn from(field: FieldDescription) -> Self {
    Self {
      kind: ColumnKind::classify(&field.type_name),
      nullable: !field.is_required(),
      auto_generated: field.is_auto_increment(),
      name: field.field,
      type_name: field.type_name,
    }
  }
}

/// The described columns of one table, in declaration order.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet(Vec<ColumnDescriptor>);

impl ColumnSet {
  pub fn new(columns: Vec<ColumnDescriptor>) -> Self {
    Self(columns)
  }

  pub fn get(&self, name: &str) -> Option<&ColumnDescriptor> {
    self.0.iter().find(|c| c.name == name)
  }

  pub fn kind_of(&self, name: &str) -> ColumnKind {
    self.get(name).map(|c| c.kind).unwrap_or_default()
  }

  pub fn iter(&self) -> impl Iterator<Item = &ColumnDescriptor> {
    self.0.iter()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }
}

impl FromIterator<FieldDescription> for ColumnSet {
  fn from_iter<I: IntoIterator<Item = FieldDescription>>(iter: I) -> Self {
    Self(iter.into_iter().map(ColumnDescriptor::from).collect())
  }
}

/// Ordered primary-key columns; empty for a keyless table.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrimaryKeySet(Vec<String>);

impl PrimaryKeySet {
  pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
    let mut set: Vec<String> = Vec::new();
    for column in columns {
      let column = column.into();
      if !set.contains(&column) {
        set.push(column);
      }
    }
    Self(set)
  }

  pub fn contains(&self, column: &str) -> bool {
    self.0.iter().any(|c| c == column)
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }

  pub fn iter(&self) -> impl Iterator<Item = &str> {
    self.0.iter().map(String::as_str)
  }
}

#[derive(Clone)]
pub struct SchemaClient {
  api: Arc<dyn TableApi>,
}

impl SchemaClient {
  pub fn new(api: Arc<dyn TableApi>) -> Self {
    Self { api }
  }

  /// Primary-key columns of `table`, or an empty set if they could not be fetched.
  pub async fn fetch_primary_key(&self, table: &str) -> PrimaryKeySet {
    match self.api.primary_key(table).await {
      Ok(columns) => PrimaryKeySet::new(columns),
      Err(e) => {
        warn!("Primary key lookup for {table} failed, treating it as keyless: {e}");
        PrimaryKeySet::default()
      },
    }
  }

  /// Column descriptors of `table`, or an empty set if they could not be fetched.
  pub async fn fetch_schema(&self, table: &str) -> ColumnSet {
    self.describe(table).await.unwrap_or_else(|e| {
      warn!("Schema lookup for {table} failed, columns are untyped: {e}");
      ColumnSet::default()
    })
  }

  /// Strict variant of [`Self::fetch_schema`] for callers that cannot proceed without a schema.
  pub async fn describe(&self, table: &str) -> Result<ColumnSet, ApiError> {
    let fields = self.api.describe(table).await?;
    Ok(fields.into_iter().collect())
  }
}
