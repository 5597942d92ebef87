//! Load → edit → reconcile cycle for a single table.
//!
//! The session owns the rows currently on screen. Writes are submitted as one
//! request each and followed by a full reload; nothing is patched locally.
//! Loads are tagged with a generation so that a slow response for a table the
//! user already left cannot overwrite the newer view.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::{
  api::{display_value, models::collect_headers, ApiError, InsertRequest, Record, TableApi, UpdateRequest},
  coerce::{coerce_cell, normalize_temporal},
  identity::{RowIdentifier, UpdateEntry},
  schema::{ColumnDescriptor, ColumnSet, PrimaryKeySet, SchemaClient},
};

pub const NO_DATA_PLACEHOLDER: &str = "No data available";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
  #[error("Please select a table")]
  NoTableSelected,
  #[error("Row index out of range: {index} (table has {len} rows)")]
  RowOutOfRange { index: usize, len: usize },
  #[error("Row no longer exists in the loaded table")]
  RowGone(RowToken),
  #[error("No valid rows to update.")]
  NoValidRows,
  #[error("Row {0} has no values to identify it by")]
  EmptyIdentifier(usize),
  #[error("Column '{0}' is part of the primary key and cannot be edited")]
  ReadOnlyColumn(String),
  #[error("Unknown column '{0}'")]
  UnknownColumn(String),
  #[error("No value given for required column '{0}'")]
  MissingRequiredValue(String),
  #[error("Failed to fetch table schema.")]
  SchemaUnavailable(#[source] ApiError),
  #[error(transparent)]
  SchemaRejected(ApiError),
  #[error("{context}: {source}")]
  Api { context: &'static str, source: ApiError },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
  /// No table selected.
  #[default]
  Empty,
  Loaded,
  /// A write is in flight.
  Reconciling,
  /// The last load or write failed. Any operation may be retried from here.
  Error(String),
}

/// Opaque per-load row id. Only used to tell rows apart on screen; never sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RowToken(u64);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EditableRow {
  pub token: RowToken,
  /// Position of the row in the loaded result set.
  pub origin: usize,
  /// Cell text, aligned with [`TableView::headers`].
  pub cells: Vec<String>,
  pub dirty: bool,
}

impl EditableRow {
  /// The row exactly as displayed.
  pub fn displayed(&self, headers: &[String]) -> Record {
    headers.iter().cloned().zip(self.cells.iter().map(|cell| Value::String(cell.clone()))).collect()
  }

  /// The row with every cell coerced for its column.
  pub fn coerced(&self, headers: &[String], columns: &ColumnSet) -> Record {
    headers.iter().zip(&self.cells).map(|(column, cell)| (column.clone(), coerce_cell(columns, column, cell))).collect()
  }
}

/// Everything the grid needs to draw the selected table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableView {
  pub table: Option<String>,
  pub headers: Vec<String>,
  pub rows: Vec<EditableRow>,
  pub primary_key: PrimaryKeySet,
  pub columns: ColumnSet,
  pub state: SessionState,
  pub generation: u64,
}

impl TableView {
  pub fn placeholder(&self) -> Option<&'static str> {
    (self.state == SessionState::Loaded && self.rows.is_empty()).then_some(NO_DATA_PLACEHOLDER)
  }

  pub fn is_read_only(&self, column: &str) -> bool {
    self.primary_key.contains(column)
  }

  pub fn column_index(&self, column: &str) -> Option<usize> {
    self.headers.iter().position(|h| h == column)
  }

  pub fn index_of(&self, token: RowToken) -> Option<usize> {
    self.rows.iter().position(|row| row.token == token)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadTicket {
  pub generation: u64,
  pub table: String,
}

/// Result of fetching primary key, schema and rows for one [`LoadTicket`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchedTable {
  pub ticket: LoadTicket,
  pub primary_key: PrimaryKeySet,
  pub columns: ColumnSet,
  pub data: Result<Vec<Record>, ApiError>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertField {
  pub column: ColumnDescriptor,
  pub value: Option<String>,
}

impl InsertField {
  pub fn is_required(&self) -> bool {
    !self.column.nullable
  }

  pub fn prompt(&self) -> String {
    format!("Enter value for required column '{}' ({}):", self.column.name, self.column.type_name)
  }
}

/// Values for a new row, collected before anything is submitted.
///
/// Auto-generated columns are left out entirely. Nullable columns that were
/// not answered are inserted as `NULL`; required ones must be answered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InsertForm {
  pub table: String,
  pub fields: Vec<InsertField>,
}

impl InsertForm {
  pub fn new(table: impl Into<String>, columns: &ColumnSet) -> Self {
    let fields = columns
      .iter()
      .filter(|column| !column.auto_generated)
      .map(|column| InsertField { column: column.clone(), value: None })
      .collect();
    Self { table: table.into(), fields }
  }

  pub fn next_unanswered(&self) -> Option<&InsertField> {
    self.fields.iter().find(|field| field.is_required() && field.value.is_none())
  }

  pub fn answer(&mut self, column: &str, value: impl Into<String>) -> Result<(), SessionError> {
    let field = self
      .fields
      .iter_mut()
      .find(|field| field.column.name == column)
      .ok_or_else(|| SessionError::UnknownColumn(column.to_string()))?;
    field.value = Some(value.into());
    Ok(())
  }

  pub fn is_complete(&self) -> bool {
    self.next_unanswered().is_none()
  }

  pub fn to_row(&self) -> Result<Record, SessionError> {
    let mut row = Record::new();
    for field in &self.fields {
      let value = match (&field.value, field.is_required()) {
        (Some(text), _) => Value::String(normalize_temporal(text)),
        (None, false) => Value::Null,
        (None, true) => return Err(SessionError::MissingRequiredValue(field.column.name.clone())),
      };
      row.insert(field.column.name.clone(), value);
    }
    Ok(row)
  }
}

pub struct TableEditSession {
  api: Arc<dyn TableApi>,
  schema: SchemaClient,
  view: TableView,
  next_token: u64,
}

impl TableEditSession {
  pub fn new(api: Arc<dyn TableApi>) -> Self {
    Self { schema: SchemaClient::new(api.clone()), api, view: TableView::default(), next_token: 0 }
  }

  pub fn view(&self) -> &TableView {
    &self.view
  }

  pub fn state(&self) -> &SessionState {
    &self.view.state
  }

  pub fn current_table(&self) -> Option<&str> {
    self.view.table.as_deref()
  }

  pub async fn list_tables(&self) -> Result<Vec<String>, SessionError> {
    self.api.list_tables().await.map_err(|source| SessionError::Api { context: "Failed to load tables", source })
  }

  /// Drops the current table and invalidates any load still in flight.
  pub fn clear(&mut self) {
    let generation = self.view.generation + 1;
    self.view = TableView { generation, ..TableView::default() };
  }

  /// Starts a load of `table`. Any load started earlier becomes stale.
  pub fn begin_load(&mut self, table: &str) -> LoadTicket {
    if self.view.table.as_deref() != Some(table) {
      let generation = self.view.generation;
      self.view = TableView { table: Some(table.to_string()), generation, ..TableView::default() };
    }
    self.view.generation += 1;
    LoadTicket { generation: self.view.generation, table: table.to_string() }
  }

  /// Fetches primary key, schema and rows for `ticket`. Detached from the
  /// session so it can run on its own task.
  pub async fn fetch(api: Arc<dyn TableApi>, ticket: LoadTicket) -> FetchedTable {
    let schema = SchemaClient::new(api.clone());
    let primary_key = schema.fetch_primary_key(&ticket.table).await;
    let columns = schema.fetch_schema(&ticket.table).await;
    let data = api.table_data(&ticket.table).await;
    FetchedTable { ticket, primary_key, columns, data }
  }

  /// Installs a fetched table. Returns `None` when the fetch belongs to an
  /// older generation and was discarded.
  pub fn apply_load(&mut self, fetched: FetchedTable) -> Option<Result<usize, SessionError>> {
    if fetched.ticket.generation != self.view.generation {
      debug!(
        "Discarding stale load of {} (generation {} != {})",
        fetched.ticket.table, fetched.ticket.generation, self.view.generation
      );
      return None;
    }

    self.view.table = Some(fetched.ticket.table);
    self.view.primary_key = fetched.primary_key;
    self.view.columns = fetched.columns;

    match fetched.data {
      Ok(records) => {
        let headers = collect_headers(&records);
        let rows = records
          .iter()
          .enumerate()
          .map(|(origin, record)| {
            let cells = headers.iter().map(|h| record.get(h).map(display_value).unwrap_or_default()).collect();
            EditableRow { token: self.issue_token(), origin, cells, dirty: false }
          })
          .collect::<Vec<_>>();
        let count = rows.len();
        self.view.headers = headers;
        self.view.rows = rows;
        self.view.state = SessionState::Loaded;
        Some(Ok(count))
      },
      Err(source) => {
        self.view.headers.clear();
        self.view.rows.clear();
        Some(Err(self.fail("Failed to load table data", source)))
      },
    }
  }

  /// Loads `table` and waits for it. An empty name clears the session.
  pub async fn select_table(&mut self, table: &str) -> Result<usize, SessionError> {
    if table.is_empty() {
      self.clear();
      return Ok(0);
    }
    let ticket = self.begin_load(table);
    let fetched = Self::fetch(self.api.clone(), ticket).await;
    self.apply_load(fetched).unwrap_or(Ok(self.view.rows.len()))
  }

  pub async fn reload(&mut self) {
    let Some(table) = self.view.table.clone() else {
      return;
    };
    if let Err(e) = self.select_table(&table).await {
      warn!("Reload of {table} failed: {e}");
    }
  }

  /// Current position of the row behind `token`. Tokens from an earlier load never match.
  pub fn locate(&self, token: RowToken) -> Result<usize, SessionError> {
    self.require_table()?;
    self.view.index_of(token).ok_or(SessionError::RowGone(token))
  }

  pub fn edit_cell(&mut self, index: usize, column: &str, value: impl Into<String>) -> Result<(), SessionError> {
    self.require_table()?;
    if self.view.is_read_only(column) {
      return Err(SessionError::ReadOnlyColumn(column.to_string()));
    }
    let position = self.view.column_index(column).ok_or_else(|| SessionError::UnknownColumn(column.to_string()))?;
    let len = self.view.rows.len();
    let row = self.view.rows.get_mut(index).ok_or(SessionError::RowOutOfRange { index, len })?;

    let value = value.into();
    if row.cells[position] != value {
      row.cells[position] = value;
      row.dirty = true;
    }
    Ok(())
  }

  /// Every row, coerced and addressed. Rows without any identifying value are left out.
  pub fn build_update_batch(&self) -> Vec<UpdateEntry> {
    self
      .view
      .rows
      .iter()
      .map(|row| UpdateEntry::new(row.coerced(&self.view.headers, &self.view.columns), &self.view.primary_key))
      .filter(|entry| !entry.identifier.is_empty())
      .collect()
  }

  pub async fn submit_updates(&mut self) -> Result<String, SessionError> {
    let table = self.require_table()?;
    let batch = self.build_update_batch();
    if batch.is_empty() {
      return Err(SessionError::NoValidRows);
    }

    info!("Updating {} row(s) of {table}", batch.len());
    self.view.state = SessionState::Reconciling;
    let result = self.api.update(&table, UpdateRequest { data: batch }).await;
    match result {
      Ok(status) => {
        self.reload().await;
        Ok(status.message_or("Table updated successfully"))
      },
      Err(source) => Err(self.fail("Failed to update table", source)),
    }
  }

  /// First half of an insert: describes the table and returns the fields to fill in.
  pub async fn insert_form(&self) -> Result<InsertForm, SessionError> {
    let table = self.require_table()?;
    let columns = self.schema.describe(&table).await.map_err(|e| match e {
      ApiError::Reported { .. } => SessionError::SchemaRejected(e),
      _ => SessionError::SchemaUnavailable(e),
    })?;
    Ok(InsertForm::new(table, &columns))
  }

  /// Second half of an insert: validates the form and submits it as a single row.
  pub async fn submit_insert(&mut self, form: InsertForm) -> Result<String, SessionError> {
    let row = form.to_row()?;

    info!("Inserting a row into {}", form.table);
    self.view.state = SessionState::Reconciling;
    let result = self.api.insert(&form.table, InsertRequest { data: vec![row] }).await;
    match result {
      Ok(status) => {
        self.reload().await;
        Ok(status.message_or("Row inserted successfully"))
      },
      Err(source) => Err(self.fail("Failed to insert row", source)),
    }
  }

  /// Deletes the row at `index`, identified by its displayed values.
  pub async fn delete_row(&mut self, index: usize) -> Result<String, SessionError> {
    let table = self.require_table()?;
    let len = self.view.rows.len();
    let row = self.view.rows.get(index).ok_or(SessionError::RowOutOfRange { index, len })?;

    let identifier = RowIdentifier::resolve(&row.displayed(&self.view.headers), &self.view.primary_key);
    if identifier.is_empty() {
      return Err(SessionError::EmptyIdentifier(index));
    }

    info!("Deleting row {index} of {table}");
    self.view.state = SessionState::Reconciling;
    let result = self.api.delete(&table, identifier).await;
    match result {
      Ok(status) => {
        self.reload().await;
        Ok(status.message_or("Row deleted successfully"))
      },
      Err(source) => Err(self.fail("Failed to delete row", source)),
    }
  }

  fn require_table(&self) -> Result<String, SessionError> {
    self.view.table.clone().filter(|t| !t.is_empty()).ok_or(SessionError::NoTableSelected)
  }

  fn issue_token(&mut self) -> RowToken {
    self.next_token += 1;
    RowToken(self.next_token)
  }

  fn fail(&mut self, context: &'static str, source: ApiError) -> SessionError {
    let error = SessionError::Api { context, source };
    self.view.state = SessionState::Error(error.to_string());
    error
  }
}
