use serde::{Deserialize, Serialize};
use strum::Display;

use crate::{
  mode::Mode,
  query::QueryPanel,
  session::{FetchedTable, InsertForm, RowToken, TableView},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Display, Deserialize)]
pub enum Action {
  Tick,
  Render,
  Resize(u16, u16),
  Suspend,
  Resume,
  Quit,
  Refresh,
  Error(String),
  Status(String),
  Help,
  EnterMode(Mode),
  FocusTables,
  FocusGrid,
  FocusQuery,
  FocusSql,

  // Table list
  LoadTables,
  TablesLoaded(Vec<String>),
  TableMoveUp,
  TableMoveDown,
  LoadSelectedTable,
  SelectTable(String),
  Reload,
  TableFetched(Box<FetchedTable>),
  ShowTable(Box<TableView>),

  // Grid
  RowMoveUp,
  RowMoveDown,
  ColumnLeft,
  ColumnRight,
  StartEdit,
  CommitInput,
  CancelInput,
  EditCell { row: RowToken, column: String, value: String },
  SubmitUpdates,
  BeginInsert,
  InsertFormReady(Box<InsertForm>),
  SubmitInsert(Box<InsertForm>),
  RequestDelete,
  DeleteRow(RowToken),

  // Query area
  ToggleNaturalLanguage,
  RunQuery { text: String, natural_language: bool },
  RunDirect(String),
  ShowQuery(Box<QueryPanel>),
  /// Carries the ticket of the direct run whose highlight should end.
  ClearHighlight(u64),
}
