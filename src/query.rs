//! Free-form queries against the query endpoint.
//!
//! A natural-language query may come back with the SQL it was translated to.
//! That SQL is kept on the panel so it can be edited and executed again as a
//! literal query with [`QueryRunner::run_direct`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::api::{display_value, models::collect_headers, ApiError, QueryRequest, QueryResponse, TableApi};

pub const NO_RESULTS: &str = "No results found";
pub const NO_RESULTS_ADVISORY: &str = "No results found for the query. Check your data or try a different question.";
pub const EMPTY_QUERY: &str = "Please enter a query";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFailure {
  pub message: String,
  pub traceback: Option<String>,
}

/// What the query area shows after the last run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPanel {
  pub status: Option<String>,
  pub failure: Option<QueryFailure>,
  /// SQL returned by the server, offered for editing and re-execution.
  pub translated_sql: Option<String>,
  pub headers: Vec<String>,
  pub rows: Vec<Vec<String>>,
  /// Shown in place of an empty result body.
  pub placeholder: Option<String>,
  /// Banner above the results. Stays until a direct run returns rows.
  pub advisory: Option<String>,
  pub highlight: bool,
  /// Warnings and notes attached to a successful response.
  pub notices: Vec<String>,
}

impl QueryPanel {
  fn clear_results(&mut self) {
    self.headers.clear();
    self.rows.clear();
    self.placeholder = None;
    self.highlight = false;
  }

  fn show_rows(&mut self, response: QueryResponse) -> usize {
    let records = response.data.map(|data| data.into_rows()).unwrap_or_default();
    self.headers = collect_headers(&records);
    self.rows = records
      .iter()
      .map(|record| self.headers.iter().map(|h| record.get(h).map(display_value).unwrap_or_default()).collect())
      .collect();
    self.placeholder = self.rows.is_empty().then(|| NO_RESULTS.to_string());
    self.rows.len()
  }

  fn show_failure(&mut self, error: ApiError) {
    match error {
      ApiError::Reported { message, traceback } => {
        self.failure = Some(QueryFailure { message, traceback });
        self.clear_results();
      },
      other => {
        self.failure = Some(QueryFailure { message: format!("Request failed: {other}"), traceback: None });
        self.status = Some(format!("Failed to execute query: {other}"));
      },
    }
  }
}

pub struct QueryRunner {
  api: Arc<dyn TableApi>,
  panel: QueryPanel,
  /// Bumped by every direct run; a highlight is only cleared by the run that set it.
  highlight_ticket: u64,
}

impl QueryRunner {
  pub fn new(api: Arc<dyn TableApi>) -> Self {
    Self { api, panel: QueryPanel::default(), highlight_ticket: 0 }
  }

  pub fn panel(&self) -> &QueryPanel {
    &self.panel
  }

  /// Ticket of the latest direct run.
  pub fn highlight_ticket(&self) -> u64 {
    self.highlight_ticket
  }

  /// Drops the highlight if `ticket` belongs to the latest direct run.
  /// Returns whether the panel changed.
  pub fn clear_highlight(&mut self, ticket: u64) -> bool {
    if ticket != self.highlight_ticket || !self.panel.highlight {
      debug!("Ignoring highlight clear for run {ticket}, latest is {}", self.highlight_ticket);
      return false;
    }
    self.panel.highlight = false;
    true
  }

  /// First-pass query. Empty results get a placeholder row only.
  pub async fn run(&mut self, text: &str, natural_language: bool) -> &QueryPanel {
    if text.trim().is_empty() {
      self.panel.status = Some(EMPTY_QUERY.to_string());
      self.panel.translated_sql = None;
      return &self.panel;
    }

    info!("Running {} query", if natural_language { "natural-language" } else { "SQL" });
    let result = self.api.query(QueryRequest { query: text.to_string(), is_natural_language: natural_language }).await;
    self.panel.highlight = false;
    match result {
      Ok(response) => {
        self.panel.failure = None;
        self.panel.status = Some(response.status.clone().unwrap_or_default());
        self.panel.translated_sql = response.query.clone().filter(|sql| !sql.trim().is_empty());
        self.panel.notices = notices(&response);
        let count = self.panel.show_rows(response);
        debug!("Query returned {count} row(s)");
      },
      Err(error) => {
        self.panel.translated_sql = None;
        self.panel.show_failure(error);
      },
    }
    &self.panel
  }

  /// Executes `sql` literally, typically the edited translation of an earlier
  /// natural-language query. Empty results and failures also raise the
  /// advisory banner; non-empty results are highlighted.
  pub async fn run_direct(&mut self, sql: &str) -> &QueryPanel {
    if sql.trim().is_empty() {
      self.panel.status = Some(EMPTY_QUERY.to_string());
      return &self.panel;
    }

    self.highlight_ticket += 1;
    info!("Executing translated SQL");
    let result = self.api.query(QueryRequest { query: sql.to_string(), is_natural_language: false }).await;
    // The SQL stays editable whatever the outcome, so it can be fixed and retried.
    self.panel.translated_sql = Some(sql.to_string());
    match result {
      Ok(response) => {
        self.panel.failure = None;
        self.panel.status = Some(response.status.clone().unwrap_or_default());
        self.panel.notices = notices(&response);
        if self.panel.show_rows(response) > 0 {
          self.panel.advisory = None;
          self.panel.highlight = true;
        } else {
          self.panel.advisory = Some(NO_RESULTS_ADVISORY.to_string());
          self.panel.highlight = false;
        }
      },
      Err(error @ ApiError::Reported { .. }) => {
        self.panel.show_failure(error);
        self.panel.advisory = Some(NO_RESULTS_ADVISORY.to_string());
      },
      Err(error) => self.panel.show_failure(error),
    }
    &self.panel
  }
}

fn notices(response: &QueryResponse) -> Vec<String> {
  let mut notices = Vec::new();
  if let Some(warning) = &response.warning {
    notices.push(format!("Warning: {warning}"));
  }
  if let Some(note) = &response.note {
    notices.push(note.clone());
  }
  if let Some(original) = &response.original_error {
    notices.push(format!("Original error: {original}"));
  }
  notices
}
