//! Client side of the table API: the `TableApi` seam, its wire models and
//! the reqwest-backed implementation.

pub mod http;
pub mod models;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use self::{
  http::HttpApi,
  models::{
    display_value, FieldDescription, InsertRequest, QueryData, QueryRequest, QueryResponse, Record, UpdateRequest,
    WriteStatus,
  },
};
use crate::identity::RowIdentifier;

/// Failure of a single call against the table API.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum ApiError {
  /// The request never produced a response body (connection refused, DNS, timeout...).
  #[error("{0}")]
  Transport(String),

  /// A body came back but it was not the JSON shape we expected.
  #[error("Server returned invalid JSON - {0}")]
  InvalidJson(String),

  /// The server answered with an `{error}` object.
  #[error("{message}")]
  Reported { message: String, traceback: Option<String> },
}

impl ApiError {
  pub fn reported(message: impl Into<String>) -> Self {
    Self::Reported { message: message.into(), traceback: None }
  }

  pub fn traceback(&self) -> Option<&str> {
    match self {
      Self::Reported { traceback, .. } => traceback.as_deref(),
      _ => None,
    }
  }
}

#[async_trait]
pub trait TableApi: Send + Sync {
  async fn list_tables(&self) -> Result<Vec<String>, ApiError>;
  async fn describe(&self, table: &str) -> Result<Vec<FieldDescription>, ApiError>;
  async fn primary_key(&self, table: &str) -> Result<Vec<String>, ApiError>;
  async fn table_data(&self, table: &str) -> Result<Vec<Record>, ApiError>;
  async fn update(&self, table: &str, request: UpdateRequest) -> Result<WriteStatus, ApiError>;
  async fn insert(&self, table: &str, request: InsertRequest) -> Result<WriteStatus, ApiError>;
  async fn delete(&self, table: &str, identifier: RowIdentifier) -> Result<WriteStatus, ApiError>;
  async fn query(&self, request: QueryRequest) -> Result<QueryResponse, ApiError>;
}
