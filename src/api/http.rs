use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{
  header::{HeaderMap, HeaderValue, COOKIE},
  Method, RequestBuilder, Url,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
  models::{PrimaryKeyResponse, TableData, TableList},
  ApiError, FieldDescription, InsertRequest, QueryRequest, QueryResponse, Record, TableApi, UpdateRequest,
  WriteStatus,
};
use crate::{config::ApiConfig, identity::RowIdentifier};

/// `TableApi` over JSON/HTTP.
#[derive(Clone)]
pub struct HttpApi {
  base_url: Url,
  http_client: reqwest::Client,
}

impl HttpApi {
  pub fn new(settings: &ApiConfig) -> Result<Self, ApiError> {
    let base_url = Url::parse(&settings.base_url)
      .map_err(|e| ApiError::Transport(format!("Invalid API url '{}': {e}", settings.base_url)))?;
    if base_url.cannot_be_a_base() {
      return Err(ApiError::Transport(format!("Invalid API url '{}'", settings.base_url)));
    }

    let mut headers = HeaderMap::new();
    if let Some(cookie) = settings.session_cookie.as_deref().filter(|c| !c.is_empty()) {
      let value = HeaderValue::from_str(cookie).map_err(|e| ApiError::Transport(format!("Invalid session cookie: {e}")))?;
      headers.insert(COOKIE, value);
    }

    // The backend keeps the selected database in its session cookie.
    let mut builder = reqwest::Client::builder().cookie_store(true).default_headers(headers);
    if let Some(secs) = settings.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http_client = builder.build().map_err(|e| ApiError::Transport(e.to_string()))?;

    Ok(Self { base_url, http_client })
  }

  pub fn base_url(&self) -> &Url {
    &self.base_url
  }

  /// Joins path segments onto the base url, percent-encoding each one.
  pub fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn send(&self, method: Method, segments: &[&str], body: Option<Value>) -> Result<Value, ApiError> {
    let url = self.endpoint(segments);
    debug!("{method} {}", url.path());

    let mut request: RequestBuilder = self.http_client.request(method.clone(), url.clone());
    if let Some(body) = body {
      request = request.json(&body);
    }

    let started = Instant::now();
    let response = request.send().await.map_err(|e| {
      warn!("{method} {} failed: {e}", url.path());
      ApiError::Transport(e.to_string())
    })?;
    let status = response.status();
    let text = response.text().await.map_err(|e| ApiError::Transport(e.to_string()))?;
    debug!("{method} {} -> {status} in {}ms", url.path(), started.elapsed().as_millis());

    decode_body(status.as_u16(), &text).inspect_err(|e| {
      if let ApiError::Reported { message, .. } = e {
        warn!("{method} {} reported: {message}", url.path());
      }
    })
  }

  async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ApiError> {
    let body = self.send(Method::GET, segments, None).await?;
    decode_as(body)
  }

  async fn write<T: DeserializeOwned>(&self, method: Method, segments: &[&str], body: Value) -> Result<T, ApiError> {
    let body = self.send(method, segments, Some(body)).await?;
    decode_as(body)
  }
}

/// Turns a raw response into a JSON value, mapping the API's error shapes onto
/// [`ApiError::Reported`].
pub fn decode_body(status: u16, text: &str) -> Result<Value, ApiError> {
  let body: Value = serde_json::from_str(text).map_err(|e| ApiError::InvalidJson(e.to_string()))?;
  if let Some(error) = reported_error(&body) {
    return Err(error);
  }
  if !(200..300).contains(&status) {
    return Err(ApiError::reported(format!("Unknown error (HTTP {status})")));
  }
  Ok(body)
}

fn reported_error(body: &Value) -> Option<ApiError> {
  let object = body.as_object()?;
  let traceback = object.get("traceback").and_then(Value::as_str).map(str::to_string);

  match object.get("error") {
    None | Some(Value::Null) => {},
    Some(Value::String(message)) => return Some(ApiError::Reported { message: message.clone(), traceback }),
    Some(other) => return Some(ApiError::Reported { message: other.to_string(), traceback }),
  }

  // Table listing reports failures as `{success: false, message}`.
  if object.get("success") == Some(&Value::Bool(false)) {
    let message = object.get("message").and_then(Value::as_str).unwrap_or("Unknown error").to_string();
    return Some(ApiError::Reported { message, traceback });
  }

  None
}

fn decode_as<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
  serde_json::from_value(body).map_err(|e| ApiError::InvalidJson(e.to_string()))
}

fn to_body<T: serde::Serialize>(payload: &T) -> Result<Value, ApiError> {
  serde_json::to_value(payload).map_err(|e| ApiError::InvalidJson(e.to_string()))
}

#[async_trait]
impl TableApi for HttpApi {
  async fn list_tables(&self) -> Result<Vec<String>, ApiError> {
    let list: TableList = self.get(&["api", "tables"]).await?;
    Ok(list.tables)
  }

  async fn describe(&self, table: &str) -> Result<Vec<FieldDescription>, ApiError> {
    self.get(&["api", "describe", table]).await
  }

  async fn primary_key(&self, table: &str) -> Result<Vec<String>, ApiError> {
    let pk: PrimaryKeyResponse = self.get(&["api", "pk", table]).await?;
    Ok(pk.primary_key.unwrap_or_default())
  }

  async fn table_data(&self, table: &str) -> Result<Vec<Record>, ApiError> {
    let data: TableData = self.get(&["api", "table", table]).await?;
    Ok(data.data)
  }

  async fn update(&self, table: &str, request: UpdateRequest) -> Result<WriteStatus, ApiError> {
    self.write(Method::PUT, &["api", "update", table], to_body(&request)?).await
  }

  async fn insert(&self, table: &str, request: InsertRequest) -> Result<WriteStatus, ApiError> {
    self.write(Method::POST, &["api", "insert", table], to_body(&request)?).await
  }

  async fn delete(&self, table: &str, identifier: RowIdentifier) -> Result<WriteStatus, ApiError> {
    self.write(Method::DELETE, &["api", "delete", table], to_body(&identifier)?).await
  }

  async fn query(&self, request: QueryRequest) -> Result<QueryResponse, ApiError> {
    self.write(Method::POST, &["api", "query"], to_body(&request)?).await
  }
}
