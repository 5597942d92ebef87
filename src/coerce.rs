//! Turns edited cell text into the value sent to the write API.
//!
//! Coercion is total: text that cannot be interpreted is passed through as-is.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::schema::{ColumnKind, ColumnSet};

const STORAGE_DATETIME: &str = "%Y-%m-%d %H:%M:%S";
const STORAGE_DATE: &str = "%Y-%m-%d";

const DATETIME_FORMATS: &[&str] = &[
  "%Y-%m-%dT%H:%M:%S",
  "%Y-%m-%dT%H:%M:%S%.f",
  "%Y-%m-%dT%H:%M",
  "%Y-%m-%d %H:%M",
  "%Y/%m/%d %H:%M:%S",
  "%Y/%m/%d %H:%M",
  "%m/%d/%Y %H:%M:%S",
  "%m/%d/%Y %H:%M",
  "%b %d, %Y %H:%M:%S",
  "%b %d, %Y %H:%M",
  "%B %d, %Y %H:%M:%S",
  "%B %d, %Y %H:%M",
  "%d %b %Y %H:%M:%S",
  "%d %b %Y %H:%M",
  "%a %b %d %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
  "%Y-%m-%d",
  "%Y/%m/%d",
  "%m/%d/%Y",
  "%b %d, %Y",
  "%B %d, %Y",
  "%b %d %Y",
  "%B %d %Y",
  "%d %b %Y",
  "%d %B %Y",
  "%a %b %d %Y",
];

/// Coerces the edited text of a cell given the kind of its column.
pub fn coerce(raw: &str, kind: ColumnKind) -> Value {
  match kind {
    ColumnKind::Numeric if raw.is_empty() => Value::Null,
    ColumnKind::Numeric => Value::String(raw.to_string()),
    ColumnKind::Temporal | ColumnKind::Text | ColumnKind::Other => Value::String(normalize_temporal(raw)),
  }
}

/// Coerces `raw` for `column`, looking its kind up in `columns`.
pub fn coerce_cell(columns: &ColumnSet, column: &str, raw: &str) -> Value {
  coerce(raw, columns.kind_of(column))
}

/// Rewrites date-like text into `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS`.
///
/// Text that is already in storage form, or that does not parse as a date,
/// comes back unchanged. A `T` or `:` in the input means a time was given and
/// the full datetime form is produced.
pub fn normalize_temporal(raw: &str) -> String {
  if raw.is_empty() || is_storage_formatted(raw) {
    return raw.to_string();
  }

  match parse_permissive(raw) {
    Some(parsed) if has_time_component(raw) => parsed.format(STORAGE_DATETIME).to_string(),
    Some(parsed) => parsed.format(STORAGE_DATE).to_string(),
    None => raw.to_string(),
  }
}

/// `YYYY-MM-DD`, optionally followed by a space and anything else.
pub fn is_storage_formatted(raw: &str) -> bool {
  let bytes = raw.as_bytes();
  if bytes.len() < 10 {
    return false;
  }
  let date_shape = bytes[..10]
    .iter()
    .enumerate()
    .all(|(i, b)| if i == 4 || i == 7 { *b == b'-' } else { b.is_ascii_digit() });

  date_shape && matches!(bytes.get(10), None | Some(b' '))
}

fn has_time_component(raw: &str) -> bool {
  raw.contains('T') || raw.contains(':')
}

/// Lenient date/time parser. Offset-bearing input is converted to local time.
pub fn parse_permissive(raw: &str) -> Option<NaiveDateTime> {
  let text = raw.trim();
  // Bare numbers are never dates here, even though some parsers accept them.
  if text.is_empty() || text.parse::<f64>().is_ok() {
    return None;
  }

  if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
    return Some(parsed.with_timezone(&Local).naive_local());
  }
  if let Ok(parsed) = DateTime::parse_from_rfc2822(text) {
    return Some(parsed.with_timezone(&Local).naive_local());
  }

  DATETIME_FORMATS
    .iter()
    .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    .or_else(|| {
      DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(text, format).ok())
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    })
}
