//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Decoding happens inside row-mapping closures, so failures surface as
//! [`rusqlite::Error::FromSqlConversionFailure`] naming the offending column.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{Row, types::Type};
use uuid::Uuid;

// ─── Encoding ────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn encode_opt_uuid(id: Option<Uuid>) -> Option<String> {
  id.map(encode_uuid)
}

/// Fixed-width UTC so timestamps compare correctly as text.
pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn encode_date(date: NaiveDate) -> String {
  date.format("%Y-%m-%d").to_string()
}

pub fn encode_opt_date(date: Option<NaiveDate>) -> Option<String> {
  date.map(encode_date)
}

// ─── Decoding ────────────────────────────────────────────────────────────────

fn conversion_failure<E>(row: &Row<'_>, col: &str, err: E) -> rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  let idx = row.as_ref().column_index(col).unwrap_or_default();
  rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

/// Read a text column and parse it with [`FromStr`]. Covers UUIDs,
/// timestamps, dates, and the snake_case enum names written by strum.
pub fn parse_col<T>(row: &Row<'_>, col: &str) -> rusqlite::Result<T>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  let text: String = row.get(col)?;
  text.parse().map_err(|e| conversion_failure(row, col, e))
}

pub fn parse_opt_col<T>(row: &Row<'_>, col: &str) -> rusqlite::Result<Option<T>>
where
  T: FromStr,
  T::Err: std::error::Error + Send + Sync + 'static,
{
  row
    .get::<_, Option<String>>(col)?
    .map(|text| text.parse().map_err(|e| conversion_failure(row, col, e)))
    .transpose()
}

/// Read an integer column into a narrower unsigned type.
pub fn int_col<T>(row: &Row<'_>, col: &str) -> rusqlite::Result<T>
where
  T: TryFrom<i64>,
  T::Error: std::error::Error + Send + Sync + 'static,
{
  let value: i64 = row.get(col)?;
  T::try_from(value).map_err(|e| {
    let idx = row.as_ref().column_index(col).unwrap_or_default();
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e))
  })
}

/// Read a JSON text column.
pub fn json_col(row: &Row<'_>, col: &str) -> rusqlite::Result<Vec<String>> {
  let text: String = row.get(col)?;
  serde_json::from_str(&text).map_err(|e| conversion_failure(row, col, e))
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn timestamps_sort_as_text() {
    let a = Utc.with_ymd_and_hms(2025, 1, 9, 23, 0, 0).unwrap();
    let b = Utc.with_ymd_and_hms(2025, 1, 10, 1, 0, 0).unwrap();
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(encode_dt(a), "2025-01-09T23:00:00.000000Z");
  }

  #[test]
  fn dates_are_iso() {
    let d = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
    assert_eq!(encode_date(d), "2025-03-07");
    assert_eq!(encode_date(d).parse::<NaiveDate>().unwrap(), d);
  }
}
