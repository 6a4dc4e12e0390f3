//! Shared SQL helpers for tenant-scoped tables: paged listing with search and
//! sort, single-row lookup, soft delete, and reference checks.

use fieldops_core::{Error as CoreError, common::ListQuery};
use rusqlite::{Connection, OptionalExtension as _, Row, params_from_iter, types::Value};
use uuid::Uuid;

use super::TxError;
use crate::encode::{encode_dt, encode_uuid};

/// Static description of a tenant-owned table.
pub struct Table {
  pub name:          &'static str,
  /// Human-readable name used in `NotFound` errors.
  pub entity:        &'static str,
  /// Columns matched by `ListQuery::search`.
  pub search:        &'static [&'static str],
  /// Public sort key → column.
  pub sorts:         &'static [(&'static str, &'static str)],
  pub default_order: &'static str,
  pub soft_delete:   bool,
}

/// An extra `WHERE` condition with exactly one `?` placeholder.
pub type Filter = (&'static str, Value);

pub fn text(value: String) -> Value { Value::Text(value) }

pub fn uuid_value(id: Uuid) -> Value { Value::Text(encode_uuid(id)) }

/// Append the optional filters that are set.
pub fn push_uuid(filters: &mut Vec<Filter>, clause: &'static str, id: Option<Uuid>) {
  if let Some(id) = id {
    filters.push((clause, uuid_value(id)));
  }
}

fn where_clause(
  table: &Table,
  tenant_id: Uuid,
  filters: Vec<Filter>,
  query: &ListQuery,
) -> (String, Vec<Value>) {
  let mut sql = String::from("tenant_id = ?");
  let mut params = vec![uuid_value(tenant_id)];

  if table.soft_delete {
    sql.push_str(" AND is_deleted = 0");
  }

  if let Some(pattern) = query.search_pattern()
    && !table.search.is_empty()
  {
    let ors: Vec<String> =
      table.search.iter().map(|c| format!("{c} LIKE ? ESCAPE '\\'")).collect();
    sql.push_str(&format!(" AND ({})", ors.join(" OR ")));
    params.extend(table.search.iter().map(|_| Value::Text(pattern.clone())));
  }

  for (clause, value) in filters {
    sql.push_str(" AND ");
    sql.push_str(clause);
    params.push(value);
  }

  (sql, params)
}

fn order_clause(table: &Table, query: &ListQuery) -> String {
  let column = query
    .sort_by
    .as_deref()
    .and_then(|key| table.sorts.iter().find(|(k, _)| *k == key))
    .map(|(_, column)| *column);
  match column {
    Some(column) => {
      let dir = if query.sort_desc { "DESC" } else { "ASC" };
      format!("{column} {dir}, id")
    }
    None => format!("{}, id", table.default_order),
  }
}

/// One page of rows plus the total number of matching rows.
pub fn list_page<T, F>(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  filters: Vec<Filter>,
  query: &ListQuery,
  map: F,
) -> rusqlite::Result<(Vec<T>, u64)>
where
  F: FnMut(&Row<'_>) -> rusqlite::Result<T>,
{
  let (where_sql, mut params) = where_clause(table, tenant_id, filters, query);

  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM {} WHERE {where_sql}", table.name),
    params_from_iter(params.iter()),
    |r| r.get(0),
  )?;

  let sql = format!(
    "SELECT * FROM {} WHERE {where_sql} ORDER BY {} LIMIT ? OFFSET ?",
    table.name,
    order_clause(table, query),
  );
  params.push(Value::Integer(i64::from(query.page_size())));
  params.push(Value::Integer(query.offset() as i64));

  let mut stmt = conn.prepare(&sql)?;
  let items = stmt
    .query_map(params_from_iter(params.iter()), map)?
    .collect::<rusqlite::Result<Vec<_>>>()?;

  Ok((items, total.max(0) as u64))
}

/// A live row by id within the tenant.
pub fn get_row<T, F>(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Uuid,
  map: F,
) -> rusqlite::Result<Option<T>>
where
  F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
  let live = if table.soft_delete { " AND is_deleted = 0" } else { "" };
  conn
    .query_row(
      &format!(
        "SELECT * FROM {} WHERE tenant_id = ?1 AND id = ?2{live}",
        table.name
      ),
      rusqlite::params![encode_uuid(tenant_id), encode_uuid(id)],
      map,
    )
    .optional()
}

/// A row by id within the tenant, including soft-deleted rows.
pub fn get_any_row<T, F>(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Uuid,
  map: F,
) -> rusqlite::Result<Option<T>>
where
  F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
  conn
    .query_row(
      &format!("SELECT * FROM {} WHERE tenant_id = ?1 AND id = ?2", table.name),
      rusqlite::params![encode_uuid(tenant_id), encode_uuid(id)],
      map,
    )
    .optional()
}

/// Like [`get_row`], but a missing row is a `NotFound` error.
pub fn fetch<T, F>(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Uuid,
  map: F,
) -> Result<T, TxError>
where
  F: FnOnce(&Row<'_>) -> rusqlite::Result<T>,
{
  get_row(conn, table, tenant_id, id, map)?
    .ok_or_else(|| not_found(table, id).into())
}

pub fn not_found(table: &Table, id: Uuid) -> CoreError {
  CoreError::NotFound { entity: table.entity, id }
}

/// Mark a live row deleted. Returns `NotFound` if there was no live row.
pub fn soft_delete(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Uuid,
  now: &str,
) -> Result<(), TxError> {
  let changed = conn.execute(
    &format!(
      "UPDATE {} SET is_deleted = 1, deleted_at = ?1, updated_at = ?1
       WHERE tenant_id = ?2 AND id = ?3 AND is_deleted = 0",
      table.name
    ),
    rusqlite::params![now, encode_uuid(tenant_id), encode_uuid(id)],
  )?;
  if changed == 0 {
    return Err(not_found(table, id).into());
  }
  Ok(())
}

/// Check that a referenced record exists, is live, and belongs to the tenant.
pub fn require_ref(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Uuid,
) -> Result<(), TxError> {
  let live = if table.soft_delete { " AND is_deleted = 0" } else { "" };
  let found = conn
    .query_row(
      &format!(
        "SELECT 1 FROM {} WHERE tenant_id = ?1 AND id = ?2{live}",
        table.name
      ),
      rusqlite::params![encode_uuid(tenant_id), encode_uuid(id)],
      |_| Ok(()),
    )
    .optional()?;
  match found {
    Some(()) => Ok(()),
    None => Err(not_found(table, id).into()),
  }
}

pub fn require_opt_ref(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
  id: Option<Uuid>,
) -> Result<(), TxError> {
  match id {
    Some(id) => require_ref(conn, table, tenant_id, id),
    None => Ok(()),
  }
}

/// Next per-tenant document sequence. Deleted rows still count, so numbers
/// are never reused.
pub fn next_sequence(
  conn: &Connection,
  table: &Table,
  tenant_id: Uuid,
) -> rusqlite::Result<u64> {
  let count: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM {} WHERE tenant_id = ?1", table.name),
    rusqlite::params![encode_uuid(tenant_id)],
    |r| r.get(0),
  )?;
  Ok(count.max(0) as u64 + 1)
}

pub fn now() -> String { encode_dt(chrono::Utc::now()) }
