//! Stock-order persistence and the stock side effects of its workflow.

use fieldops_core::{
  Error as CoreError,
  common::{ListQuery, document_number},
  stock::{
    StockEffect, StockOrder, StockOrderAction, StockOrderFilter, StockOrderInput,
    StockOrderLine, StockOrderStatus, StockTransactionKind,
  },
};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{
  TxError,
  directory::SITES,
  query::{
    Table, get_row, list_page, next_sequence, not_found, now, push_uuid, require_ref,
    soft_delete, text,
  },
  stock::{LOCATIONS, Movement, PRODUCTS, level_for, record_transaction, save_level},
};
use crate::encode::{
  encode_dt, encode_opt_date, encode_opt_uuid, encode_uuid, parse_col, parse_opt_col,
};

pub(super) const STOCK_ORDERS: Table = Table {
  name:          "stock_orders",
  entity:        "stock order",
  search:        &["order_number", "notes"],
  sorts:         &[
    ("order_number", "order_number"),
    ("status", "status"),
    ("required_date", "required_date"),
    ("created_at", "created_at"),
  ],
  default_order: "created_at DESC",
  soft_delete:   true,
};

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<StockOrder> {
  Ok(StockOrder {
    id:                  parse_col(row, "id")?,
    tenant_id:           parse_col(row, "tenant_id")?,
    order_number:        row.get("order_number")?,
    site_id:             parse_col(row, "site_id")?,
    location_id:         parse_col(row, "location_id")?,
    required_date:       parse_opt_col(row, "required_date")?,
    status:              parse_col(row, "status")?,
    notes:               row.get("notes")?,
    requested_by:        parse_opt_col(row, "requested_by")?,
    approved_by:         parse_opt_col(row, "approved_by")?,
    approved_at:         parse_opt_col(row, "approved_at")?,
    collected_at:        parse_opt_col(row, "collected_at")?,
    rejection_reason:    row.get("rejection_reason")?,
    cancellation_reason: row.get("cancellation_reason")?,
    stock_reserved:      row.get("stock_reserved")?,
    lines:               Vec::new(),
    created_at:          parse_col(row, "created_at")?,
    updated_at:          parse_col(row, "updated_at")?,
  })
}

fn load_lines(conn: &Connection, order: &mut StockOrder) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(
    "SELECT id, product_id, quantity FROM stock_order_lines
     WHERE order_id = ?1 ORDER BY line_no",
  )?;
  order.lines = stmt
    .query_map(rusqlite::params![encode_uuid(order.id)], |row| {
      Ok(StockOrderLine {
        id:         parse_col(row, "id")?,
        product_id: parse_col(row, "product_id")?,
        quantity:   row.get("quantity")?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok(())
}

pub(super) fn list(
  conn: &Connection,
  tenant_id: Uuid,
  filter: StockOrderFilter,
  query: &ListQuery,
) -> rusqlite::Result<(Vec<StockOrder>, u64)> {
  let mut filters = Vec::new();
  if let Some(status) = filter.status {
    filters.push(("status = ?", text(status.to_string())));
  }
  push_uuid(&mut filters, "site_id = ?", filter.site_id);

  let (mut orders, total) =
    list_page(conn, &STOCK_ORDERS, tenant_id, filters, query, order_from_row)?;
  for order in &mut orders {
    load_lines(conn, order)?;
  }
  Ok((orders, total))
}

pub(super) fn get(
  conn: &Connection,
  tenant_id: Uuid,
  id: Uuid,
) -> rusqlite::Result<Option<StockOrder>> {
  let Some(mut order) = get_row(conn, &STOCK_ORDERS, tenant_id, id, order_from_row)?
  else {
    return Ok(None);
  };
  load_lines(conn, &mut order)?;
  Ok(Some(order))
}

fn fetch(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<StockOrder, TxError> {
  get(conn, tenant_id, id)?.ok_or_else(|| not_found(&STOCK_ORDERS, id).into())
}

fn check_refs(
  conn: &Connection,
  tenant_id: Uuid,
  input: &StockOrderInput,
) -> Result<(), TxError> {
  require_ref(conn, &SITES, tenant_id, input.site_id)?;
  require_ref(conn, &LOCATIONS, tenant_id, input.location_id)?;
  for line in &input.lines {
    require_ref(conn, &PRODUCTS, tenant_id, line.product_id)?;
  }
  Ok(())
}

fn replace_lines(
  conn: &Connection,
  order_id: Uuid,
  input: &StockOrderInput,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM stock_order_lines WHERE order_id = ?1",
    rusqlite::params![encode_uuid(order_id)],
  )?;
  for (line_no, line) in input.lines.iter().enumerate() {
    conn.execute(
      "INSERT INTO stock_order_lines (id, order_id, product_id, quantity, line_no)
       VALUES (?1, ?2, ?3, ?4, ?5)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(order_id),
        encode_uuid(line.product_id),
        line.quantity,
        line_no as i64,
      ],
    )?;
  }
  Ok(())
}

pub(super) fn create(
  conn: &Connection,
  tenant_id: Uuid,
  input: StockOrderInput,
  requested_by: Uuid,
) -> Result<StockOrder, TxError> {
  check_refs(conn, tenant_id, &input)?;

  let id = Uuid::new_v4();
  let number = document_number("SO", next_sequence(conn, &STOCK_ORDERS, tenant_id)?);
  conn.execute(
    "INSERT INTO stock_orders (
       id, tenant_id, order_number, site_id, location_id, required_date, status,
       notes, requested_by, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
    rusqlite::params![
      encode_uuid(id),
      encode_uuid(tenant_id),
      number,
      encode_uuid(input.site_id),
      encode_uuid(input.location_id),
      encode_opt_date(input.required_date),
      StockOrderStatus::Draft.to_string(),
      input.notes,
      encode_uuid(requested_by),
      now(),
    ],
  )?;
  replace_lines(conn, id, &input)?;
  fetch(conn, tenant_id, id)
}

pub(super) fn update(
  conn: &Connection,
  tenant_id: Uuid,
  id: Uuid,
  input: StockOrderInput,
) -> Result<StockOrder, TxError> {
  let order = fetch(conn, tenant_id, id)?;
  if !order.status.is_editable() {
    return Err(
      CoreError::InvalidTransition {
        entity: "stock order",
        from:   order.status.to_string(),
        action: "edit",
      }
      .into(),
    );
  }
  check_refs(conn, tenant_id, &input)?;

  conn.execute(
    "UPDATE stock_orders
     SET site_id = ?1, location_id = ?2, required_date = ?3, notes = ?4, updated_at = ?5
     WHERE id = ?6",
    rusqlite::params![
      encode_uuid(input.site_id),
      encode_uuid(input.location_id),
      encode_opt_date(input.required_date),
      input.notes,
      now(),
      encode_uuid(id),
    ],
  )?;
  replace_lines(conn, id, &input)?;
  fetch(conn, tenant_id, id)
}

pub(super) fn delete(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<(), TxError> {
  let order = fetch(conn, tenant_id, id)?;
  if !order.status.is_deletable() {
    return Err(
      CoreError::InvalidTransition {
        entity: "stock order",
        from:   order.status.to_string(),
        action: "delete",
      }
      .into(),
    );
  }
  soft_delete(conn, &STOCK_ORDERS, tenant_id, id, &now())
}

/// Apply `action` and its stock effect. Returns the status the order moved
/// from together with the updated order.
pub(super) fn transition(
  conn: &Connection,
  tenant_id: Uuid,
  id: Uuid,
  action: StockOrderAction,
  actor: Uuid,
) -> Result<(StockOrderStatus, StockOrder), TxError> {
  let mut order = fetch(conn, tenant_id, id)?;
  let from = order.status;

  if action == StockOrderAction::Submit && order.lines.is_empty() {
    return Err(
      CoreError::validation("a stock order needs at least one line to be submitted")
        .into(),
    );
  }

  let (next, effect) = from.apply(&action)?;
  let now_dt = chrono::Utc::now();

  // A release only applies when approval actually reserved stock.
  let held = order.stock_reserved;
  let moves_stock = match effect {
    StockEffect::None => false,
    StockEffect::Release => held,
    StockEffect::Reserve | StockEffect::Consume => true,
  };
  if moves_stock {
    move_stock(conn, &order, actor, effect)?;
  }
  order.stock_reserved = match effect {
    StockEffect::None => held,
    StockEffect::Reserve => true,
    StockEffect::Release | StockEffect::Consume => false,
  };

  match action {
    StockOrderAction::Approve => {
      order.approved_by = Some(actor);
      order.approved_at = Some(now_dt);
    }
    StockOrderAction::Reject { reason } => order.rejection_reason = reason,
    StockOrderAction::Collect => order.collected_at = Some(now_dt),
    StockOrderAction::Cancel { reason } => order.cancellation_reason = reason,
    _ => {}
  }
  order.status = next;

  conn.execute(
    "UPDATE stock_orders
     SET status = ?1, approved_by = ?2, approved_at = ?3, collected_at = ?4,
         rejection_reason = ?5, cancellation_reason = ?6, stock_reserved = ?7,
         updated_at = ?8
     WHERE id = ?9",
    rusqlite::params![
      order.status.to_string(),
      encode_opt_uuid(order.approved_by),
      order.approved_at.map(encode_dt),
      order.collected_at.map(encode_dt),
      order.rejection_reason,
      order.cancellation_reason,
      order.stock_reserved,
      encode_dt(now_dt),
      encode_uuid(id),
    ],
  )?;

  Ok((from, fetch(conn, tenant_id, id)?))
}

/// Apply a stock effect to every line at the order's location. The first
/// line that cannot be satisfied aborts the whole transaction.
fn move_stock(
  conn: &Connection,
  order: &StockOrder,
  actor: Uuid,
  effect: StockEffect,
) -> Result<(), TxError> {
  for line in &order.lines {
    let mut level = level_for(conn, order.tenant_id, line.product_id, order.location_id)?;
    let (kind, quantity) = match effect {
      StockEffect::None => continue,
      StockEffect::Reserve => {
        level.reserve(line.quantity)?;
        (StockTransactionKind::Reservation, line.quantity)
      }
      StockEffect::Release => {
        level.release(line.quantity);
        (StockTransactionKind::Release, -line.quantity)
      }
      StockEffect::Consume => {
        level.consume(line.quantity)?;
        (StockTransactionKind::Issue, -line.quantity)
      }
    };
    save_level(conn, &level)?;
    record_transaction(conn, Movement {
      tenant_id: order.tenant_id,
      product_id: line.product_id,
      location_id: order.location_id,
      kind,
      quantity,
      reference: Some(order.order_number.as_str()),
      created_by: Some(actor),
    })?;
  }
  Ok(())
}
