//! Purchase orders and goods receipt.

use fieldops_core::{
  Error as CoreError,
  common::{ListQuery, Page, document_number},
  purchasing::{
    PurchaseOrder, PurchaseOrderAction, PurchaseOrderFilter, PurchaseOrderInput,
    PurchaseOrderLine, PurchaseOrderStatus, PurchaseReceipt,
  },
  stock::StockTransactionKind,
  store::PurchasingStore,
};
use rusqlite::{Connection, Row};
use uuid::Uuid;

use super::{
  SqliteStore, TxError,
  query::{
    Table, get_row, list_page, next_sequence, not_found, now, push_uuid, require_ref,
    soft_delete, text,
  },
  stock::{LOCATIONS, Movement, PRODUCTS, SUPPLIERS, level_for, record_transaction, save_level},
};
use crate::{
  Result,
  encode::{encode_opt_date, encode_uuid, parse_col, parse_opt_col},
};

const PURCHASE_ORDERS: Table = Table {
  name:          "purchase_orders",
  entity:        "purchase order",
  search:        &["order_number", "notes"],
  sorts:         &[
    ("order_number", "order_number"),
    ("status", "status"),
    ("expected_date", "expected_date"),
    ("created_at", "created_at"),
  ],
  default_order: "created_at DESC",
  soft_delete:   true,
};

fn order_from_row(row: &Row<'_>) -> rusqlite::Result<PurchaseOrder> {
  Ok(PurchaseOrder {
    id:            parse_col(row, "id")?,
    tenant_id:     parse_col(row, "tenant_id")?,
    order_number:  row.get("order_number")?,
    supplier_id:   parse_col(row, "supplier_id")?,
    location_id:   parse_col(row, "location_id")?,
    expected_date: parse_opt_col(row, "expected_date")?,
    status:        parse_col(row, "status")?,
    notes:         row.get("notes")?,
    created_by:    parse_opt_col(row, "created_by")?,
    lines:         Vec::new(),
    total:         0,
    created_at:    parse_col(row, "created_at")?,
    updated_at:    parse_col(row, "updated_at")?,
  })
}

fn load_lines(conn: &Connection, order: &mut PurchaseOrder) -> rusqlite::Result<()> {
  let mut stmt = conn.prepare(
    "SELECT * FROM purchase_order_lines WHERE order_id = ?1 ORDER BY line_no",
  )?;
  order.lines = stmt
    .query_map(rusqlite::params![encode_uuid(order.id)], |row| {
      Ok(PurchaseOrderLine {
        id:                parse_col(row, "id")?,
        product_id:        parse_col(row, "product_id")?,
        quantity_ordered:  row.get("quantity_ordered")?,
        quantity_received: row.get("quantity_received")?,
        unit_cost:         row.get("unit_cost")?,
      })
    })?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  order.total = PurchaseOrder::compute_total(&order.lines);
  Ok(())
}

fn get(conn: &Connection, tenant_id: Uuid, id: Uuid) -> rusqlite::Result<Option<PurchaseOrder>> {
  let Some(mut order) = get_row(conn, &PURCHASE_ORDERS, tenant_id, id, order_from_row)?
  else {
    return Ok(None);
  };
  load_lines(conn, &mut order)?;
  Ok(Some(order))
}

fn fetch(conn: &Connection, tenant_id: Uuid, id: Uuid) -> Result<PurchaseOrder, TxError> {
  get(conn, tenant_id, id)?.ok_or_else(|| not_found(&PURCHASE_ORDERS, id).into())
}

fn check_refs(
  conn: &Connection,
  tenant_id: Uuid,
  input: &PurchaseOrderInput,
) -> Result<(), TxError> {
  require_ref(conn, &SUPPLIERS, tenant_id, input.supplier_id)?;
  require_ref(conn, &LOCATIONS, tenant_id, input.location_id)?;
  for line in &input.lines {
    require_ref(conn, &PRODUCTS, tenant_id, line.product_id)?;
  }
  Ok(())
}

fn replace_lines(
  conn: &Connection,
  order_id: Uuid,
  input: &PurchaseOrderInput,
) -> rusqlite::Result<()> {
  conn.execute(
    "DELETE FROM purchase_order_lines WHERE order_id = ?1",
    rusqlite::params![encode_uuid(order_id)],
  )?;
  for (line_no, line) in input.lines.iter().enumerate() {
    conn.execute(
      "INSERT INTO purchase_order_lines (
         id, order_id, product_id, quantity_ordered, quantity_received, unit_cost, line_no
       ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6)",
      rusqlite::params![
        encode_uuid(Uuid::new_v4()),
        encode_uuid(order_id),
        encode_uuid(line.product_id),
        line.quantity_ordered,
        line.unit_cost,
        line_no as i64,
      ],
    )?;
  }
  Ok(())
}

fn set_status(
  conn: &Connection,
  id: Uuid,
  status: PurchaseOrderStatus,
) -> rusqlite::Result<()> {
  conn.execute(
    "UPDATE purchase_orders SET status = ?1, updated_at = ?2 WHERE id = ?3",
    rusqlite::params![status.to_string(), now(), encode_uuid(id)],
  )?;
  Ok(())
}

fn refuse(order: &PurchaseOrder, action: &'static str) -> TxError {
  CoreError::InvalidTransition {
    entity: "purchase order",
    from: order.status.to_string(),
    action,
  }
  .into()
}

impl PurchasingStore for SqliteStore {
  async fn list_purchase_orders(
    &self,
    tenant_id: Uuid,
    filter: PurchaseOrderFilter,
    query: ListQuery,
  ) -> Result<Page<PurchaseOrder>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        if let Some(status) = filter.status {
          filters.push(("status = ?", text(status.to_string())));
        }
        push_uuid(&mut filters, "supplier_id = ?", filter.supplier_id);
        let (mut orders, total) =
          list_page(conn, &PURCHASE_ORDERS, tenant_id, filters, &q, order_from_row)?;
        for order in &mut orders {
          load_lines(conn, order)?;
        }
        Ok((orders, total))
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> Result<Option<PurchaseOrder>> {
    self.read(move |conn| get(conn, tenant_id, id)).await
  }

  async fn create_purchase_order(
    &self,
    tenant_id: Uuid,
    input: PurchaseOrderInput,
    created_by: Uuid,
  ) -> Result<PurchaseOrder> {
    input.validate()?;
    let order = self
      .write(move |tx| {
        check_refs(tx, tenant_id, &input)?;
        let id = Uuid::new_v4();
        let number =
          document_number("PO", next_sequence(tx, &PURCHASE_ORDERS, tenant_id)?);
        tx.execute(
          "INSERT INTO purchase_orders (
             id, tenant_id, order_number, supplier_id, location_id, expected_date,
             status, notes, created_by, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            number,
            encode_uuid(input.supplier_id),
            encode_uuid(input.location_id),
            encode_opt_date(input.expected_date),
            PurchaseOrderStatus::Draft.to_string(),
            input.notes,
            encode_uuid(created_by),
            now(),
          ],
        )?;
        replace_lines(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(order = %order.order_number, "purchase order created");
    Ok(order)
  }

  async fn update_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: PurchaseOrderInput,
  ) -> Result<PurchaseOrder> {
    input.validate()?;
    self
      .write(move |tx| {
        let order = fetch(tx, tenant_id, id)?;
        if !order.status.is_editable() {
          return Err(refuse(&order, "edit"));
        }
        check_refs(tx, tenant_id, &input)?;
        tx.execute(
          "UPDATE purchase_orders
           SET supplier_id = ?1, location_id = ?2, expected_date = ?3, notes = ?4,
               updated_at = ?5
           WHERE id = ?6",
          rusqlite::params![
            encode_uuid(input.supplier_id),
            encode_uuid(input.location_id),
            encode_opt_date(input.expected_date),
            input.notes,
            now(),
            encode_uuid(id),
          ],
        )?;
        replace_lines(tx, id, &input)?;
        fetch(tx, tenant_id, id)
      })
      .await
  }

  async fn delete_purchase_order(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let order = fetch(tx, tenant_id, id)?;
        if !order.status.is_deletable() {
          return Err(refuse(&order, "delete"));
        }
        soft_delete(tx, &PURCHASE_ORDERS, tenant_id, id, &now())
      })
      .await
  }

  async fn transition_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: PurchaseOrderAction,
  ) -> Result<PurchaseOrder> {
    let order = self
      .write(move |tx| {
        let order = fetch(tx, tenant_id, id)?;
        if action == PurchaseOrderAction::Submit && order.lines.is_empty() {
          return Err(
            CoreError::validation(
              "a purchase order needs at least one line to be submitted",
            )
            .into(),
          );
        }
        let next = order.status.apply(action)?;
        set_status(tx, id, next)?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(
      order = %order.order_number,
      to = %order.status,
      "purchase order transition"
    );
    Ok(order)
  }

  async fn receive_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    receipt: PurchaseReceipt,
    actor: Uuid,
  ) -> Result<PurchaseOrder> {
    receipt.validate()?;
    let order = self
      .write(move |tx| {
        let mut order = fetch(tx, tenant_id, id)?;
        if !order.status.can_receive() {
          return Err(refuse(&order, "receive"));
        }
        let updated = receipt.apply_to(&order.lines)?;

        for line in &receipt.lines {
          let Some(po_line) = updated.iter().find(|l| l.id == line.line_id) else {
            continue;
          };
          tx.execute(
            "UPDATE purchase_order_lines SET quantity_received = ?1 WHERE id = ?2",
            rusqlite::params![po_line.quantity_received, encode_uuid(po_line.id)],
          )?;
          let mut level = level_for(tx, tenant_id, po_line.product_id, order.location_id)?;
          level.receive(line.quantity)?;
          save_level(tx, &level)?;
          record_transaction(tx, Movement {
            tenant_id,
            product_id: po_line.product_id,
            location_id: order.location_id,
            kind: StockTransactionKind::Receipt,
            quantity: line.quantity,
            reference: Some(order.order_number.as_str()),
            created_by: Some(actor),
          })?;
        }

        order.lines = updated;
        let next = if order.fully_received() {
          PurchaseOrderStatus::Received
        } else {
          PurchaseOrderStatus::PartiallyReceived
        };
        set_status(tx, id, next)?;
        fetch(tx, tenant_id, id)
      })
      .await?;
    tracing::info!(
      order = %order.order_number,
      status = %order.status,
      "goods received"
    );
    Ok(order)
  }
}
