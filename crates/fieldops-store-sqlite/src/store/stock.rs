//! Catalogue, stock levels, and the stock ledger. Stock-order persistence
//! lives in [`super::stock_orders`]; this module wires it into [`StockStore`].

use fieldops_core::{
  common::{ListQuery, Page},
  stock::{
    Category, CategoryInput, Product, ProductInput, StockAdjustment, StockLevel,
    StockLevelFilter, StockLevelView, StockLocation, StockLocationInput,
    StockOrder, StockOrderAction, StockOrderFilter, StockOrderInput,
    StockTransaction, StockTransactionKind, Supplier, SupplierInput,
    TransactionFilter,
  },
  store::StockStore,
};
use rusqlite::{Connection, OptionalExtension as _, Row, types::Value};
use uuid::Uuid;

use super::{
  SqliteStore, TxError, stock_orders,
  query::{
    Table, fetch, get_row, list_page, not_found, now, push_uuid, require_opt_ref,
    require_ref, soft_delete,
  },
};
use crate::{
  Result,
  encode::{encode_opt_uuid, encode_uuid, parse_col, parse_opt_col},
};

pub(super) const CATEGORIES: Table = Table {
  name:          "categories",
  entity:        "category",
  search:        &["name", "description"],
  sorts:         &[("name", "name"), ("created_at", "created_at")],
  default_order: "name",
  soft_delete:   true,
};

pub(super) const SUPPLIERS: Table = Table {
  name:          "suppliers",
  entity:        "supplier",
  search:        &["name", "contact_name", "email", "account_ref"],
  sorts:         &[("name", "name"), ("created_at", "created_at")],
  default_order: "name",
  soft_delete:   true,
};

pub(super) const PRODUCTS: Table = Table {
  name:          "products",
  entity:        "product",
  search:        &["sku", "name", "description"],
  sorts:         &[
    ("sku", "sku"),
    ("name", "name"),
    ("unit_cost", "unit_cost"),
    ("created_at", "created_at"),
  ],
  default_order: "sku",
  soft_delete:   true,
};

pub(super) const LOCATIONS: Table = Table {
  name:          "stock_locations",
  entity:        "stock location",
  search:        &["name", "code"],
  sorts:         &[("name", "name"), ("code", "code"), ("created_at", "created_at")],
  default_order: "name",
  soft_delete:   true,
};

const LEVELS: Table = Table {
  name:          "stock_level_view",
  entity:        "stock level",
  search:        &["sku", "product_name", "location_name"],
  sorts:         &[
    ("sku", "sku"),
    ("product_name", "product_name"),
    ("location_name", "location_name"),
    ("available", "available"),
    ("updated_at", "updated_at"),
  ],
  default_order: "sku, location_name",
  soft_delete:   false,
};

const TRANSACTIONS: Table = Table {
  name:          "stock_transactions",
  entity:        "stock transaction",
  search:        &["reference"],
  sorts:         &[("created_at", "created_at"), ("kind", "kind")],
  default_order: "created_at DESC",
  soft_delete:   false,
};

// ─── Row mapping ─────────────────────────────────────────────────────────────

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
  Ok(Category {
    id:          parse_col(row, "id")?,
    tenant_id:   parse_col(row, "tenant_id")?,
    name:        row.get("name")?,
    description: row.get("description")?,
    created_at:  parse_col(row, "created_at")?,
    updated_at:  parse_col(row, "updated_at")?,
  })
}

fn supplier_from_row(row: &Row<'_>) -> rusqlite::Result<Supplier> {
  Ok(Supplier {
    id:           parse_col(row, "id")?,
    tenant_id:    parse_col(row, "tenant_id")?,
    name:         row.get("name")?,
    contact_name: row.get("contact_name")?,
    email:        row.get("email")?,
    phone:        row.get("phone")?,
    account_ref:  row.get("account_ref")?,
    created_at:   parse_col(row, "created_at")?,
    updated_at:   parse_col(row, "updated_at")?,
  })
}

fn product_from_row(row: &Row<'_>) -> rusqlite::Result<Product> {
  Ok(Product {
    id:            parse_col(row, "id")?,
    tenant_id:     parse_col(row, "tenant_id")?,
    sku:           row.get("sku")?,
    name:          row.get("name")?,
    description:   row.get("description")?,
    category_id:   parse_opt_col(row, "category_id")?,
    supplier_id:   parse_opt_col(row, "supplier_id")?,
    unit:          row.get("unit")?,
    unit_cost:     row.get("unit_cost")?,
    reorder_level: row.get("reorder_level")?,
    created_at:    parse_col(row, "created_at")?,
    updated_at:    parse_col(row, "updated_at")?,
  })
}

fn location_from_row(row: &Row<'_>) -> rusqlite::Result<StockLocation> {
  Ok(StockLocation {
    id:         parse_col(row, "id")?,
    tenant_id:  parse_col(row, "tenant_id")?,
    name:       row.get("name")?,
    code:       row.get("code")?,
    is_active:  row.get("is_active")?,
    created_at: parse_col(row, "created_at")?,
    updated_at: parse_col(row, "updated_at")?,
  })
}

fn level_from_row(row: &Row<'_>) -> rusqlite::Result<StockLevel> {
  Ok(StockLevel {
    id:                parse_col(row, "id")?,
    tenant_id:         parse_col(row, "tenant_id")?,
    product_id:        parse_col(row, "product_id")?,
    location_id:       parse_col(row, "location_id")?,
    quantity_on_hand:  row.get("quantity_on_hand")?,
    quantity_reserved: row.get("quantity_reserved")?,
    updated_at:        parse_col(row, "updated_at")?,
  })
}

fn level_view_from_row(row: &Row<'_>) -> rusqlite::Result<StockLevelView> {
  Ok(StockLevelView::new(
    level_from_row(row)?,
    row.get("sku")?,
    row.get("product_name")?,
    row.get("location_name")?,
    row.get("reorder_level")?,
  ))
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<StockTransaction> {
  Ok(StockTransaction {
    id:          parse_col(row, "id")?,
    tenant_id:   parse_col(row, "tenant_id")?,
    product_id:  parse_col(row, "product_id")?,
    location_id: parse_col(row, "location_id")?,
    kind:        parse_col(row, "kind")?,
    quantity:    row.get("quantity")?,
    reference:   row.get("reference")?,
    created_by:  parse_opt_col(row, "created_by")?,
    created_at:  parse_col(row, "created_at")?,
  })
}

// ─── Level & ledger helpers ──────────────────────────────────────────────────

/// The level row for a product at a location, or a zeroed one that
/// [`save_level`] will insert.
pub(super) fn level_for(
  conn: &Connection,
  tenant_id: Uuid,
  product_id: Uuid,
  location_id: Uuid,
) -> rusqlite::Result<StockLevel> {
  let existing = conn
    .query_row(
      "SELECT * FROM stock_levels
       WHERE tenant_id = ?1 AND product_id = ?2 AND location_id = ?3",
      rusqlite::params![
        encode_uuid(tenant_id),
        encode_uuid(product_id),
        encode_uuid(location_id)
      ],
      level_from_row,
    )
    .optional()?;
  Ok(existing.unwrap_or_else(|| StockLevel {
    id: Uuid::new_v4(),
    tenant_id,
    product_id,
    location_id,
    quantity_on_hand: 0,
    quantity_reserved: 0,
    updated_at: chrono::Utc::now(),
  }))
}

pub(super) fn save_level(conn: &Connection, level: &StockLevel) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO stock_levels (
       id, tenant_id, product_id, location_id, quantity_on_hand,
       quantity_reserved, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
     ON CONFLICT (product_id, location_id) DO UPDATE SET
       quantity_on_hand  = excluded.quantity_on_hand,
       quantity_reserved = excluded.quantity_reserved,
       updated_at        = excluded.updated_at",
    rusqlite::params![
      encode_uuid(level.id),
      encode_uuid(level.tenant_id),
      encode_uuid(level.product_id),
      encode_uuid(level.location_id),
      level.quantity_on_hand,
      level.quantity_reserved,
      now(),
    ],
  )?;
  Ok(())
}

/// One ledger entry to append with [`record_transaction`].
pub(super) struct Movement<'a> {
  pub tenant_id:   Uuid,
  pub product_id:  Uuid,
  pub location_id: Uuid,
  pub kind:        StockTransactionKind,
  pub quantity:    i64,
  pub reference:   Option<&'a str>,
  pub created_by:  Option<Uuid>,
}

pub(super) fn record_transaction(
  conn: &Connection,
  movement: Movement<'_>,
) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO stock_transactions (
       id, tenant_id, product_id, location_id, kind, quantity, reference,
       created_by, created_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
    rusqlite::params![
      encode_uuid(Uuid::new_v4()),
      encode_uuid(movement.tenant_id),
      encode_uuid(movement.product_id),
      encode_uuid(movement.location_id),
      movement.kind.to_string(),
      movement.quantity,
      movement.reference,
      encode_opt_uuid(movement.created_by),
      now(),
    ],
  )?;
  Ok(())
}

fn check_product_refs(
  conn: &Connection,
  tenant_id: Uuid,
  input: &ProductInput,
) -> Result<(), TxError> {
  require_opt_ref(conn, &CATEGORIES, tenant_id, input.category_id)?;
  require_opt_ref(conn, &SUPPLIERS, tenant_id, input.supplier_id)
}

// ─── StockStore impl ─────────────────────────────────────────────────────────

impl StockStore for SqliteStore {
  // ── Categories ────────────────────────────────────────────────────────────

  async fn list_categories(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> Result<Page<Category>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        list_page(conn, &CATEGORIES, tenant_id, Vec::new(), &q, category_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_category(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Category>> {
    self
      .read(move |conn| get_row(conn, &CATEGORIES, tenant_id, id, category_from_row))
      .await
  }

  async fn create_category(
    &self,
    tenant_id: Uuid,
    input: CategoryInput,
  ) -> Result<Category> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO categories (id, tenant_id, name, description, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.name,
            input.description,
            now(),
          ],
        )?;
        fetch(tx, &CATEGORIES, tenant_id, id, category_from_row)
      })
      .await
  }

  async fn update_category(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: CategoryInput,
  ) -> Result<Category> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE categories SET name = ?1, description = ?2, updated_at = ?3
           WHERE tenant_id = ?4 AND id = ?5 AND is_deleted = 0",
          rusqlite::params![
            input.name,
            input.description,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&CATEGORIES, id).into());
        }
        fetch(tx, &CATEGORIES, tenant_id, id, category_from_row)
      })
      .await
  }

  async fn delete_category(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &CATEGORIES, tenant_id, id, &now()))
      .await
  }

  // ── Suppliers ─────────────────────────────────────────────────────────────

  async fn list_suppliers(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> Result<Page<Supplier>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        list_page(conn, &SUPPLIERS, tenant_id, Vec::new(), &q, supplier_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_supplier(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Supplier>> {
    self
      .read(move |conn| get_row(conn, &SUPPLIERS, tenant_id, id, supplier_from_row))
      .await
  }

  async fn create_supplier(
    &self,
    tenant_id: Uuid,
    input: SupplierInput,
  ) -> Result<Supplier> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO suppliers (
             id, tenant_id, name, contact_name, email, phone, account_ref,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.name,
            input.contact_name,
            input.email,
            input.phone,
            input.account_ref,
            now(),
          ],
        )?;
        fetch(tx, &SUPPLIERS, tenant_id, id, supplier_from_row)
      })
      .await
  }

  async fn update_supplier(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: SupplierInput,
  ) -> Result<Supplier> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE suppliers
           SET name = ?1, contact_name = ?2, email = ?3, phone = ?4,
               account_ref = ?5, updated_at = ?6
           WHERE tenant_id = ?7 AND id = ?8 AND is_deleted = 0",
          rusqlite::params![
            input.name,
            input.contact_name,
            input.email,
            input.phone,
            input.account_ref,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&SUPPLIERS, id).into());
        }
        fetch(tx, &SUPPLIERS, tenant_id, id, supplier_from_row)
      })
      .await
  }

  async fn delete_supplier(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &SUPPLIERS, tenant_id, id, &now()))
      .await
  }

  // ── Products ──────────────────────────────────────────────────────────────

  async fn list_products(
    &self,
    tenant_id: Uuid,
    category_id: Option<Uuid>,
    query: ListQuery,
  ) -> Result<Page<Product>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "category_id = ?", category_id);
        list_page(conn, &PRODUCTS, tenant_id, filters, &q, product_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_product(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Product>> {
    self
      .read(move |conn| get_row(conn, &PRODUCTS, tenant_id, id, product_from_row))
      .await
  }

  async fn create_product(
    &self,
    tenant_id: Uuid,
    input: ProductInput,
  ) -> Result<Product> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        check_product_refs(tx, tenant_id, &input)?;
        tx.execute(
          "INSERT INTO products (
             id, tenant_id, sku, name, description, category_id, supplier_id,
             unit, unit_cost, reorder_level, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.sku,
            input.name,
            input.description,
            encode_opt_uuid(input.category_id),
            encode_opt_uuid(input.supplier_id),
            input.unit,
            input.unit_cost,
            input.reorder_level,
            now(),
          ],
        )?;
        fetch(tx, &PRODUCTS, tenant_id, id, product_from_row)
      })
      .await
  }

  async fn update_product(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ProductInput,
  ) -> Result<Product> {
    input.validate()?;
    self
      .write(move |tx| {
        check_product_refs(tx, tenant_id, &input)?;
        let changed = tx.execute(
          "UPDATE products
           SET sku = ?1, name = ?2, description = ?3, category_id = ?4,
               supplier_id = ?5, unit = ?6, unit_cost = ?7, reorder_level = ?8,
               updated_at = ?9
           WHERE tenant_id = ?10 AND id = ?11 AND is_deleted = 0",
          rusqlite::params![
            input.sku,
            input.name,
            input.description,
            encode_opt_uuid(input.category_id),
            encode_opt_uuid(input.supplier_id),
            input.unit,
            input.unit_cost,
            input.reorder_level,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&PRODUCTS, id).into());
        }
        fetch(tx, &PRODUCTS, tenant_id, id, product_from_row)
      })
      .await
  }

  async fn delete_product(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &PRODUCTS, tenant_id, id, &now()))
      .await
  }

  // ── Stock locations ───────────────────────────────────────────────────────

  async fn list_stock_locations(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> Result<Page<StockLocation>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        list_page(conn, &LOCATIONS, tenant_id, Vec::new(), &q, location_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_stock_location(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> Result<Option<StockLocation>> {
    self
      .read(move |conn| get_row(conn, &LOCATIONS, tenant_id, id, location_from_row))
      .await
  }

  async fn create_stock_location(
    &self,
    tenant_id: Uuid,
    input: StockLocationInput,
  ) -> Result<StockLocation> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO stock_locations (
             id, tenant_id, name, code, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.name,
            input.code,
            input.is_active,
            now(),
          ],
        )?;
        fetch(tx, &LOCATIONS, tenant_id, id, location_from_row)
      })
      .await
  }

  async fn update_stock_location(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: StockLocationInput,
  ) -> Result<StockLocation> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE stock_locations SET name = ?1, code = ?2, is_active = ?3, updated_at = ?4
           WHERE tenant_id = ?5 AND id = ?6 AND is_deleted = 0",
          rusqlite::params![
            input.name,
            input.code,
            input.is_active,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&LOCATIONS, id).into());
        }
        fetch(tx, &LOCATIONS, tenant_id, id, location_from_row)
      })
      .await
  }

  async fn delete_stock_location(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &LOCATIONS, tenant_id, id, &now()))
      .await
  }

  // ── Levels & transactions ─────────────────────────────────────────────────

  async fn list_stock_levels(
    &self,
    tenant_id: Uuid,
    filter: StockLevelFilter,
    query: ListQuery,
  ) -> Result<Page<StockLevelView>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "product_id = ?", filter.product_id);
        push_uuid(&mut filters, "location_id = ?", filter.location_id);
        if filter.low_stock {
          filters.push(("(available <= reorder_level) = ?", Value::Integer(1)));
        }
        list_page(conn, &LEVELS, tenant_id, filters, &q, level_view_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn adjust_stock(
    &self,
    tenant_id: Uuid,
    adjustment: StockAdjustment,
    actor: Uuid,
  ) -> Result<StockLevel> {
    adjustment.validate()?;
    let level = self
      .write(move |tx| {
        require_ref(tx, &PRODUCTS, tenant_id, adjustment.product_id)?;
        require_ref(tx, &LOCATIONS, tenant_id, adjustment.location_id)?;

        let mut level = level_for(
          tx,
          tenant_id,
          adjustment.product_id,
          adjustment.location_id,
        )?;
        level.adjust(adjustment.quantity_delta)?;
        save_level(tx, &level)?;
        record_transaction(tx, Movement {
          tenant_id,
          product_id: adjustment.product_id,
          location_id: adjustment.location_id,
          kind: StockTransactionKind::Adjustment,
          quantity: adjustment.quantity_delta,
          reference: Some(adjustment.reason.as_str()),
          created_by: Some(actor),
        })?;

        Ok(level_for(tx, tenant_id, adjustment.product_id, adjustment.location_id)?)
      })
      .await?;

    tracing::info!(
      product = %level.product_id,
      location = %level.location_id,
      on_hand = level.quantity_on_hand,
      "stock adjusted"
    );
    Ok(level)
  }

  async fn list_stock_transactions(
    &self,
    tenant_id: Uuid,
    filter: TransactionFilter,
    query: ListQuery,
  ) -> Result<Page<StockTransaction>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "product_id = ?", filter.product_id);
        push_uuid(&mut filters, "location_id = ?", filter.location_id);
        list_page(conn, &TRANSACTIONS, tenant_id, filters, &q, transaction_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  // ── Stock orders ──────────────────────────────────────────────────────────

  async fn list_stock_orders(
    &self,
    tenant_id: Uuid,
    filter: StockOrderFilter,
    query: ListQuery,
  ) -> Result<Page<StockOrder>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| stock_orders::list(conn, tenant_id, filter, &q))
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> Result<Option<StockOrder>> {
    self
      .read(move |conn| stock_orders::get(conn, tenant_id, id))
      .await
  }

  async fn create_stock_order(
    &self,
    tenant_id: Uuid,
    input: StockOrderInput,
    requested_by: Uuid,
  ) -> Result<StockOrder> {
    input.validate()?;
    let order = self
      .write(move |tx| stock_orders::create(tx, tenant_id, input, requested_by))
      .await?;
    tracing::info!(order = %order.order_number, "stock order created");
    Ok(order)
  }

  async fn update_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: StockOrderInput,
  ) -> Result<StockOrder> {
    input.validate()?;
    self
      .write(move |tx| stock_orders::update(tx, tenant_id, id, input))
      .await
  }

  async fn delete_stock_order(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| stock_orders::delete(tx, tenant_id, id))
      .await
  }

  async fn transition_stock_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: StockOrderAction,
    actor: Uuid,
  ) -> Result<StockOrder> {
    let name = action.name();
    let (from, order) = self
      .write(move |tx| stock_orders::transition(tx, tenant_id, id, action, actor))
      .await?;
    tracing::info!(
      order = %order.order_number,
      %from,
      to = %order.status,
      action = name,
      "stock order transition"
    );
    Ok(order)
  }
}
