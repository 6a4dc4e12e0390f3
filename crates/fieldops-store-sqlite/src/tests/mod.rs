//! Integration tests for `SqliteStore` against an in-memory database.

mod directory;
mod identity;
mod proposal;
mod purchasing;
mod stock;
mod toolbox;

use fieldops_core::{
  directory::{CompanyInput, EmployeeInput, SiteInput},
  stock::{ProductInput, StockAdjustment, StockLocationInput, SupplierInput},
  store::{DirectoryStore, IdentityStore, StockStore},
};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

/// A fresh store with one tenant.
async fn tenant_store() -> (SqliteStore, Uuid) {
  let s = store().await;
  let tenant = s
    .create_tenant("Acme Building".into(), "acme".into())
    .await
    .unwrap();
  (s, tenant.id)
}

async fn second_tenant(s: &SqliteStore) -> Uuid {
  s.create_tenant("Other Ltd".into(), "other".into())
    .await
    .unwrap()
    .id
}

fn is_not_found(err: &Error) -> bool {
  matches!(err, Error::Core(fieldops_core::Error::NotFound { .. }))
}

fn is_invalid_transition(err: &Error) -> bool {
  matches!(err, Error::Core(fieldops_core::Error::InvalidTransition { .. }))
}

fn is_validation(err: &Error) -> bool {
  matches!(err, Error::Core(fieldops_core::Error::Validation(_)))
}

// ─── Fixtures ────────────────────────────────────────────────────────────────

fn company_input(name: &str) -> CompanyInput {
  CompanyInput {
    name:    name.into(),
    kind:    Default::default(),
    phone:   None,
    email:   None,
    address: None,
  }
}

fn site_input(name: &str) -> SiteInput {
  SiteInput {
    name:      name.into(),
    code:      None,
    address:   None,
    postcode:  None,
    is_active: true,
  }
}

fn employee_input(first: &str, last: &str) -> EmployeeInput {
  EmployeeInput {
    employee_code: None,
    first_name:    first.into(),
    last_name:     last.into(),
    email:         None,
    phone:         None,
    job_title:     None,
    site_id:       None,
    is_active:     true,
  }
}

fn product_input(sku: &str) -> ProductInput {
  ProductInput {
    sku:           sku.into(),
    name:          format!("Product {sku}"),
    description:   None,
    category_id:   None,
    supplier_id:   None,
    unit:          "each".into(),
    unit_cost:     250,
    reorder_level: 5,
  }
}

async fn site(s: &SqliteStore, tenant: Uuid) -> Uuid {
  s.create_site(tenant, site_input("Riverside")).await.unwrap().id
}

async fn company(s: &SqliteStore, tenant: Uuid) -> Uuid {
  s.create_company(tenant, company_input("Northwind"))
    .await
    .unwrap()
    .id
}

async fn employee(s: &SqliteStore, tenant: Uuid, first: &str) -> Uuid {
  s.create_employee(tenant, employee_input(first, "Smith"))
    .await
    .unwrap()
    .id
}

async fn supplier(s: &SqliteStore, tenant: Uuid) -> Uuid {
  s.create_supplier(tenant, SupplierInput {
    name:         "Fixings Direct".into(),
    contact_name: None,
    email:        None,
    phone:        None,
    account_ref:  None,
  })
  .await
  .unwrap()
  .id
}

async fn location(s: &SqliteStore, tenant: Uuid) -> Uuid {
  s.create_stock_location(tenant, StockLocationInput {
    name:      "Main warehouse".into(),
    code:      Some("WH1".into()),
    is_active: true,
  })
  .await
  .unwrap()
  .id
}

async fn product(s: &SqliteStore, tenant: Uuid, sku: &str) -> Uuid {
  s.create_product(tenant, product_input(sku)).await.unwrap().id
}

/// Put `quantity` units of `product` on hand at `location`.
async fn stock_up(
  s: &SqliteStore,
  tenant: Uuid,
  product: Uuid,
  location: Uuid,
  quantity: i64,
) {
  s.adjust_stock(
    tenant,
    StockAdjustment {
      product_id:     product,
      location_id:    location,
      quantity_delta: quantity,
      reason:         "opening stock".into(),
    },
    Uuid::new_v4(),
  )
  .await
  .unwrap();
}
