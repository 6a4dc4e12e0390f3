//! Companies, contacts, sites, and employees.

use fieldops_core::{
  common::{ListQuery, Page},
  directory::{
    Company, CompanyInput, Contact, ContactInput, Employee, EmployeeInput, Site,
    SiteInput,
  },
  store::DirectoryStore,
};
use rusqlite::Row;
use uuid::Uuid;

use super::{
  SqliteStore,
  query::{
    Table, fetch, get_row, list_page, not_found, now, push_uuid, require_opt_ref,
    soft_delete,
  },
};
use crate::{
  Result,
  encode::{encode_opt_uuid, encode_uuid, parse_col, parse_opt_col},
};

pub(super) const COMPANIES: Table = Table {
  name:          "companies",
  entity:        "company",
  search:        &["name", "email", "phone"],
  sorts:         &[("name", "name"), ("kind", "kind"), ("created_at", "created_at")],
  default_order: "name",
  soft_delete:   true,
};

pub(super) const CONTACTS: Table = Table {
  name:          "contacts",
  entity:        "contact",
  search:        &["first_name", "last_name", "email", "job_title"],
  sorts:         &[
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("created_at", "created_at"),
  ],
  default_order: "last_name, first_name",
  soft_delete:   true,
};

pub(super) const SITES: Table = Table {
  name:          "sites",
  entity:        "site",
  search:        &["name", "code", "postcode"],
  sorts:         &[("name", "name"), ("code", "code"), ("created_at", "created_at")],
  default_order: "name",
  soft_delete:   true,
};

pub(super) const EMPLOYEES: Table = Table {
  name:          "employees",
  entity:        "employee",
  search:        &["first_name", "last_name", "employee_code", "email", "job_title"],
  sorts:         &[
    ("first_name", "first_name"),
    ("last_name", "last_name"),
    ("employee_code", "employee_code"),
    ("created_at", "created_at"),
  ],
  default_order: "last_name, first_name",
  soft_delete:   true,
};

// ─── Row mapping ─────────────────────────────────────────────────────────────

fn company_from_row(row: &Row<'_>) -> rusqlite::Result<Company> {
  Ok(Company {
    id:         parse_col(row, "id")?,
    tenant_id:  parse_col(row, "tenant_id")?,
    name:       row.get("name")?,
    kind:       parse_col(row, "kind")?,
    phone:      row.get("phone")?,
    email:      row.get("email")?,
    address:    row.get("address")?,
    created_at: parse_col(row, "created_at")?,
    updated_at: parse_col(row, "updated_at")?,
  })
}

fn contact_from_row(row: &Row<'_>) -> rusqlite::Result<Contact> {
  Ok(Contact {
    id:         parse_col(row, "id")?,
    tenant_id:  parse_col(row, "tenant_id")?,
    company_id: parse_opt_col(row, "company_id")?,
    first_name: row.get("first_name")?,
    last_name:  row.get("last_name")?,
    email:      row.get("email")?,
    phone:      row.get("phone")?,
    job_title:  row.get("job_title")?,
    created_at: parse_col(row, "created_at")?,
    updated_at: parse_col(row, "updated_at")?,
  })
}

fn site_from_row(row: &Row<'_>) -> rusqlite::Result<Site> {
  Ok(Site {
    id:         parse_col(row, "id")?,
    tenant_id:  parse_col(row, "tenant_id")?,
    name:       row.get("name")?,
    code:       row.get("code")?,
    address:    row.get("address")?,
    postcode:   row.get("postcode")?,
    is_active:  row.get("is_active")?,
    created_at: parse_col(row, "created_at")?,
    updated_at: parse_col(row, "updated_at")?,
  })
}

pub(super) fn employee_from_row(row: &Row<'_>) -> rusqlite::Result<Employee> {
  Ok(Employee {
    id:            parse_col(row, "id")?,
    tenant_id:     parse_col(row, "tenant_id")?,
    employee_code: row.get("employee_code")?,
    first_name:    row.get("first_name")?,
    last_name:     row.get("last_name")?,
    email:         row.get("email")?,
    phone:         row.get("phone")?,
    job_title:     row.get("job_title")?,
    site_id:       parse_opt_col(row, "site_id")?,
    is_active:     row.get("is_active")?,
    created_at:    parse_col(row, "created_at")?,
    updated_at:    parse_col(row, "updated_at")?,
  })
}

// ─── DirectoryStore impl ─────────────────────────────────────────────────────

impl DirectoryStore for SqliteStore {
  // ── Companies ─────────────────────────────────────────────────────────────

  async fn list_companies(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> Result<Page<Company>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        list_page(conn, &COMPANIES, tenant_id, Vec::new(), &q, company_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_company(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Company>> {
    self
      .read(move |conn| get_row(conn, &COMPANIES, tenant_id, id, company_from_row))
      .await
  }

  async fn create_company(
    &self,
    tenant_id: Uuid,
    input: CompanyInput,
  ) -> Result<Company> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO companies (
             id, tenant_id, name, kind, phone, email, address, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.name,
            input.kind.to_string(),
            input.phone,
            input.email,
            input.address,
            now(),
          ],
        )?;
        fetch(tx, &COMPANIES, tenant_id, id, company_from_row)
      })
      .await
  }

  async fn update_company(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: CompanyInput,
  ) -> Result<Company> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE companies
           SET name = ?1, kind = ?2, phone = ?3, email = ?4, address = ?5, updated_at = ?6
           WHERE tenant_id = ?7 AND id = ?8 AND is_deleted = 0",
          rusqlite::params![
            input.name,
            input.kind.to_string(),
            input.phone,
            input.email,
            input.address,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&COMPANIES, id).into());
        }
        fetch(tx, &COMPANIES, tenant_id, id, company_from_row)
      })
      .await
  }

  async fn delete_company(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &COMPANIES, tenant_id, id, &now()))
      .await
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn list_contacts(
    &self,
    tenant_id: Uuid,
    company_id: Option<Uuid>,
    query: ListQuery,
  ) -> Result<Page<Contact>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "company_id = ?", company_id);
        list_page(conn, &CONTACTS, tenant_id, filters, &q, contact_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Contact>> {
    self
      .read(move |conn| get_row(conn, &CONTACTS, tenant_id, id, contact_from_row))
      .await
  }

  async fn create_contact(
    &self,
    tenant_id: Uuid,
    input: ContactInput,
  ) -> Result<Contact> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        require_opt_ref(tx, &COMPANIES, tenant_id, input.company_id)?;
        tx.execute(
          "INSERT INTO contacts (
             id, tenant_id, company_id, first_name, last_name, email, phone,
             job_title, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            encode_opt_uuid(input.company_id),
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            now(),
          ],
        )?;
        fetch(tx, &CONTACTS, tenant_id, id, contact_from_row)
      })
      .await
  }

  async fn update_contact(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ContactInput,
  ) -> Result<Contact> {
    input.validate()?;
    self
      .write(move |tx| {
        require_opt_ref(tx, &COMPANIES, tenant_id, input.company_id)?;
        let changed = tx.execute(
          "UPDATE contacts
           SET company_id = ?1, first_name = ?2, last_name = ?3, email = ?4,
               phone = ?5, job_title = ?6, updated_at = ?7
           WHERE tenant_id = ?8 AND id = ?9 AND is_deleted = 0",
          rusqlite::params![
            encode_opt_uuid(input.company_id),
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&CONTACTS, id).into());
        }
        fetch(tx, &CONTACTS, tenant_id, id, contact_from_row)
      })
      .await
  }

  async fn delete_contact(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &CONTACTS, tenant_id, id, &now()))
      .await
  }

  // ── Sites ─────────────────────────────────────────────────────────────────

  async fn list_sites(&self, tenant_id: Uuid, query: ListQuery) -> Result<Page<Site>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| list_page(conn, &SITES, tenant_id, Vec::new(), &q, site_from_row))
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_site(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Site>> {
    self
      .read(move |conn| get_row(conn, &SITES, tenant_id, id, site_from_row))
      .await
  }

  async fn create_site(&self, tenant_id: Uuid, input: SiteInput) -> Result<Site> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO sites (
             id, tenant_id, name, code, address, postcode, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.name,
            input.code,
            input.address,
            input.postcode,
            input.is_active,
            now(),
          ],
        )?;
        fetch(tx, &SITES, tenant_id, id, site_from_row)
      })
      .await
  }

  async fn update_site(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: SiteInput,
  ) -> Result<Site> {
    input.validate()?;
    self
      .write(move |tx| {
        let changed = tx.execute(
          "UPDATE sites
           SET name = ?1, code = ?2, address = ?3, postcode = ?4, is_active = ?5,
               updated_at = ?6
           WHERE tenant_id = ?7 AND id = ?8 AND is_deleted = 0",
          rusqlite::params![
            input.name,
            input.code,
            input.address,
            input.postcode,
            input.is_active,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&SITES, id).into());
        }
        fetch(tx, &SITES, tenant_id, id, site_from_row)
      })
      .await
  }

  async fn delete_site(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &SITES, tenant_id, id, &now()))
      .await
  }

  // ── Employees ─────────────────────────────────────────────────────────────

  async fn list_employees(
    &self,
    tenant_id: Uuid,
    site_id: Option<Uuid>,
    query: ListQuery,
  ) -> Result<Page<Employee>> {
    let q = query.clone();
    let (items, total) = self
      .read(move |conn| {
        let mut filters = Vec::new();
        push_uuid(&mut filters, "site_id = ?", site_id);
        list_page(conn, &EMPLOYEES, tenant_id, filters, &q, employee_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn get_employee(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<Employee>> {
    self
      .read(move |conn| get_row(conn, &EMPLOYEES, tenant_id, id, employee_from_row))
      .await
  }

  async fn create_employee(
    &self,
    tenant_id: Uuid,
    input: EmployeeInput,
  ) -> Result<Employee> {
    input.validate()?;
    let id = Uuid::new_v4();
    self
      .write(move |tx| {
        require_opt_ref(tx, &SITES, tenant_id, input.site_id)?;
        tx.execute(
          "INSERT INTO employees (
             id, tenant_id, employee_code, first_name, last_name, email, phone,
             job_title, site_id, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.employee_code,
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            encode_opt_uuid(input.site_id),
            input.is_active,
            now(),
          ],
        )?;
        fetch(tx, &EMPLOYEES, tenant_id, id, employee_from_row)
      })
      .await
  }

  async fn update_employee(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: EmployeeInput,
  ) -> Result<Employee> {
    input.validate()?;
    self
      .write(move |tx| {
        require_opt_ref(tx, &SITES, tenant_id, input.site_id)?;
        let changed = tx.execute(
          "UPDATE employees
           SET employee_code = ?1, first_name = ?2, last_name = ?3, email = ?4,
               phone = ?5, job_title = ?6, site_id = ?7, is_active = ?8,
               updated_at = ?9
           WHERE tenant_id = ?10 AND id = ?11 AND is_deleted = 0",
          rusqlite::params![
            input.employee_code,
            input.first_name,
            input.last_name,
            input.email,
            input.phone,
            input.job_title,
            encode_opt_uuid(input.site_id),
            input.is_active,
            now(),
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&EMPLOYEES, id).into());
        }
        fetch(tx, &EMPLOYEES, tenant_id, id, employee_from_row)
      })
      .await
  }

  async fn delete_employee(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| soft_delete(tx, &EMPLOYEES, tenant_id, id, &now()))
      .await
  }
}
