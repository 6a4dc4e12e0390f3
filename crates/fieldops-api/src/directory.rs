//! Handlers for the directory: companies, contacts, sites, and employees.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/companies` | Paged; `?search=&sort_by=&sort_desc=` |
//! | `GET`  | `/contacts` | Optional `?company_id=` |
//! | `GET`  | `/sites` | |
//! | `GET`  | `/employees` | Optional `?site_id=` |
//!
//! Each resource also has `POST /{resource}` and `GET`/`PUT`/`DELETE`
//! `/{resource}/{id}`. Reads need `Core.View`; writes need `Core.Edit`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  directory::{
    Company, CompanyInput, Contact, ContactInput, Employee, EmployeeInput, Site,
    SiteInput,
  },
  store::Store,
  tenancy::Permission,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

// ─── Companies ───────────────────────────────────────────────────────────────

/// `GET /companies`
pub async fn list_companies<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Company>>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  Ok(Json(state.store.list_companies(user.tenant_id, query).await?))
}

/// `GET /companies/{id}`
pub async fn get_company<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Company>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  found(state.store.get_company(user.tenant_id, id).await?, "company", id)
}

/// `POST /companies`
pub async fn create_company<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<CompanyInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  let company = state.store.create_company(user.tenant_id, body).await?;
  Ok(created("companies", company.id, company))
}

/// `PUT /companies/{id}`
pub async fn update_company<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<CompanyInput>,
) -> Result<Json<Company>, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  Ok(Json(state.store.update_company(user.tenant_id, id, body).await?))
}

/// `DELETE /companies/{id}`
pub async fn delete_company<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  state.store.delete_company(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Contacts ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ContactParams {
  pub company_id: Option<Uuid>,
}

/// `GET /contacts[?company_id=<uuid>]`
pub async fn list_contacts<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<ContactParams>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Contact>>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  let page = state
    .store
    .list_contacts(user.tenant_id, params.company_id, query)
    .await?;
  Ok(Json(page))
}

/// `GET /contacts/{id}`
pub async fn get_contact<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Contact>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  found(state.store.get_contact(user.tenant_id, id).await?, "contact", id)
}

/// `POST /contacts`
pub async fn create_contact<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<ContactInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  let contact = state.store.create_contact(user.tenant_id, body).await?;
  Ok(created("contacts", contact.id, contact))
}

/// `PUT /contacts/{id}`
pub async fn update_contact<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ContactInput>,
) -> Result<Json<Contact>, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  Ok(Json(state.store.update_contact(user.tenant_id, id, body).await?))
}

/// `DELETE /contacts/{id}`
pub async fn delete_contact<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  state.store.delete_contact(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Sites ───────────────────────────────────────────────────────────────────

/// `GET /sites`
pub async fn list_sites<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Site>>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  Ok(Json(state.store.list_sites(user.tenant_id, query).await?))
}

/// `GET /sites/{id}`
pub async fn get_site<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Site>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  found(state.store.get_site(user.tenant_id, id).await?, "site", id)
}

/// `POST /sites`
pub async fn create_site<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<SiteInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  let site = state.store.create_site(user.tenant_id, body).await?;
  Ok(created("sites", site.id, site))
}

/// `PUT /sites/{id}`
pub async fn update_site<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<SiteInput>,
) -> Result<Json<Site>, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  Ok(Json(state.store.update_site(user.tenant_id, id, body).await?))
}

/// `DELETE /sites/{id}`
pub async fn delete_site<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  state.store.delete_site(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Employees ───────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct EmployeeParams {
  pub site_id: Option<Uuid>,
}

/// `GET /employees[?site_id=<uuid>]`
pub async fn list_employees<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<EmployeeParams>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Employee>>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  let page = state
    .store
    .list_employees(user.tenant_id, params.site_id, query)
    .await?;
  Ok(Json(page))
}

/// `GET /employees/{id}`
pub async fn get_employee<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Employee>, ApiError> {
  let user = auth.require(Permission::CoreView)?;
  found(state.store.get_employee(user.tenant_id, id).await?, "employee", id)
}

/// `POST /employees`
pub async fn create_employee<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<EmployeeInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  let employee = state.store.create_employee(user.tenant_id, body).await?;
  Ok(created("employees", employee.id, employee))
}

/// `PUT /employees/{id}`
pub async fn update_employee<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<EmployeeInput>,
) -> Result<Json<Employee>, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  Ok(Json(state.store.update_employee(user.tenant_id, id, body).await?))
}

/// `DELETE /employees/{id}`
pub async fn delete_employee<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::CoreEdit)?;
  state.store.delete_employee(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}
