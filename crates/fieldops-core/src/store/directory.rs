use std::future::Future;

use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  directory::{
    Company, CompanyInput, Contact, ContactInput, Employee, EmployeeInput, Site,
    SiteInput,
  },
};

/// Companies, contacts, sites, and employees.
///
/// Plain records: list with paging and search, get, create, update, and soft
/// delete. Updates and deletes of missing (or already deleted) records fail
/// with a not-found error.
pub trait DirectoryStore: StoreBase {
  // ── Companies ─────────────────────────────────────────────────────────
  fn list_companies(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Company>, Self::Error>> + Send + '_;

  fn get_company(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Company>, Self::Error>> + Send + '_;

  fn create_company(
    &self,
    tenant_id: Uuid,
    input: CompanyInput,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn update_company(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: CompanyInput,
  ) -> impl Future<Output = Result<Company, Self::Error>> + Send + '_;

  fn delete_company(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────
  fn list_contacts(
    &self,
    tenant_id: Uuid,
    company_id: Option<Uuid>,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Contact>, Self::Error>> + Send + '_;

  fn get_contact(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Contact>, Self::Error>> + Send + '_;

  fn create_contact(
    &self,
    tenant_id: Uuid,
    input: ContactInput,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn update_contact(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ContactInput,
  ) -> impl Future<Output = Result<Contact, Self::Error>> + Send + '_;

  fn delete_contact(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Sites ─────────────────────────────────────────────────────────────
  fn list_sites(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Site>, Self::Error>> + Send + '_;

  fn get_site(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Site>, Self::Error>> + Send + '_;

  fn create_site(
    &self,
    tenant_id: Uuid,
    input: SiteInput,
  ) -> impl Future<Output = Result<Site, Self::Error>> + Send + '_;

  fn update_site(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: SiteInput,
  ) -> impl Future<Output = Result<Site, Self::Error>> + Send + '_;

  fn delete_site(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Employees ─────────────────────────────────────────────────────────
  fn list_employees(
    &self,
    tenant_id: Uuid,
    site_id: Option<Uuid>,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Employee>, Self::Error>> + Send + '_;

  fn get_employee(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Employee>, Self::Error>> + Send + '_;

  fn create_employee(
    &self,
    tenant_id: Uuid,
    input: EmployeeInput,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn update_employee(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: EmployeeInput,
  ) -> impl Future<Output = Result<Employee, Self::Error>> + Send + '_;

  fn delete_employee(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
