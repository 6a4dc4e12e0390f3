use fieldops_core::{
  common::ListQuery,
  directory::{ContactInput, EmployeeInput},
  store::DirectoryStore,
};
use uuid::Uuid;

use super::*;

fn contact_input(company_id: Option<Uuid>, first: &str) -> ContactInput {
  ContactInput {
    company_id,
    first_name: first.into(),
    last_name: "Jones".into(),
    email: Some(format!("{}@example.com", first.to_lowercase())),
    phone: None,
    job_title: None,
  }
}

#[tokio::test]
async fn create_and_get_company() {
  let (s, tenant) = tenant_store().await;
  let created = s
    .create_company(tenant, company_input("Northwind"))
    .await
    .unwrap();
  let fetched = s.get_company(tenant, created.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Northwind");
  assert_eq!(fetched.tenant_id, tenant);
}

#[tokio::test]
async fn blank_company_name_is_rejected() {
  let (s, tenant) = tenant_store().await;
  let err = s
    .create_company(tenant, company_input("   "))
    .await
    .unwrap_err();
  assert!(is_validation(&err));
}

#[tokio::test]
async fn update_company_replaces_fields() {
  let (s, tenant) = tenant_store().await;
  let id = company(&s, tenant).await;
  let mut input = company_input("Northwind Traders");
  input.email = Some("accounts@northwind.example".into());
  let updated = s.update_company(tenant, id, input).await.unwrap();
  assert_eq!(updated.name, "Northwind Traders");
  assert_eq!(updated.email.as_deref(), Some("accounts@northwind.example"));
}

#[tokio::test]
async fn deleted_company_is_hidden_and_second_delete_fails() {
  let (s, tenant) = tenant_store().await;
  let id = company(&s, tenant).await;

  s.delete_company(tenant, id).await.unwrap();
  assert!(s.get_company(tenant, id).await.unwrap().is_none());

  let page = s.list_companies(tenant, ListQuery::default()).await.unwrap();
  assert_eq!(page.total_count, 0);

  let err = s.delete_company(tenant, id).await.unwrap_err();
  assert!(is_not_found(&err));
}

#[tokio::test]
async fn records_are_invisible_to_other_tenants() {
  let (s, tenant) = tenant_store().await;
  let other = second_tenant(&s).await;
  let id = company(&s, tenant).await;

  assert!(s.get_company(other, id).await.unwrap().is_none());
  let err = s
    .update_company(other, id, company_input("Hijacked"))
    .await
    .unwrap_err();
  assert!(is_not_found(&err));
  let err = s.delete_company(other, id).await.unwrap_err();
  assert!(is_not_found(&err));

  let page = s.list_companies(other, ListQuery::default()).await.unwrap();
  assert!(page.items.is_empty());
}

#[tokio::test]
async fn list_pages_searches_and_sorts() {
  let (s, tenant) = tenant_store().await;
  for name in ["Delta", "Alpha", "Charlie", "Bravo", "Echo"] {
    s.create_company(tenant, company_input(name)).await.unwrap();
  }

  let q = ListQuery { page: Some(2), page_size: Some(2), ..Default::default() };
  let page = s.list_companies(tenant, q).await.unwrap();
  assert_eq!(page.total_count, 5);
  assert_eq!(page.total_pages, 3);
  let names: Vec<_> = page.items.iter().map(|c| c.name.as_str()).collect();
  assert_eq!(names, ["Charlie", "Delta"]);

  let q = ListQuery { search: Some("rav".into()), ..Default::default() };
  let page = s.list_companies(tenant, q).await.unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].name, "Bravo");

  let q = ListQuery {
    sort_by: Some("name".into()),
    sort_desc: true,
    ..Default::default()
  };
  let page = s.list_companies(tenant, q).await.unwrap();
  assert_eq!(page.items[0].name, "Echo");
}

#[tokio::test]
async fn search_treats_wildcards_literally() {
  let (s, tenant) = tenant_store().await;
  for name in ["Acme", "Bolt_Co", "100% Fixings"] {
    s.create_company(tenant, company_input(name)).await.unwrap();
  }

  let search = |term: &str| ListQuery { search: Some(term.into()), ..Default::default() };
  let page = s.list_companies(tenant, search("%")).await.unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].name, "100% Fixings");

  let page = s.list_companies(tenant, search("_")).await.unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].name, "Bolt_Co");

  let page = s.list_companies(tenant, search("\\")).await.unwrap();
  assert_eq!(page.total_count, 0);
}

#[tokio::test]
async fn contacts_filter_by_company() {
  let (s, tenant) = tenant_store().await;
  let northwind = company(&s, tenant).await;
  s.create_contact(tenant, contact_input(Some(northwind), "Ann"))
    .await
    .unwrap();
  s.create_contact(tenant, contact_input(None, "Bob"))
    .await
    .unwrap();

  let page = s
    .list_contacts(tenant, Some(northwind), ListQuery::default())
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].first_name, "Ann");

  let all = s
    .list_contacts(tenant, None, ListQuery::default())
    .await
    .unwrap();
  assert_eq!(all.total_count, 2);
}

#[tokio::test]
async fn contact_rejects_company_from_other_tenant() {
  let (s, tenant) = tenant_store().await;
  let other = second_tenant(&s).await;
  let foreign = company(&s, other).await;
  let err = s
    .create_contact(tenant, contact_input(Some(foreign), "Ann"))
    .await
    .unwrap_err();
  assert!(is_not_found(&err));
}

#[tokio::test]
async fn employees_filter_by_site() {
  let (s, tenant) = tenant_store().await;
  let riverside = site(&s, tenant).await;
  s.create_employee(tenant, EmployeeInput {
    site_id: Some(riverside),
    ..employee_input("Carol", "Price")
  })
  .await
  .unwrap();
  employee(&s, tenant, "Dave").await;

  let page = s
    .list_employees(tenant, Some(riverside), ListQuery::default())
    .await
    .unwrap();
  assert_eq!(page.total_count, 1);
  assert_eq!(page.items[0].full_name(), "Carol Price");
}

#[tokio::test]
async fn employee_on_deleted_site_is_rejected() {
  let (s, tenant) = tenant_store().await;
  let riverside = site(&s, tenant).await;
  s.delete_site(tenant, riverside).await.unwrap();
  let err = s
    .create_employee(tenant, EmployeeInput {
      site_id: Some(riverside),
      ..employee_input("Eve", "Stone")
    })
    .await
    .unwrap_err();
  assert!(is_not_found(&err));
}
