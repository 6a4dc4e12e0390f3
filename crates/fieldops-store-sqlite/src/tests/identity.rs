use chrono::{Duration, Utc};
use fieldops_core::{
  store::IdentityStore,
  tenancy::{NewUser, Role, UserUpdate},
};
use uuid::Uuid;

use super::*;

fn new_user(username: &str) -> NewUser {
  NewUser {
    username:      username.into(),
    display_name:  "Site Manager".into(),
    email:         None,
    role:          Role::Manager,
    employee_id:   None,
    password_hash: "$argon2id$stub".into(),
  }
}

async fn user(s: &SqliteStore, tenant: Uuid, username: &str) -> Uuid {
  s.create_user(tenant, new_user(username)).await.unwrap().id
}

async fn issue_token(s: &SqliteStore, user_id: Uuid, hash: &str) {
  s.store_token(user_id, hash.into(), Utc::now() + Duration::hours(1))
    .await
    .unwrap();
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
  let (s, _) = tenant_store().await;
  let err = s
    .create_tenant("Acme Again".into(), "acme".into())
    .await
    .unwrap_err();
  assert!(matches!(err, Error::Core(fieldops_core::Error::Conflict(_))));
}

#[tokio::test]
async fn tenant_lookup_by_slug() {
  let (s, tenant) = tenant_store().await;
  let found = s.get_tenant_by_slug("acme".into()).await.unwrap().unwrap();
  assert_eq!(found.id, tenant);
  assert!(s.get_tenant_by_slug("nope".into()).await.unwrap().is_none());
}

#[tokio::test]
async fn usernames_are_unique_per_tenant_only() {
  let (s, tenant) = tenant_store().await;
  let other = second_tenant(&s).await;
  user(&s, tenant, "jdoe").await;
  user(&s, other, "jdoe").await;

  let err = s.create_user(tenant, new_user("jdoe")).await.unwrap_err();
  assert!(matches!(err, Error::Core(fieldops_core::Error::Conflict(_))));
}

#[tokio::test]
async fn credentials_are_found_through_tenant_slug() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;

  let creds = s
    .find_credentials("acme".into(), "jdoe".into())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(creds.user.id, id);
  assert_eq!(creds.password_hash, "$argon2id$stub");

  let missing = s
    .find_credentials("other".into(), "jdoe".into())
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn token_resolves_to_current_user() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  issue_token(&s, id, "hash-1").await;

  let current = s
    .resolve_token("hash-1".into(), Utc::now())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(current.user_id, id);
  assert_eq!(current.tenant_id, tenant);
  assert_eq!(current.role, Role::Manager);
}

#[tokio::test]
async fn expired_token_does_not_resolve() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  issue_token(&s, id, "hash-1").await;

  let later = Utc::now() + Duration::hours(2);
  assert!(s.resolve_token("hash-1".into(), later).await.unwrap().is_none());
}

#[tokio::test]
async fn revoked_token_does_not_resolve() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  issue_token(&s, id, "hash-1").await;

  s.revoke_token("hash-1".into()).await.unwrap();
  assert!(
    s.resolve_token("hash-1".into(), Utc::now())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn deactivating_a_user_revokes_their_tokens() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  issue_token(&s, id, "hash-1").await;

  s.update_user(tenant, id, UserUpdate {
    display_name: "Site Manager".into(),
    email:        None,
    role:         Role::Manager,
    employee_id:  None,
    is_active:    false,
  })
  .await
  .unwrap();
  assert!(
    s.resolve_token("hash-1".into(), Utc::now())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn password_change_revokes_tokens() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  issue_token(&s, id, "hash-1").await;

  s.set_password(tenant, id, "$argon2id$new".into())
    .await
    .unwrap();
  assert!(
    s.resolve_token("hash-1".into(), Utc::now())
      .await
      .unwrap()
      .is_none()
  );
}

#[tokio::test]
async fn deleted_user_frees_username() {
  let (s, tenant) = tenant_store().await;
  let id = user(&s, tenant, "jdoe").await;
  s.delete_user(tenant, id).await.unwrap();
  assert!(s.get_user(tenant, id).await.unwrap().is_none());
  user(&s, tenant, "jdoe").await;
}
