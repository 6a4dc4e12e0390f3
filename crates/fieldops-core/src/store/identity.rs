use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  tenancy::{CurrentUser, NewUser, Tenant, User, UserCredentials, UserUpdate},
};

/// Tenants, users, and bearer tokens.
pub trait IdentityStore: StoreBase {
  // ── Tenants ───────────────────────────────────────────────────────────

  /// Create a tenant. Fails with a conflict if `slug` is taken.
  fn create_tenant(
    &self,
    name: String,
    slug: String,
  ) -> impl Future<Output = Result<Tenant, Self::Error>> + Send + '_;

  fn get_tenant_by_slug(
    &self,
    slug: String,
  ) -> impl Future<Output = Result<Option<Tenant>, Self::Error>> + Send + '_;

  // ── Users ─────────────────────────────────────────────────────────────

  /// Create a user. Fails with a conflict if the username is taken within
  /// the tenant.
  fn create_user(
    &self,
    tenant_id: Uuid,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  fn list_users(
    &self,
    tenant_id: Uuid,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<User>, Self::Error>> + Send + '_;

  fn update_user(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: UserUpdate,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Replace a user's password hash and revoke their tokens.
  fn set_password(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    password_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Soft-delete a user and revoke their tokens.
  fn delete_user(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Look up an active user for login, by tenant slug and username.
  fn find_credentials(
    &self,
    tenant_slug: String,
    username: String,
  ) -> impl Future<Output = Result<Option<UserCredentials>, Self::Error>> + Send + '_;

  // ── Tokens ────────────────────────────────────────────────────────────

  /// Persist the digest of a freshly issued token.
  fn store_token(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Resolve a token digest to its user. Expired tokens, revoked tokens,
  /// and tokens of inactive or deleted users resolve to `None`.
  fn resolve_token(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<CurrentUser>, Self::Error>> + Send + '_;

  fn revoke_token(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}
