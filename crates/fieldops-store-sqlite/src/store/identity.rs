//! Tenants, users, and bearer-token digests.

use chrono::{DateTime, Utc};
use fieldops_core::{
  common::{ListQuery, Page, require_text},
  store::IdentityStore,
  tenancy::{CurrentUser, NewUser, Tenant, User, UserCredentials, UserUpdate},
};
use rusqlite::{OptionalExtension as _, Row};
use uuid::Uuid;

use super::{
  SqliteStore,
  directory::EMPLOYEES,
  query::{Table, fetch, get_row, list_page, not_found, now, require_opt_ref, soft_delete},
};
use crate::{
  Result,
  encode::{encode_dt, encode_opt_uuid, encode_uuid, parse_col, parse_opt_col},
};

pub(super) const USERS: Table = Table {
  name:          "users",
  entity:        "user",
  search:        &["username", "display_name", "email"],
  sorts:         &[
    ("username", "username"),
    ("display_name", "display_name"),
    ("role", "role"),
    ("created_at", "created_at"),
  ],
  default_order: "username",
  soft_delete:   true,
};

fn tenant_from_row(row: &Row<'_>) -> rusqlite::Result<Tenant> {
  Ok(Tenant {
    id:         parse_col(row, "id")?,
    name:       row.get("name")?,
    slug:       row.get("slug")?,
    created_at: parse_col(row, "created_at")?,
  })
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
  Ok(User {
    id:           parse_col(row, "id")?,
    tenant_id:    parse_col(row, "tenant_id")?,
    username:     row.get("username")?,
    display_name: row.get("display_name")?,
    email:        row.get("email")?,
    role:         parse_col(row, "role")?,
    employee_id:  parse_opt_col(row, "employee_id")?,
    is_active:    row.get("is_active")?,
    created_at:   parse_col(row, "created_at")?,
    updated_at:   parse_col(row, "updated_at")?,
  })
}

fn revoke_user_tokens(
  conn: &rusqlite::Connection,
  user_id: Uuid,
  at: &str,
) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE api_tokens SET revoked_at = ?1 WHERE user_id = ?2 AND revoked_at IS NULL",
    rusqlite::params![at, encode_uuid(user_id)],
  )
}

impl IdentityStore for SqliteStore {
  // ── Tenants ───────────────────────────────────────────────────────────────

  async fn create_tenant(&self, name: String, slug: String) -> Result<Tenant> {
    require_text("name", &name)?;
    require_text("slug", &slug)?;

    let tenant = Tenant {
      id: Uuid::new_v4(),
      name,
      slug,
      created_at: Utc::now(),
    };
    let row = tenant.clone();

    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO tenants (id, name, slug, created_at) VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            encode_uuid(row.id),
            row.name,
            row.slug,
            encode_dt(row.created_at)
          ],
        )?;
        Ok(())
      })
      .await?;

    tracing::info!(tenant = %tenant.slug, "tenant created");
    Ok(tenant)
  }

  async fn get_tenant_by_slug(&self, slug: String) -> Result<Option<Tenant>> {
    self
      .read(move |conn| {
        conn
          .query_row(
            "SELECT * FROM tenants WHERE slug = ?1",
            rusqlite::params![slug],
            tenant_from_row,
          )
          .optional()
      })
      .await
  }

  // ── Users ─────────────────────────────────────────────────────────────────

  async fn create_user(&self, tenant_id: Uuid, input: NewUser) -> Result<User> {
    input.validate()?;
    let id = Uuid::new_v4();

    self
      .write(move |tx| {
        require_opt_ref(tx, &EMPLOYEES, tenant_id, input.employee_id)?;
        let at = now();
        tx.execute(
          "INSERT INTO users (
             id, tenant_id, username, display_name, email, role, employee_id,
             password_hash, is_active, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 1, ?9, ?9)",
          rusqlite::params![
            encode_uuid(id),
            encode_uuid(tenant_id),
            input.username,
            input.display_name,
            input.email,
            input.role.to_string(),
            encode_opt_uuid(input.employee_id),
            input.password_hash,
            at,
          ],
        )?;
        fetch(tx, &USERS, tenant_id, id, user_from_row)
      })
      .await
  }

  async fn get_user(&self, tenant_id: Uuid, id: Uuid) -> Result<Option<User>> {
    self
      .read(move |conn| get_row(conn, &USERS, tenant_id, id, user_from_row))
      .await
  }

  async fn list_users(&self, tenant_id: Uuid, query: ListQuery) -> Result<Page<User>> {
    let (items, total) = self
      .read({
        let query = query.clone();
        move |conn| list_page(conn, &USERS, tenant_id, Vec::new(), &query, user_from_row)
      })
      .await?;
    Ok(Page::new(items, total, &query))
  }

  async fn update_user(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: UserUpdate,
  ) -> Result<User> {
    input.validate()?;

    self
      .write(move |tx| {
        require_opt_ref(tx, &EMPLOYEES, tenant_id, input.employee_id)?;
        let at = now();
        let changed = tx.execute(
          "UPDATE users
           SET display_name = ?1, email = ?2, role = ?3, employee_id = ?4,
               is_active = ?5, updated_at = ?6
           WHERE tenant_id = ?7 AND id = ?8 AND is_deleted = 0",
          rusqlite::params![
            input.display_name,
            input.email,
            input.role.to_string(),
            encode_opt_uuid(input.employee_id),
            input.is_active,
            at,
            encode_uuid(tenant_id),
            encode_uuid(id),
          ],
        )?;
        if changed == 0 {
          return Err(not_found(&USERS, id).into());
        }
        if !input.is_active {
          revoke_user_tokens(tx, id, &at)?;
        }
        fetch(tx, &USERS, tenant_id, id, user_from_row)
      })
      .await
  }

  async fn set_password(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    password_hash: String,
  ) -> Result<()> {
    self
      .write(move |tx| {
        let at = now();
        let changed = tx.execute(
          "UPDATE users SET password_hash = ?1, updated_at = ?2
           WHERE tenant_id = ?3 AND id = ?4 AND is_deleted = 0",
          rusqlite::params![password_hash, at, encode_uuid(tenant_id), encode_uuid(id)],
        )?;
        if changed == 0 {
          return Err(not_found(&USERS, id).into());
        }
        revoke_user_tokens(tx, id, &at)?;
        Ok(())
      })
      .await
  }

  async fn delete_user(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
    self
      .write(move |tx| {
        let at = now();
        soft_delete(tx, &USERS, tenant_id, id, &at)?;
        revoke_user_tokens(tx, id, &at)?;
        Ok(())
      })
      .await
  }

  async fn find_credentials(
    &self,
    tenant_slug: String,
    username: String,
  ) -> Result<Option<UserCredentials>> {
    self
      .read(move |conn| {
        conn
          .query_row(
            "SELECT u.* FROM users u
             JOIN tenants t ON t.id = u.tenant_id
             WHERE t.slug = ?1 AND u.username = ?2 AND u.is_deleted = 0",
            rusqlite::params![tenant_slug, username],
            |row| {
              Ok(UserCredentials {
                user:          user_from_row(row)?,
                password_hash: row.get("password_hash")?,
              })
            },
          )
          .optional()
      })
      .await
  }

  // ── Tokens ────────────────────────────────────────────────────────────────

  async fn store_token(
    &self,
    user_id: Uuid,
    token_hash: String,
    expires_at: DateTime<Utc>,
  ) -> Result<()> {
    self
      .write(move |tx| {
        tx.execute(
          "INSERT INTO api_tokens (token_hash, user_id, created_at, expires_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            token_hash,
            encode_uuid(user_id),
            now(),
            encode_dt(expires_at)
          ],
        )?;
        Ok(())
      })
      .await
  }

  async fn resolve_token(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> Result<Option<CurrentUser>> {
    let now = encode_dt(now);
    self
      .read(move |conn| {
        conn
          .query_row(
            "SELECT u.* FROM api_tokens t
             JOIN users u ON u.id = t.user_id
             WHERE t.token_hash = ?1
               AND t.revoked_at IS NULL
               AND t.expires_at > ?2
               AND u.is_deleted = 0
               AND u.is_active = 1",
            rusqlite::params![token_hash, now],
            |row| {
              let user = user_from_row(row)?;
              Ok(CurrentUser {
                user_id:     user.id,
                tenant_id:   user.tenant_id,
                username:    user.username,
                role:        user.role,
                employee_id: user.employee_id,
              })
            },
          )
          .optional()
      })
      .await
  }

  async fn revoke_token(&self, token_hash: String) -> Result<()> {
    self
      .write(move |tx| {
        tx.execute(
          "UPDATE api_tokens SET revoked_at = ?1
           WHERE token_hash = ?2 AND revoked_at IS NULL",
          rusqlite::params![now(), token_hash],
        )?;
        Ok(())
      })
      .await
  }
}
