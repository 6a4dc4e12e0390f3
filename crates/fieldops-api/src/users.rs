//! Handlers for `/users`. Every route needs `Users.Manage`.
//!
//! Passwords arrive in clear text over the request body and are hashed with
//! argon2 before they reach the store. Changing a password, deactivating a
//! user, or deleting one revokes their tokens.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  store::Store,
  tenancy::{NewUser, Permission, Role, User, UserUpdate},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
  ApiState,
  auth::{self, Authenticated},
  created,
  error::ApiError,
  found,
};

pub const MIN_PASSWORD_LEN: usize = 8;

/// Check the password policy and hash off the async runtime.
async fn hash_new_password(password: String) -> Result<String, ApiError> {
  if password.chars().count() < MIN_PASSWORD_LEN {
    return Err(ApiError::BadRequest(format!(
      "password must be at least {MIN_PASSWORD_LEN} characters"
    )));
  }
  tokio::task::spawn_blocking(move || auth::hash_password(&password))
    .await
    .map_err(|e| ApiError::Internal(Box::new(e)))?
    .map_err(|e| ApiError::Internal(e.to_string().into()))
}

/// `GET /users`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<User>>, ApiError> {
  let user = auth.require(Permission::UsersManage)?;
  Ok(Json(state.store.list_users(user.tenant_id, query).await?))
}

/// `GET /users/{id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<User>, ApiError> {
  let user = auth.require(Permission::UsersManage)?;
  found(state.store.get_user(user.tenant_id, id).await?, "user", id)
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub username:     String,
  pub display_name: String,
  pub email:        Option<String>,
  pub role:         Role,
  pub employee_id:  Option<Uuid>,
  pub password:     String,
}

/// `POST /users`
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<CreateBody>,
) -> Result<Response, ApiError> {
  let caller = auth.require(Permission::UsersManage)?;
  let password_hash = hash_new_password(body.password).await?;
  let input = NewUser {
    username: body.username,
    display_name: body.display_name,
    email: body.email,
    role: body.role,
    employee_id: body.employee_id,
    password_hash,
  };
  let user = state.store.create_user(caller.tenant_id, input).await?;
  tracing::info!(user = %user.username, role = %user.role, by = %caller.username, "user created");
  Ok(created("users", user.id, user))
}

/// `PUT /users/{id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<UserUpdate>,
) -> Result<Json<User>, ApiError> {
  let caller = auth.require(Permission::UsersManage)?;
  Ok(Json(state.store.update_user(caller.tenant_id, id, body).await?))
}

#[derive(Debug, Deserialize)]
pub struct PasswordBody {
  pub password: String,
}

/// `PUT /users/{id}/password`
pub async fn set_password<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<PasswordBody>,
) -> Result<StatusCode, ApiError> {
  let caller = auth.require(Permission::UsersManage)?;
  let password_hash = hash_new_password(body.password).await?;
  state
    .store
    .set_password(caller.tenant_id, id, password_hash)
    .await?;
  tracing::info!(user = %id, by = %caller.username, "password changed");
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{id}`
pub async fn delete<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let caller = auth.require(Permission::UsersManage)?;
  if caller.user_id == id {
    return Err(ApiError::BadRequest("cannot delete your own account".into()));
  }
  state.store.delete_user(caller.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn short_passwords_are_rejected() {
    let err = hash_new_password("short".into()).await.unwrap_err();
    assert!(matches!(err, ApiError::BadRequest(_)));
  }

  #[tokio::test]
  async fn new_passwords_are_hashed() {
    let phc = hash_new_password("correct horse".into()).await.unwrap();
    assert!(phc.starts_with("$argon2"));
    assert!(auth::verify_password("correct horse", &phc));
  }
}
