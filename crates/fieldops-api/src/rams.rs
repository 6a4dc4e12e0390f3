//! Handlers for `/rams` (risk assessment and method statement documents).
//!
//! Approving and rejecting need `Rams.Approve`; other writes need
//! `Rams.Edit`. Reject takes `{"reason": "…"}`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  rams::{RamsAction, RamsDocument, RamsFilter, RamsInput},
  store::Store,
  tenancy::Permission,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

// ─── CRUD ────────────────────────────────────────────────────────────────────

/// `GET /rams[?status=&site_id=]`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<RamsFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<RamsDocument>>, ApiError> {
  let user = auth.require(Permission::RamsView)?;
  Ok(Json(state.store.list_rams(user.tenant_id, filter, query).await?))
}

/// `GET /rams/{id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<RamsDocument>, ApiError> {
  let user = auth.require(Permission::RamsView)?;
  found(state.store.get_rams(user.tenant_id, id).await?, "RAMS document", id)
}

/// `POST /rams`
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<RamsInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::RamsEdit)?;
  let doc = state.store.create_rams(user.tenant_id, body).await?;
  Ok(created("rams", doc.id, doc))
}

/// `PUT /rams/{id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<RamsInput>,
) -> Result<Json<RamsDocument>, ApiError> {
  let user = auth.require(Permission::RamsEdit)?;
  Ok(Json(state.store.update_rams(user.tenant_id, id, body).await?))
}

/// `DELETE /rams/{id}`
pub async fn delete<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::RamsEdit)?;
  state.store.delete_rams(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Workflow ────────────────────────────────────────────────────────────────

async fn transition<S: Store>(
  state: &ApiState<S>,
  auth: &Authenticated,
  id: Uuid,
  action: RamsAction,
  permission: Permission,
) -> Result<Json<RamsDocument>, ApiError> {
  let user = auth.require(permission)?;
  let doc = state
    .store
    .transition_rams(user.tenant_id, id, action, user.user_id)
    .await?;
  Ok(Json(doc))
}

/// `POST /rams/{id}/submit`
pub async fn submit<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<RamsDocument>, ApiError> {
  transition(&state, &auth, id, RamsAction::Submit, Permission::RamsEdit).await
}

/// `POST /rams/{id}/approve`
pub async fn approve<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<RamsDocument>, ApiError> {
  transition(&state, &auth, id, RamsAction::Approve, Permission::RamsApprove)
    .await
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub reason: String,
}

/// `POST /rams/{id}/reject`
pub async fn reject<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<RamsDocument>, ApiError> {
  let action = RamsAction::Reject { reason: body.reason };
  transition(&state, &auth, id, action, Permission::RamsApprove).await
}

/// `POST /rams/{id}/revise` reopens the document as the next revision.
pub async fn revise<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<RamsDocument>, ApiError> {
  transition(&state, &auth, id, RamsAction::Revise, Permission::RamsEdit).await
}
