//! Handlers for `/proposals`.
//!
//! `POST /proposals/{id}/{action}` drives the workflow, where `action` is
//! one of `submit`, `accept`, `reject`, `cancel`, or `revise`. Reads need
//! `Proposals.View`; everything else needs `Proposals.Edit`.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  proposal::{Proposal, ProposalAction, ProposalFilter, ProposalInput},
  store::Store,
  tenancy::Permission,
};
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

/// `GET /proposals[?status=&company_id=]`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<ProposalFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Proposal>>, ApiError> {
  let user = auth.require(Permission::ProposalsView)?;
  Ok(Json(state.store.list_proposals(user.tenant_id, filter, query).await?))
}

/// `GET /proposals/{id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Proposal>, ApiError> {
  let user = auth.require(Permission::ProposalsView)?;
  found(state.store.get_proposal(user.tenant_id, id).await?, "proposal", id)
}

/// `POST /proposals`
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<ProposalInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::ProposalsEdit)?;
  let proposal = state.store.create_proposal(user.tenant_id, body).await?;
  Ok(created("proposals", proposal.id, proposal))
}

/// `PUT /proposals/{id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ProposalInput>,
) -> Result<Json<Proposal>, ApiError> {
  let user = auth.require(Permission::ProposalsEdit)?;
  Ok(Json(state.store.update_proposal(user.tenant_id, id, body).await?))
}

/// `DELETE /proposals/{id}`
pub async fn delete<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::ProposalsEdit)?;
  state.store.delete_proposal(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /proposals/{id}/{action}`; an unknown action is a 404 like any
/// other unknown path.
pub async fn transition<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path((id, action)): Path<(Uuid, String)>,
) -> Result<Json<Proposal>, ApiError> {
  let action = parse_action(&action)
    .ok_or_else(|| ApiError::NotFound(format!("unknown proposal action: {action}")))?;
  let user = auth.require(Permission::ProposalsEdit)?;
  let proposal = state
    .store
    .transition_proposal(user.tenant_id, id, action)
    .await?;
  Ok(Json(proposal))
}

fn parse_action(action: &str) -> Option<ProposalAction> { action.parse().ok() }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn actions_parse_from_path_segments() {
    assert_eq!(parse_action("submit"), Some(ProposalAction::Submit));
    assert_eq!(parse_action("revise"), Some(ProposalAction::Revise));
    assert_eq!(parse_action("approve"), None);
    assert_eq!(parse_action("Submit"), None);
  }
}
