use std::future::Future;

use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  proposal::{Proposal, ProposalAction, ProposalFilter, ProposalInput},
};

/// Proposals (quotes).
pub trait ProposalStore: StoreBase {
  fn list_proposals(
    &self,
    tenant_id: Uuid,
    filter: ProposalFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<Proposal>, Self::Error>> + Send + '_;

  fn get_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Proposal>, Self::Error>> + Send + '_;

  /// Create a Draft proposal with the next `PR-` reference.
  fn create_proposal(
    &self,
    tenant_id: Uuid,
    input: ProposalInput,
  ) -> impl Future<Output = Result<Proposal, Self::Error>> + Send + '_;

  /// Replace the header and sections of a Draft proposal.
  fn update_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: ProposalInput,
  ) -> impl Future<Output = Result<Proposal, Self::Error>> + Send + '_;

  fn delete_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn transition_proposal(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: ProposalAction,
  ) -> impl Future<Output = Result<Proposal, Self::Error>> + Send + '_;
}
