use std::future::Future;

use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  rams::{RamsAction, RamsDocument, RamsFilter, RamsInput},
};

/// RAMS documents with their risk assessments and method steps.
pub trait RamsStore: StoreBase {
  fn list_rams(
    &self,
    tenant_id: Uuid,
    filter: RamsFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<RamsDocument>, Self::Error>> + Send + '_;

  fn get_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<RamsDocument>, Self::Error>> + Send + '_;

  /// Create a Draft document at revision 1 with the next `RAMS-` reference.
  fn create_rams(
    &self,
    tenant_id: Uuid,
    input: RamsInput,
  ) -> impl Future<Output = Result<RamsDocument, Self::Error>> + Send + '_;

  /// Replace the content of a Draft document.
  fn update_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: RamsInput,
  ) -> impl Future<Output = Result<RamsDocument, Self::Error>> + Send + '_;

  fn delete_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Submit, approve, reject, or revise. `actor` is recorded as approver.
  fn transition_rams(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: RamsAction,
    actor: Uuid,
  ) -> impl Future<Output = Result<RamsDocument, Self::Error>> + Send + '_;
}
