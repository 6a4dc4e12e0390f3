use std::future::Future;

use uuid::Uuid;

use super::StoreBase;
use crate::{
  common::{ListQuery, Page},
  purchasing::{
    PurchaseOrder, PurchaseOrderAction, PurchaseOrderFilter, PurchaseOrderInput,
    PurchaseReceipt,
  },
};

/// Purchase orders and goods receipts.
pub trait PurchasingStore: StoreBase {
  fn list_purchase_orders(
    &self,
    tenant_id: Uuid,
    filter: PurchaseOrderFilter,
    query: ListQuery,
  ) -> impl Future<Output = Result<Page<PurchaseOrder>, Self::Error>> + Send + '_;

  fn get_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<PurchaseOrder>, Self::Error>> + Send + '_;

  /// Create a Draft purchase order with the next `PO-` number.
  fn create_purchase_order(
    &self,
    tenant_id: Uuid,
    input: PurchaseOrderInput,
    created_by: Uuid,
  ) -> impl Future<Output = Result<PurchaseOrder, Self::Error>> + Send + '_;

  /// Replace the header and lines of a Draft purchase order.
  fn update_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    input: PurchaseOrderInput,
  ) -> impl Future<Output = Result<PurchaseOrder, Self::Error>> + Send + '_;

  fn delete_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn transition_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    action: PurchaseOrderAction,
  ) -> impl Future<Output = Result<PurchaseOrder, Self::Error>> + Send + '_;

  /// Book received goods into stock at the order's location and move the
  /// order to PartiallyReceived or Received.
  fn receive_purchase_order(
    &self,
    tenant_id: Uuid,
    id: Uuid,
    receipt: PurchaseReceipt,
    actor: Uuid,
  ) -> impl Future<Output = Result<PurchaseOrder, Self::Error>> + Send + '_;
}
