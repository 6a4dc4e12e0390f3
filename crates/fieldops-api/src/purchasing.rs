//! Handlers for `/purchase-orders`.
//!
//! Reads need `Purchasing.View`; everything else needs `Purchasing.Edit`.
//! `POST /purchase-orders/{id}/receive` takes
//! `{"lines":[{"line_id":"…","quantity":4}]}` and books the goods into stock.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  purchasing::{
    PurchaseOrder, PurchaseOrderAction, PurchaseOrderFilter, PurchaseOrderInput,
    PurchaseReceipt,
  },
  store::Store,
  tenancy::Permission,
};
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

/// `GET /purchase-orders[?status=&supplier_id=]`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<PurchaseOrderFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<PurchaseOrder>>, ApiError> {
  let user = auth.require(Permission::PurchasingView)?;
  let page = state
    .store
    .list_purchase_orders(user.tenant_id, filter, query)
    .await?;
  Ok(Json(page))
}

/// `GET /purchase-orders/{id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrder>, ApiError> {
  let user = auth.require(Permission::PurchasingView)?;
  let order = state.store.get_purchase_order(user.tenant_id, id).await?;
  found(order, "purchase order", id)
}

/// `POST /purchase-orders`
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<PurchaseOrderInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  let order = state
    .store
    .create_purchase_order(user.tenant_id, body, user.user_id)
    .await?;
  Ok(created("purchase-orders", order.id, order))
}

/// `PUT /purchase-orders/{id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<PurchaseOrderInput>,
) -> Result<Json<PurchaseOrder>, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  let order = state
    .store
    .update_purchase_order(user.tenant_id, id, body)
    .await?;
  Ok(Json(order))
}

/// `DELETE /purchase-orders/{id}`
pub async fn delete<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  state.store.delete_purchase_order(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

/// `POST /purchase-orders/{id}/submit`
pub async fn submit<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrder>, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  let order = state
    .store
    .transition_purchase_order(user.tenant_id, id, PurchaseOrderAction::Submit)
    .await?;
  Ok(Json(order))
}

/// `POST /purchase-orders/{id}/receive`
pub async fn receive<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<PurchaseReceipt>,
) -> Result<Json<PurchaseOrder>, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  let order = state
    .store
    .receive_purchase_order(user.tenant_id, id, body, user.user_id)
    .await?;
  Ok(Json(order))
}

/// `POST /purchase-orders/{id}/cancel`
pub async fn cancel<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<PurchaseOrder>, ApiError> {
  let user = auth.require(Permission::PurchasingEdit)?;
  let order = state
    .store
    .transition_purchase_order(user.tenant_id, id, PurchaseOrderAction::Cancel)
    .await?;
  Ok(Json(order))
}
