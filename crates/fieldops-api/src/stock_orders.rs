//! Handlers for `/stock-orders` and their workflow endpoints.
//!
//! | Method | Path | Permission |
//! |--------|------|------------|
//! | `GET`  | `/stock-orders[?status=&site_id=]` | `StockManagement.View` |
//! | `POST` | `/stock-orders/{id}/approve` | `StockManagement.Approve` |
//! | `POST` | `/stock-orders/{id}/reject` | `StockManagement.Approve`; optional `{"reason"}` |
//! | `POST` | `/stock-orders/{id}/cancel` | `StockManagement.Edit`; optional `{"reason"}` |
//! | `POST` | `/stock-orders/{id}/{submit,start-picking,ready-for-collection,collect}` | `StockManagement.Edit` |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  stock::{StockOrder, StockOrderAction, StockOrderFilter, StockOrderInput},
  store::Store,
  tenancy::Permission,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

// ─── CRUD ────────────────────────────────────────────────────────────────────

/// `GET /stock-orders`
pub async fn list<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<StockOrderFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<StockOrder>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  let page = state
    .store
    .list_stock_orders(user.tenant_id, filter, query)
    .await?;
  Ok(Json(page))
}

/// `GET /stock-orders/{id}`
pub async fn get_one<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  found(state.store.get_stock_order(user.tenant_id, id).await?, "stock order", id)
}

/// `POST /stock-orders`; the caller is recorded as the requester.
pub async fn create<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<StockOrderInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let order = state
    .store
    .create_stock_order(user.tenant_id, body, user.user_id)
    .await?;
  Ok(created("stock-orders", order.id, order))
}

/// `PUT /stock-orders/{id}`
pub async fn update<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<StockOrderInput>,
) -> Result<Json<StockOrder>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  Ok(Json(state.store.update_stock_order(user.tenant_id, id, body).await?))
}

/// `DELETE /stock-orders/{id}`
pub async fn delete<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  state.store.delete_stock_order(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Workflow ────────────────────────────────────────────────────────────────

/// Optional body of `reject` and `cancel`.
#[derive(Debug, Default, Deserialize)]
pub struct ReasonBody {
  pub reason: Option<String>,
}

fn reason(body: Option<Json<ReasonBody>>) -> Option<String> {
  body
    .and_then(|Json(b)| b.reason)
    .map(|r| r.trim().to_string())
    .filter(|r| !r.is_empty())
}

async fn transition<S: Store>(
  state: &ApiState<S>,
  auth: &Authenticated,
  id: Uuid,
  action: StockOrderAction,
  permission: Permission,
) -> Result<Json<StockOrder>, ApiError> {
  let user = auth.require(permission)?;
  let order = state
    .store
    .transition_stock_order(user.tenant_id, id, action, user.user_id)
    .await?;
  Ok(Json(order))
}

/// `POST /stock-orders/{id}/submit`
pub async fn submit<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  transition(&state, &auth, id, StockOrderAction::Submit, Permission::StockEdit)
    .await
}

/// `POST /stock-orders/{id}/approve` reserves the order's stock.
pub async fn approve<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  transition(
    &state,
    &auth,
    id,
    StockOrderAction::Approve,
    Permission::StockApprove,
  )
  .await
}

/// `POST /stock-orders/{id}/reject`
pub async fn reject<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  body: Option<Json<ReasonBody>>,
) -> Result<Json<StockOrder>, ApiError> {
  let action = StockOrderAction::Reject { reason: reason(body) };
  transition(&state, &auth, id, action, Permission::StockApprove).await
}

/// `POST /stock-orders/{id}/start-picking`
pub async fn start_picking<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  transition(
    &state,
    &auth,
    id,
    StockOrderAction::StartPicking,
    Permission::StockEdit,
  )
  .await
}

/// `POST /stock-orders/{id}/ready-for-collection`
pub async fn ready_for_collection<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  transition(
    &state,
    &auth,
    id,
    StockOrderAction::ReadyForCollection,
    Permission::StockEdit,
  )
  .await
}

/// `POST /stock-orders/{id}/collect` issues the reserved stock.
pub async fn collect<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockOrder>, ApiError> {
  transition(&state, &auth, id, StockOrderAction::Collect, Permission::StockEdit)
    .await
}

/// `POST /stock-orders/{id}/cancel` releases any reservation.
pub async fn cancel<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  body: Option<Json<ReasonBody>>,
) -> Result<Json<StockOrder>, ApiError> {
  let action = StockOrderAction::Cancel { reason: reason(body) };
  transition(&state, &auth, id, action, Permission::StockEdit).await
}
