//! Handlers for the stock catalogue and stock levels.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/categories`, `/suppliers`, `/stock-locations` | Paged |
//! | `GET`  | `/products` | Optional `?category_id=` |
//! | `GET`  | `/stock/levels` | `?product_id=&location_id=&low_stock=true` |
//! | `POST` | `/stock/adjustments` | Body: `{"product_id", "location_id", "quantity_delta", "reason"}` |
//! | `GET`  | `/stock/transactions` | `?product_id=&location_id=`, newest first |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::Response,
};
use fieldops_core::{
  common::{ListQuery, Page},
  stock::{
    Category, CategoryInput, Product, ProductInput, StockAdjustment, StockLevel,
    StockLevelFilter, StockLevelView, StockLocation, StockLocationInput,
    StockTransaction, Supplier, SupplierInput, TransactionFilter,
  },
  store::Store,
  tenancy::Permission,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, auth::Authenticated, created, error::ApiError, found};

// ─── Categories ──────────────────────────────────────────────────────────────

/// `GET /categories`
pub async fn list_categories<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Category>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  Ok(Json(state.store.list_categories(user.tenant_id, query).await?))
}

/// `GET /categories/{id}`
pub async fn get_category<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Category>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  found(state.store.get_category(user.tenant_id, id).await?, "category", id)
}

/// `POST /categories`
pub async fn create_category<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<CategoryInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let category = state.store.create_category(user.tenant_id, body).await?;
  Ok(created("categories", category.id, category))
}

/// `PUT /categories/{id}`
pub async fn update_category<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<CategoryInput>,
) -> Result<Json<Category>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  Ok(Json(state.store.update_category(user.tenant_id, id, body).await?))
}

/// `DELETE /categories/{id}`
pub async fn delete_category<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  state.store.delete_category(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Suppliers ───────────────────────────────────────────────────────────────

/// `GET /suppliers`
pub async fn list_suppliers<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Supplier>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  Ok(Json(state.store.list_suppliers(user.tenant_id, query).await?))
}

/// `GET /suppliers/{id}`
pub async fn get_supplier<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Supplier>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  found(state.store.get_supplier(user.tenant_id, id).await?, "supplier", id)
}

/// `POST /suppliers`
pub async fn create_supplier<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<SupplierInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let supplier = state.store.create_supplier(user.tenant_id, body).await?;
  Ok(created("suppliers", supplier.id, supplier))
}

/// `PUT /suppliers/{id}`
pub async fn update_supplier<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<SupplierInput>,
) -> Result<Json<Supplier>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  Ok(Json(state.store.update_supplier(user.tenant_id, id, body).await?))
}

/// `DELETE /suppliers/{id}`
pub async fn delete_supplier<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  state.store.delete_supplier(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Products ────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ProductParams {
  pub category_id: Option<Uuid>,
}

/// `GET /products[?category_id=<uuid>]`
pub async fn list_products<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(params): Query<ProductParams>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<Product>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  let page = state
    .store
    .list_products(user.tenant_id, params.category_id, query)
    .await?;
  Ok(Json(page))
}

/// `GET /products/{id}`
pub async fn get_product<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<Product>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  found(state.store.get_product(user.tenant_id, id).await?, "product", id)
}

/// `POST /products`
pub async fn create_product<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<ProductInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let product = state.store.create_product(user.tenant_id, body).await?;
  Ok(created("products", product.id, product))
}

/// `PUT /products/{id}`
pub async fn update_product<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<ProductInput>,
) -> Result<Json<Product>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  Ok(Json(state.store.update_product(user.tenant_id, id, body).await?))
}

/// `DELETE /products/{id}`
pub async fn delete_product<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  state.store.delete_product(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Stock locations ─────────────────────────────────────────────────────────

/// `GET /stock-locations`
pub async fn list_locations<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<StockLocation>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  Ok(Json(state.store.list_stock_locations(user.tenant_id, query).await?))
}

/// `GET /stock-locations/{id}`
pub async fn get_location<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<Json<StockLocation>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  let location = state.store.get_stock_location(user.tenant_id, id).await?;
  found(location, "stock location", id)
}

/// `POST /stock-locations`
pub async fn create_location<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<StockLocationInput>,
) -> Result<Response, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let location = state
    .store
    .create_stock_location(user.tenant_id, body)
    .await?;
  Ok(created("stock-locations", location.id, location))
}

/// `PUT /stock-locations/{id}`
pub async fn update_location<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
  Json(body): Json<StockLocationInput>,
) -> Result<Json<StockLocation>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let location = state
    .store
    .update_stock_location(user.tenant_id, id, body)
    .await?;
  Ok(Json(location))
}

/// `DELETE /stock-locations/{id}`
pub async fn delete_location<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  state.store.delete_stock_location(user.tenant_id, id).await?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Levels & transactions ───────────────────────────────────────────────────

/// `GET /stock/levels`
pub async fn list_levels<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<StockLevelFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<StockLevelView>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  let page = state
    .store
    .list_stock_levels(user.tenant_id, filter, query)
    .await?;
  Ok(Json(page))
}

/// `POST /stock/adjustments`
pub async fn adjust<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Json(body): Json<StockAdjustment>,
) -> Result<Json<StockLevel>, ApiError> {
  let user = auth.require(Permission::StockEdit)?;
  let level = state
    .store
    .adjust_stock(user.tenant_id, body, user.user_id)
    .await?;
  Ok(Json(level))
}

/// `GET /stock/transactions`
pub async fn list_transactions<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
  Query(filter): Query<TransactionFilter>,
  Query(query): Query<ListQuery>,
) -> Result<Json<Page<StockTransaction>>, ApiError> {
  let user = auth.require(Permission::StockView)?;
  let page = state
    .store
    .list_stock_transactions(user.tenant_id, filter, query)
    .await?;
  Ok(Json(page))
}
