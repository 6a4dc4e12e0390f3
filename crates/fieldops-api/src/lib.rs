//! JSON REST API for FieldOps.
//!
//! Exposes an axum [`Router`] backed by any [`fieldops_core::store::Store`].
//! Every route except `POST /auth/token` requires a bearer token; handlers
//! check the caller's named permission before touching the store. TLS and
//! transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", fieldops_api::api_router(store.clone(), token_ttl))
//! ```

pub mod auth;
pub mod directory;
pub mod error;
pub mod proposals;
pub mod purchasing;
pub mod rams;
pub mod stock;
pub mod stock_orders;
pub mod toolbox;
pub mod users;

use std::sync::Arc;

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
  routing::{get, post, put},
  Router,
};
use chrono::TimeDelta;
use fieldops_core::store::Store;
use serde::Serialize;
use uuid::Uuid;

pub use error::ApiError;

// ─── State ───────────────────────────────────────────────────────────────────

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:     Arc<S>,
  /// Lifetime of tokens issued by `POST /auth/token`.
  pub token_ttl: TimeDelta,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), token_ttl: self.token_ttl }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, token_ttl: TimeDelta) -> Router<()>
where
  S: Store + 'static,
{
  Router::new()
    // Auth
    .route("/auth/token", post(auth::login::<S>))
    .route("/auth/logout", post(auth::logout::<S>))
    .route("/auth/me", get(auth::me))
    // Users
    .route("/users", get(users::list::<S>).post(users::create::<S>))
    .route(
      "/users/{id}",
      get(users::get_one::<S>)
        .put(users::update::<S>)
        .delete(users::delete::<S>),
    )
    .route("/users/{id}/password", put(users::set_password::<S>))
    // Directory
    .route(
      "/companies",
      get(directory::list_companies::<S>).post(directory::create_company::<S>),
    )
    .route(
      "/companies/{id}",
      get(directory::get_company::<S>)
        .put(directory::update_company::<S>)
        .delete(directory::delete_company::<S>),
    )
    .route(
      "/contacts",
      get(directory::list_contacts::<S>).post(directory::create_contact::<S>),
    )
    .route(
      "/contacts/{id}",
      get(directory::get_contact::<S>)
        .put(directory::update_contact::<S>)
        .delete(directory::delete_contact::<S>),
    )
    .route(
      "/sites",
      get(directory::list_sites::<S>).post(directory::create_site::<S>),
    )
    .route(
      "/sites/{id}",
      get(directory::get_site::<S>)
        .put(directory::update_site::<S>)
        .delete(directory::delete_site::<S>),
    )
    .route(
      "/employees",
      get(directory::list_employees::<S>).post(directory::create_employee::<S>),
    )
    .route(
      "/employees/{id}",
      get(directory::get_employee::<S>)
        .put(directory::update_employee::<S>)
        .delete(directory::delete_employee::<S>),
    )
    // Stock catalogue
    .route(
      "/categories",
      get(stock::list_categories::<S>).post(stock::create_category::<S>),
    )
    .route(
      "/categories/{id}",
      get(stock::get_category::<S>)
        .put(stock::update_category::<S>)
        .delete(stock::delete_category::<S>),
    )
    .route(
      "/suppliers",
      get(stock::list_suppliers::<S>).post(stock::create_supplier::<S>),
    )
    .route(
      "/suppliers/{id}",
      get(stock::get_supplier::<S>)
        .put(stock::update_supplier::<S>)
        .delete(stock::delete_supplier::<S>),
    )
    .route(
      "/products",
      get(stock::list_products::<S>).post(stock::create_product::<S>),
    )
    .route(
      "/products/{id}",
      get(stock::get_product::<S>)
        .put(stock::update_product::<S>)
        .delete(stock::delete_product::<S>),
    )
    .route(
      "/stock-locations",
      get(stock::list_locations::<S>).post(stock::create_location::<S>),
    )
    .route(
      "/stock-locations/{id}",
      get(stock::get_location::<S>)
        .put(stock::update_location::<S>)
        .delete(stock::delete_location::<S>),
    )
    // Stock levels
    .route("/stock/levels", get(stock::list_levels::<S>))
    .route("/stock/adjustments", post(stock::adjust::<S>))
    .route("/stock/transactions", get(stock::list_transactions::<S>))
    // Stock orders
    .route(
      "/stock-orders",
      get(stock_orders::list::<S>).post(stock_orders::create::<S>),
    )
    .route(
      "/stock-orders/{id}",
      get(stock_orders::get_one::<S>)
        .put(stock_orders::update::<S>)
        .delete(stock_orders::delete::<S>),
    )
    .route("/stock-orders/{id}/submit", post(stock_orders::submit::<S>))
    .route("/stock-orders/{id}/approve", post(stock_orders::approve::<S>))
    .route("/stock-orders/{id}/reject", post(stock_orders::reject::<S>))
    .route(
      "/stock-orders/{id}/start-picking",
      post(stock_orders::start_picking::<S>),
    )
    .route(
      "/stock-orders/{id}/ready-for-collection",
      post(stock_orders::ready_for_collection::<S>),
    )
    .route("/stock-orders/{id}/collect", post(stock_orders::collect::<S>))
    .route("/stock-orders/{id}/cancel", post(stock_orders::cancel::<S>))
    // Purchasing
    .route(
      "/purchase-orders",
      get(purchasing::list::<S>).post(purchasing::create::<S>),
    )
    .route(
      "/purchase-orders/{id}",
      get(purchasing::get_one::<S>)
        .put(purchasing::update::<S>)
        .delete(purchasing::delete::<S>),
    )
    .route("/purchase-orders/{id}/submit", post(purchasing::submit::<S>))
    .route("/purchase-orders/{id}/receive", post(purchasing::receive::<S>))
    .route("/purchase-orders/{id}/cancel", post(purchasing::cancel::<S>))
    // Proposals
    .route(
      "/proposals",
      get(proposals::list::<S>).post(proposals::create::<S>),
    )
    .route(
      "/proposals/{id}",
      get(proposals::get_one::<S>)
        .put(proposals::update::<S>)
        .delete(proposals::delete::<S>),
    )
    .route("/proposals/{id}/{action}", post(proposals::transition::<S>))
    // RAMS
    .route("/rams", get(rams::list::<S>).post(rams::create::<S>))
    .route(
      "/rams/{id}",
      get(rams::get_one::<S>)
        .put(rams::update::<S>)
        .delete(rams::delete::<S>),
    )
    .route("/rams/{id}/submit", post(rams::submit::<S>))
    .route("/rams/{id}/approve", post(rams::approve::<S>))
    .route("/rams/{id}/reject", post(rams::reject::<S>))
    .route("/rams/{id}/revise", post(rams::revise::<S>))
    // Toolbox talks
    .route(
      "/toolbox/talks",
      get(toolbox::list_talks::<S>).post(toolbox::create_talk::<S>),
    )
    .route(
      "/toolbox/talks/{id}",
      get(toolbox::get_talk::<S>)
        .put(toolbox::update_talk::<S>)
        .delete(toolbox::delete_talk::<S>),
    )
    .route(
      "/toolbox/schedules",
      get(toolbox::list_schedules::<S>).post(toolbox::create_schedule::<S>),
    )
    .route(
      "/toolbox/schedules/process-due",
      post(toolbox::process_due::<S>),
    )
    .route(
      "/toolbox/schedules/{id}",
      get(toolbox::get_schedule::<S>)
        .put(toolbox::update_schedule::<S>)
        .delete(toolbox::delete_schedule::<S>),
    )
    .route(
      "/toolbox/schedules/{id}/process",
      post(toolbox::process_schedule::<S>),
    )
    .route(
      "/toolbox/schedules/{id}/cancel",
      post(toolbox::cancel_schedule::<S>),
    )
    .route("/toolbox/assignments", get(toolbox::list_assignments::<S>))
    .route("/toolbox/assignments/{id}", get(toolbox::get_assignment::<S>))
    .route(
      "/toolbox/assignments/{id}/start",
      post(toolbox::start_assignment::<S>),
    )
    .route(
      "/toolbox/assignments/{id}/complete",
      post(toolbox::complete_assignment::<S>),
    )
    .with_state(ApiState { store, token_ttl })
}

// ─── Response helpers ────────────────────────────────────────────────────────

/// `201 Created` with a `Location` header pointing at the new record.
pub(crate) fn created<T: Serialize>(resource: &str, id: Uuid, body: T) -> Response {
  (
    StatusCode::CREATED,
    [(header::LOCATION, format!("/api/{resource}/{id}"))],
    Json(body),
  )
    .into_response()
}

/// `200` with the record, or `404` naming what was missing.
pub(crate) fn found<T>(
  record: Option<T>,
  entity: &str,
  id: Uuid,
) -> Result<Json<T>, ApiError> {
  record
    .map(Json)
    .ok_or_else(|| ApiError::NotFound(format!("{entity} not found: {id}")))
}
