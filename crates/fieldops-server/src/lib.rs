//! HTTP server for FieldOps.
//!
//! Composes the `/api` router from `fieldops-api` with a health check and
//! request tracing, seeds the first tenant and administrator, and runs the
//! periodic toolbox-talk schedule sweep.

use std::{path::{Path, PathBuf}, sync::Arc, time::Duration};

use axum::{Json, Router, routing::get};
use chrono::{TimeDelta, Utc};
use fieldops_core::{
  store::{IdentityStore, Store, ToolboxStore},
  tenancy::{NewUser, Role},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::{task::JoinHandle, time::MissedTickBehavior};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `FIELDOPS_*` environment variables.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
  pub host:                String,
  pub port:                u16,
  pub store_path:          PathBuf,
  pub token_ttl_hours:     i64,
  /// Seconds between schedule sweeps; `0` turns the sweep off.
  pub schedule_sweep_secs: u64,
  pub bootstrap:           Option<Bootstrap>,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:                "127.0.0.1".to_string(),
      port:                8080,
      store_path:          PathBuf::from("fieldops.db"),
      token_ttl_hours:     12,
      schedule_sweep_secs: 3600,
      bootstrap:           None,
    }
  }
}

impl ServerConfig {
  pub fn token_ttl(&self) -> TimeDelta { TimeDelta::hours(self.token_ttl_hours) }
}

/// The tenant and administrator to create on first start.
#[derive(Debug, Deserialize, Clone)]
pub struct Bootstrap {
  pub tenant_name:         String,
  pub tenant_slug:         String,
  pub admin_username:      String,
  /// Argon2 PHC string, as printed by `--hash-password`.
  pub admin_password_hash: String,
}

/// Read `path` (if it exists) layered under `FIELDOPS_*` environment
/// variables. Nested keys use a double underscore, e.g.
/// `FIELDOPS_BOOTSTRAP__TENANT_SLUG`.
pub fn load_config(path: &Path) -> Result<ServerConfig, config::ConfigError> {
  config::Config::builder()
    .add_source(config::File::from(path).required(false))
    .add_source(
      config::Environment::with_prefix("FIELDOPS")
        .prefix_separator("_")
        .separator("__"),
    )
    .build()?
    .try_deserialize()
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The complete application: `/health` plus the API under `/api`.
pub fn app<S>(store: Arc<S>, token_ttl: TimeDelta) -> Router
where
  S: Store + 'static,
{
  Router::new()
    .route("/health", get(health))
    .nest("/api", fieldops_api::api_router(store, token_ttl))
    .layer(TraceLayer::new_for_http())
}

async fn health() -> Json<Value> { Json(json!({ "status": "ok" })) }

// ─── Startup tasks ────────────────────────────────────────────────────────────

/// Create the configured tenant and administrator unless they exist.
pub async fn bootstrap<S: IdentityStore>(
  store: &S,
  seed: &Bootstrap,
) -> Result<(), S::Error> {
  let tenant = match store.get_tenant_by_slug(seed.tenant_slug.clone()).await? {
    Some(tenant) => tenant,
    None => {
      store
        .create_tenant(seed.tenant_name.clone(), seed.tenant_slug.clone())
        .await?
    }
  };

  let existing = store
    .find_credentials(seed.tenant_slug.clone(), seed.admin_username.clone())
    .await?;
  if existing.is_some() {
    tracing::debug!(tenant = %tenant.slug, "bootstrap administrator already exists");
    return Ok(());
  }

  let admin = store
    .create_user(tenant.id, NewUser {
      username:      seed.admin_username.clone(),
      display_name:  "Administrator".to_string(),
      email:         None,
      role:          Role::Admin,
      employee_id:   None,
      password_hash: seed.admin_password_hash.clone(),
    })
    .await?;
  tracing::info!(tenant = %tenant.slug, user = %admin.username, "bootstrap administrator created");
  Ok(())
}

/// Run the due-schedule sweep across every tenant every `every`.
pub fn spawn_schedule_sweep<S>(store: Arc<S>, every: Duration) -> JoinHandle<()>
where
  S: ToolboxStore + 'static,
{
  tokio::spawn(async move {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
      ticker.tick().await;
      let today = Utc::now().date_naive();
      if let Err(e) = store.process_due_schedules(None, today).await {
        tracing::error!(error = %e, "schedule sweep failed");
      }
    }
  })
}

// ─── Integration tests ────────────────────────────────────────────────────────
