//! Bearer-token authentication: the request extractor, token issuing, and
//! the `/auth` handlers.
//!
//! Tokens are 32 random bytes, base64url encoded. Only their SHA-256 digest
//! is stored.

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Json,
  extract::{FromRequestParts, State},
  http::{HeaderMap, StatusCode, header, request::Parts},
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use fieldops_core::{
  store::Store,
  tenancy::{CurrentUser, Permission, User},
};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{ApiState, error::ApiError};

// ─── Tokens & passwords ──────────────────────────────────────────────────────

pub fn generate_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// The form a token is stored and looked up in.
pub fn hash_token(token: &str) -> String {
  hex::encode(Sha256::digest(token.as_bytes()))
}

/// Hash `password` into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
  let salt = SaltString::generate(&mut OsRng);
  Ok(
    Argon2::default()
      .hash_password(password.as_bytes(), &salt)?
      .to_string(),
  )
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  PasswordHash::new(phc).is_ok_and(|parsed| {
    Argon2::default()
      .verify_password(password.as_bytes(), &parsed)
      .is_ok()
  })
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)?
    .to_str()
    .ok()?
    .strip_prefix("Bearer ")
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The authenticated caller. Present in a handler means the request carried
/// a live token.
pub struct Authenticated {
  pub user:   CurrentUser,
  token_hash: String,
}

impl Authenticated {
  /// The caller, if their role grants `permission`.
  pub fn require(&self, permission: Permission) -> Result<&CurrentUser, ApiError> {
    if self.user.can(permission) {
      Ok(&self.user)
    } else {
      tracing::debug!(
        user = %self.user.username,
        %permission,
        "permission denied"
      );
      Err(ApiError::Forbidden(permission))
    }
  }
}

impl<S: Store> FromRequestParts<ApiState<S>> for Authenticated {
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &ApiState<S>,
  ) -> Result<Self, Self::Rejection> {
    let token = bearer_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
    let token_hash = hash_token(token);
    let user = state
      .store
      .resolve_token(token_hash.clone(), Utc::now())
      .await?
      .ok_or_else(|| {
        tracing::debug!("unknown, expired, or revoked token");
        ApiError::Unauthorized
      })?;
    Ok(Self { user, token_hash })
  }
}

// ─── Handlers ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  /// Tenant slug.
  pub tenant:   String,
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
  pub token:      String,
  pub expires_at: DateTime<Utc>,
  pub user:       User,
}

/// `POST /auth/token`
pub async fn login<S: Store>(
  State(state): State<ApiState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<TokenResponse>, ApiError> {
  let LoginBody { tenant, username, password } = body;

  let creds = state
    .store
    .find_credentials(tenant.clone(), username.clone())
    .await?
    .filter(|c| c.user.is_active);
  let Some(creds) = creds else {
    tracing::debug!(%tenant, %username, "login for unknown or inactive user");
    return Err(ApiError::Unauthorized);
  };

  let phc = creds.password_hash.clone();
  let verified =
    tokio::task::spawn_blocking(move || verify_password(&password, &phc))
      .await
      .map_err(|e| ApiError::Internal(Box::new(e)))?;
  if !verified {
    tracing::debug!(%tenant, %username, "login with wrong password");
    return Err(ApiError::Unauthorized);
  }

  let token = generate_token();
  let expires_at = Utc::now() + state.token_ttl;
  state
    .store
    .store_token(creds.user.id, hash_token(&token), expires_at)
    .await?;

  tracing::info!(%tenant, %username, "token issued");
  Ok(Json(TokenResponse { token, expires_at, user: creds.user }))
}

/// `POST /auth/logout` revokes the presented token.
pub async fn logout<S: Store>(
  State(state): State<ApiState<S>>,
  auth: Authenticated,
) -> Result<StatusCode, ApiError> {
  state.store.revoke_token(auth.token_hash).await?;
  Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Serialize)]
pub struct Me {
  #[serde(flatten)]
  pub user:        CurrentUser,
  pub permissions: Vec<Permission>,
}

/// `GET /auth/me`
pub async fn me(auth: Authenticated) -> Json<Me> {
  let permissions = auth.user.role.permissions();
  Json(Me { user: auth.user, permissions })
}
