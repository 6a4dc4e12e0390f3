//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use fieldops_core::{Error as DomainError, store::StoreError, tenancy::Permission};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("authentication required")]
  Unauthorized,

  #[error("missing permission {0}")]
  Forbidden(Permission),

  #[error("{0}")]
  NotFound(String),

  #[error("{0}")]
  BadRequest(String),

  #[error("{0}")]
  Conflict(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn domain(err: &DomainError) -> Self {
    let message = err.to_string();
    match err {
      DomainError::NotFound { .. } => Self::NotFound(message),
      DomainError::Validation(_)
      | DomainError::InvalidTransition { .. }
      | DomainError::InsufficientStock { .. } => Self::BadRequest(message),
      DomainError::Conflict(_) => Self::Conflict(message),
    }
  }
}

/// Store failures are classified by the business-rule error they carry;
/// anything else is an internal error.
impl<E: StoreError> From<E> for ApiError {
  fn from(err: E) -> Self {
    match err.domain() {
      Some(domain) => Self::domain(domain),
      None => Self::Internal(Box::new(err)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };
    let message = match &self {
      ApiError::Internal(_) => "internal server error".to_string(),
      other => other.to_string(),
    };

    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn status(err: DomainError) -> StatusCode {
    ApiError::domain(&err).into_response().status()
  }

  #[test]
  fn domain_errors_map_to_statuses() {
    let id = Uuid::new_v4();
    assert_eq!(
      status(DomainError::NotFound { entity: "site", id }),
      StatusCode::NOT_FOUND
    );
    assert_eq!(status(DomainError::validation("bad")), StatusCode::BAD_REQUEST);
    assert_eq!(
      status(DomainError::InvalidTransition {
        entity: "stock order",
        from:   "draft".into(),
        action: "collect",
      }),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(
      status(DomainError::InsufficientStock {
        product_id: id,
        requested:  5,
        available:  2,
      }),
      StatusCode::BAD_REQUEST
    );
    assert_eq!(status(DomainError::Conflict("sku".into())), StatusCode::CONFLICT);
  }

  #[test]
  fn unauthorized_carries_bearer_challenge() {
    let res = ApiError::Unauthorized.into_response();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(res.headers()[header::WWW_AUTHENTICATE], "Bearer");
  }

  #[test]
  fn forbidden_names_the_policy() {
    let err = ApiError::Forbidden(Permission::StockApprove);
    assert_eq!(err.to_string(), "missing permission StockManagement.Approve");
    assert_eq!(err.into_response().status(), StatusCode::FORBIDDEN);
  }
}
