//! Error types for `fieldops-core`.

use thiserror::Error;
use uuid::Uuid;

/// A business-rule failure. Storage backends wrap these so the HTTP layer can
/// map them to a status code without knowing the backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
  #[error("{entity} not found: {id}")]
  NotFound { entity: &'static str, id: Uuid },

  #[error("validation failed: {0}")]
  Validation(String),

  #[error("cannot {action} {entity} in status {from}")]
  InvalidTransition {
    entity: &'static str,
    from:   String,
    action: &'static str,
  },

  #[error(
    "insufficient stock for product {product_id}: requested {requested}, available {available}"
  )]
  InsufficientStock {
    product_id: Uuid,
    requested:  i64,
    available:  i64,
  },

  #[error("conflict: {0}")]
  Conflict(String),
}

impl Error {
  pub fn validation(message: impl Into<String>) -> Self {
    Self::Validation(message.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
