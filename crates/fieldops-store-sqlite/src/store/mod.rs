//! [`SqliteStore`], the SQLite implementation of the FieldOps store traits.
//!
//! Each trait lives in its own submodule. Reads go through [`SqliteStore::read`];
//! every mutation goes through [`SqliteStore::write`], which wraps the work in
//! a single SQLite transaction and rolls it back on any error.

mod directory;
mod identity;
mod proposal;
mod purchasing;
mod query;
mod rams;
mod stock;
mod stock_orders;
mod toolbox;

use std::path::Path;

use fieldops_core::store::StoreBase;
use rusqlite::{Connection, ErrorCode, Transaction};

use crate::{Error, Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A FieldOps store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection handle is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store; useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a read-only closure on the connection thread.
  async fn read<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
  {
    self
      .conn
      .call(move |conn| Ok(f(conn)?))
      .await
      .map_err(classify)
  }

  /// Run `f` inside one transaction. The transaction commits only when `f`
  /// returns `Ok`; a business-rule failure rolls back and surfaces as
  /// [`Error::Core`].
  async fn write<T, F>(&self, f: F) -> Result<T>
  where
    F: FnOnce(&Transaction<'_>) -> Result<T, TxError> + Send + 'static,
    T: Send + 'static,
  {
    let outcome = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        match f(&tx) {
          Ok(value) => {
            tx.commit()?;
            Ok(Ok(value))
          }
          Err(TxError::Domain(e)) => Ok(Err(e)),
          Err(TxError::Sql(e)) => Err(e.into()),
        }
      })
      .await
      .map_err(classify)?;
    outcome.map_err(Error::Core)
  }
}

impl StoreBase for SqliteStore {
  type Error = Error;
}

// ─── Transaction errors ──────────────────────────────────────────────────────

/// The error type of closures run by [`SqliteStore::write`].
#[derive(Debug)]
pub(crate) enum TxError {
  Sql(rusqlite::Error),
  Domain(fieldops_core::Error),
}

impl From<rusqlite::Error> for TxError {
  fn from(e: rusqlite::Error) -> Self { Self::Sql(e) }
}

impl From<fieldops_core::Error> for TxError {
  fn from(e: fieldops_core::Error) -> Self { Self::Domain(e) }
}

/// Unique and check constraint violations are reported as conflicts; all
/// other database failures pass through unchanged.
fn classify(err: tokio_rusqlite::Error) -> Error {
  if let tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
    ref failure,
    ref message,
  )) = err
    && failure.code == ErrorCode::ConstraintViolation
  {
    let message = message
      .clone()
      .unwrap_or_else(|| "constraint violation".to_string());
    tracing::debug!(%message, "constraint violation");
    return Error::Core(fieldops_core::Error::Conflict(message));
  }
  Error::Database(err)
}
