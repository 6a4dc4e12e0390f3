//! Store traits and supporting types.
//!
//! Traits are implemented by storage backends (e.g. `fieldops-store-sqlite`).
//! Higher layers (`fieldops-api`, `fieldops-server`) depend on these
//! abstractions, not on any concrete backend.
//!
//! Every method that reads or writes tenant-owned data takes the caller's
//! `tenant_id`; a record owned by another tenant behaves as if it does not
//! exist. Every mutating method is atomic: its guard checks, mutations, and
//! side effects (stock movements, generated assignments) commit together or
//! not at all.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

mod directory;
mod identity;
mod proposal;
mod purchasing;
mod rams;
mod stock;
mod toolbox;

pub use directory::DirectoryStore;
pub use identity::IdentityStore;
pub use proposal::ProposalStore;
pub use purchasing::PurchasingStore;
pub use rams::RamsStore;
pub use stock::StockStore;
pub use toolbox::ToolboxStore;

use crate::Error;

/// Backend errors expose the business-rule failure they carry, if any, so
/// callers can tell "not found" or "invalid transition" apart from a broken
/// database.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  fn domain(&self) -> Option<&Error>;
}

/// The error type shared by every store trait of one backend.
pub trait StoreBase: Send + Sync {
  type Error: StoreError;
}

/// Everything the API needs from a backend.
pub trait Store:
  IdentityStore
  + DirectoryStore
  + StockStore
  + PurchasingStore
  + ProposalStore
  + RamsStore
  + ToolboxStore
{
}

impl<T> Store for T where
  T: IdentityStore
    + DirectoryStore
    + StockStore
    + PurchasingStore
    + ProposalStore
    + RamsStore
    + ToolboxStore
{
}
