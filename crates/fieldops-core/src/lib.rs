//! Core types and trait definitions for the FieldOps operations backend.
//!
//! This crate is deliberately free of HTTP and database dependencies. It holds
//! the domain records, the pure workflow rules (status transitions, recurrence
//! arithmetic, totals, risk scoring), the permission model, and the store
//! traits that backends implement.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod common;
pub mod directory;
pub mod error;
pub mod proposal;
pub mod purchasing;
pub mod rams;
pub mod stock;
pub mod store;
pub mod tenancy;
pub mod toolbox;

pub use error::{Error, Result};
