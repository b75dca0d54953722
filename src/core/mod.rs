//! Core record types, error taxonomy, and the authorization session state.
//!
//! This module provides the foundational types shared by the extractor and
//! the ledger engine: the normalized per-invoice record, the three error
//! families of the pipeline, and the explicit OAuth session value consumed
//! by front-ends as a gate.

mod auth;
mod error;
mod types;

pub use auth::*;
pub use error::*;
pub use types::*;
