//! iv-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other iv-* crates,
//! providing the unified error type, typed record identifiers, application
//! configuration, and helpers for working with schemaless JSON documents.

pub mod config;
pub mod document;
pub mod error;
pub mod ids;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, Result};
pub use ids::*;
