//! # Alma-ops - MOUS processing state store
//!
//! Data-access layer over the SQLite database tracking ALMA MOUS
//! (Member Observation Unit Set) split processing.
//!
//! Alma-ops provides:
//! - A synchronous SQLite-backed store with one connection per caller
//! - Typed row structs for the `mous` and `targets` tables
//! - A scoped transaction block guarding the split-state update
//! - TOML configuration for locating the database file
//!
//! The schema is created and populated by the ingestion pipeline; this crate
//! only reads it and advances the split-related fields.

pub mod config;
pub mod mous;
pub mod storage;
pub mod target;

// Re-exports for convenient access
pub use mous::MousRecord;
pub use storage::{DbStats, MousStore};
pub use target::TargetRecord;

/// Result type alias for alma-ops operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for alma-ops operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Cannot open database at {path}: {source}")]
    Connection {
        path: String,
        source: rusqlite::Error,
    },

    #[error("Query error: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("Product list encoding error: {0}")]
    Encode(#[from] serde_json::Error),
}
