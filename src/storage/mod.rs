//! Storage Layer - SQLite-backed persistence
//!
//! System of record is a SQLite database maintained by the ingestion
//! pipeline, with tables:
//! - mous(mous_id, download_url, num_asdms, split_status, split_date, split_products, split_notes)
//! - targets(mous_id, alma_source_name, asdm_uid)
//!
//! The schema pre-exists; this layer never creates or migrates it.

pub mod sqlite;

pub use sqlite::{DbStats, MousStore};
