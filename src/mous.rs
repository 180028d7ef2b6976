//! MOUS row type - one record per Member Observation Unit Set
//!
//! Rows are inserted by the ingestion pipeline with the split fields NULL;
//! the split step later fills them in through
//! [`MousStore::update_split_state`](crate::MousStore::update_split_state).

use serde::{Deserialize, Serialize};

/// A row of the `mous` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MousRecord {
    /// Unique MOUS identifier (primary key)
    pub mous_id: String,
    /// Archive URL the raw data is fetched from
    pub download_url: Option<String>,
    /// Expected number of ASDM datasets for this MOUS
    pub num_asdms: Option<i64>,
    /// Workflow state label ("pending", "done", "failed", ...)
    pub split_status: Option<String>,
    /// UTC instant of the last split-state update (ISO-8601)
    pub split_date: Option<String>,
    /// Product filenames written by the split step
    pub split_products: Vec<String>,
    /// Free-text diagnostic note from the last update
    pub split_notes: Option<String>,
}

/// Encode a product list for the `split_products` column.
///
/// An absent list is stored as the empty list, never as NULL.
pub fn encode_products(products: Option<&[String]>) -> serde_json::Result<String> {
    serde_json::to_string(products.unwrap_or(&[]))
}

/// Decode the `split_products` column into a product list.
///
/// NULL and blank text (rows the split step has not touched yet) read as the
/// empty list; anything else must be a JSON array of strings.
pub fn decode_products(raw: Option<&str>) -> serde_json::Result<Vec<String>> {
    match raw {
        None => Ok(Vec::new()),
        Some(text) if text.trim().is_empty() => Ok(Vec::new()),
        Some(text) => serde_json::from_str(text),
    }
}
