//! Target row type - science targets observed within a MOUS

use serde::{Deserialize, Serialize};

/// A row of the `targets` table.
///
/// A MOUS usually carries several targets, and the same source can appear
/// once per execution, so names are not unique within a MOUS.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetRecord {
    /// Owning MOUS (references `mous.mous_id`)
    pub mous_id: String,
    /// Astronomical source name as recorded by the archive
    pub alma_source_name: String,
    /// Identifier of the raw ASDM the target was observed in, when known
    pub asdm_uid: Option<String>,
}
