//! Serialized shapes of query results.

use std::collections::BTreeMap;

use lattice_content::{ContentRecord, Value};
use serde::{Deserialize, Serialize};

/// One element of a query result, as returned by every content source.
///
/// This is the artifact wire shape: field order is fixed and `data` is a sorted
/// map, so serialization is byte-stable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentEntry {
    pub route: String,
    pub title: String,
    #[serde(default)]
    pub data: BTreeMap<String, Value>,
    #[serde(default)]
    pub collections: Vec<String>,
}

impl From<&ContentRecord> for ContentEntry {
    fn from(record: &ContentRecord) -> Self {
        Self {
            route: record.route.clone(),
            title: record.title.clone(),
            data: record.data.clone(),
            // BTreeSet iteration is already sorted
            collections: record.collections.iter().cloned().collect(),
        }
    }
}

/// The whole graph as written to `graph.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    /// Every record in graph order
    pub records: Vec<ContentEntry>,

    /// Collection name to member routes, in graph order
    pub collections: BTreeMap<String, Vec<String>>,
}
