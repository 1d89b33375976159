//! Writing query results as static JSON artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;

use lattice_graph::{ContentEntry, ContentGraph, Query};

/// Errors for a single artifact. Other artifacts are unaffected.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MaterializeError {
    #[error("Failed to serialize {signature}: record {route}: {message}")]
    Serialization {
        signature: String,
        route: String,
        message: String,
    },

    #[error("Failed to write {} for {signature}: {message}", .path.display())]
    Write {
        signature: String,
        path: PathBuf,
        message: String,
    },
}

/// Outcome of a materialization pass.
#[derive(Debug, Default)]
pub struct MaterializeReport {
    /// Signature to artifact URL, for every artifact written
    pub artifacts: BTreeMap<String, String>,

    /// Per-query failures
    pub failures: Vec<MaterializeError>,
}

/// Serialize entries as a compact JSON array.
///
/// Each entry is encoded on its own so a failure names the offending record.
fn encode_entries(signature: &str, entries: &[ContentEntry]) -> Result<Vec<u8>, MaterializeError> {
    let mut out = Vec::with_capacity(entries.len() * 128 + 2);
    out.push(b'[');

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            out.push(b',');
        }
        let encoded = serde_json::to_vec(entry).map_err(|e| MaterializeError::Serialization {
            signature: signature.to_string(),
            route: entry.route.clone(),
            message: e.to_string(),
        })?;
        out.extend_from_slice(&encoded);
    }

    out.push(b']');
    Ok(out)
}

/// Artifact bytes for `query` against `graph`.
///
/// The dev server serves these bytes live, so they must match what a build
/// writes for the same graph.
pub fn encode_query(graph: &ContentGraph, query: &Query) -> Result<Vec<u8>, MaterializeError> {
    encode_entries(&query.signature(), &graph.execute(query))
}

/// `graph.json`: every record plus the collection index.
pub fn encode_graph(graph: &ContentGraph) -> Result<Vec<u8>, MaterializeError> {
    let document = graph.to_document();

    let records = encode_entries("graph", &document.records)?;
    let collections =
        serde_json::to_vec(&document.collections).map_err(|e| MaterializeError::Serialization {
            signature: "graph".to_string(),
            route: String::new(),
            message: e.to_string(),
        })?;

    let mut out = Vec::with_capacity(records.len() + collections.len() + 32);
    out.extend_from_slice(br#"{"records":"#);
    out.extend_from_slice(&records);
    out.extend_from_slice(br#","collections":"#);
    out.extend_from_slice(&collections);
    out.push(b'}');
    Ok(out)
}

/// Writes one artifact per distinct query.
///
/// Borrowing a finished [`ContentGraph`] means only complete graphs can be
/// materialized.
pub struct Materializer<'g> {
    graph: &'g ContentGraph,
    output_dir: PathBuf,
    base_url: String,
}

impl<'g> Materializer<'g> {
    pub fn new(graph: &'g ContentGraph, output_dir: impl Into<PathBuf>, base_url: &str) -> Self {
        Self {
            graph,
            output_dir: output_dir.into(),
            base_url: base_url.to_string(),
        }
    }

    /// Materialize every distinct query in `queries`.
    ///
    /// Queries are deduplicated by signature. A failing query is reported in the
    /// returned report and does not stop the others.
    pub fn materialize<'q>(&self, queries: impl IntoIterator<Item = &'q Query>) -> MaterializeReport {
        let distinct: BTreeMap<String, &Query> = queries
            .into_iter()
            .map(|q| (q.signature(), q))
            .collect();

        let results: Vec<(String, Result<String, MaterializeError>)> = distinct
            .into_par_iter()
            .map(|(signature, query)| {
                let result = self.write_artifact(query);
                (signature, result)
            })
            .collect();

        let mut report = MaterializeReport::default();
        for (signature, result) in results {
            match result {
                Ok(url) => {
                    report.artifacts.insert(signature, url);
                }
                Err(e) => report.failures.push(e),
            }
        }

        report
    }

    fn write_artifact(&self, query: &Query) -> Result<String, MaterializeError> {
        let bytes = encode_query(self.graph, query)?;
        let path = self.output_dir.join(query.artifact_path());

        write_file(&path, &bytes).map_err(|message| MaterializeError::Write {
            signature: query.signature(),
            path: path.clone(),
            message,
        })?;

        tracing::debug!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(query.artifact_url(&self.base_url))
    }
}

/// Write a file, creating parent directories.
pub(crate) fn write_file(path: &Path, contents: &[u8]) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| e.to_string())?;
    }
    fs::write(path, contents).map_err(|e| e.to_string())
}
