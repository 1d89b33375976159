//! Content graph, query engine and artifact addressing.
//!
//! A [`ContentGraph`] is an immutable, indexed snapshot of every content record
//! of one build (or one dev-server reload). Queries are pure reads against a
//! snapshot, and a [`GraphHandle`] swaps snapshots atomically so in-flight
//! readers never see a graph under construction.

pub mod entry;
pub mod graph;
pub mod handle;
pub mod query;

pub use entry::{ContentEntry, GraphDocument};
pub use graph::{CollectionRule, ContentGraph, GraphBuilder, GraphWarning};
pub use handle::GraphHandle;
pub use query::{normalize_prefix, Query, QueryParseError, ARTIFACT_DIR};
