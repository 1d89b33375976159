//! Static data extraction for lattice sites.
//!
//! Loads every content file into a graph, finds the content queries a site's
//! source code makes, writes one JSON artifact per distinct query and rewrites
//! each call site to fetch its artifact.

pub mod builder;
pub mod diagnostics;
pub mod loader;
pub mod materializer;
pub mod sites;

pub use builder::{BuildConfig, BuildError, BuildResult, StaticBuilder};
pub use diagnostics::{Diagnostic, Severity};
pub use loader::{ContentLoader, LoadOutcome};
pub use materializer::{encode_graph, encode_query, MaterializeError, MaterializeReport, Materializer};
pub use sites::{
    is_site_file, rewrite_source, scan_source, QuerySite, ScannedFile, SiteScanner, SITE_EXTENSIONS,
};
