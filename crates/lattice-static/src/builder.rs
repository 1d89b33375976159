//! Static build orchestration.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use lattice_content::{PathRouteResolver, RouteResolver};
use lattice_graph::{CollectionRule, Query, ARTIFACT_DIR};

use crate::diagnostics::Diagnostic;
use crate::loader::ContentLoader;
use crate::materializer::{encode_graph, write_file, Materializer};
use crate::sites::{rewrite_source, SiteScanner};

/// Configuration for a static build.
#[derive(Debug, Clone)]
pub struct BuildConfig {
    /// Content root directory
    pub content_dir: PathBuf,

    /// Content file extensions
    pub extensions: Vec<String>,

    /// Site source directories scanned for query calls
    pub source_dirs: Vec<PathBuf>,

    /// Output directory
    pub output_dir: PathBuf,

    /// Base URL for the site
    pub base_url: String,

    /// Declared collection membership rules
    pub collections: Vec<CollectionRule>,

    /// Queries materialized whether or not a call site uses them
    pub queries: Vec<Query>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            content_dir: PathBuf::from("content"),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            source_dirs: vec![PathBuf::from("src")],
            output_dir: PathBuf::from("dist"),
            base_url: "/".to_string(),
            collections: vec![],
            queries: vec![],
        }
    }
}

impl BuildConfig {
    /// The content loader this configuration describes.
    pub fn loader(&self) -> ContentLoader {
        ContentLoader::new(&self.content_dir)
            .with_extensions(self.extensions.clone())
            .with_rules(self.collections.clone())
    }

    /// The call-site scanner this configuration describes.
    pub fn scanner(&self) -> SiteScanner {
        SiteScanner::new(self.source_dirs.clone())
    }
}

/// Result of a build operation.
#[derive(Debug)]
pub struct BuildResult {
    /// Number of records in the graph
    pub records: usize,

    /// Number of artifacts written
    pub artifacts: usize,

    /// Number of source files rewritten
    pub rewritten: usize,

    /// Signature to artifact URL
    pub manifest: BTreeMap<String, String>,

    /// Everything that went wrong, in pass order
    pub diagnostics: Vec<Diagnostic>,

    /// Total build time in milliseconds
    pub duration_ms: u64,

    /// Output directory
    pub output_dir: PathBuf,
}

impl BuildResult {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics.iter().filter(|d| d.is_error()).count()
    }
}

/// Errors that abort a build.
///
/// Per-file and per-artifact problems are not errors here; they are collected
/// as [`Diagnostic`]s in the [`BuildResult`].
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Failed to read content: {0}")]
    ReadError(String),

    #[error("Failed to write output: {0}")]
    WriteError(String),
}

/// Static site builder.
pub struct StaticBuilder {
    config: BuildConfig,
    resolver: Arc<dyn RouteResolver>,
}

impl StaticBuilder {
    /// Create a new static builder with path-derived routes.
    pub fn new(config: BuildConfig) -> Self {
        Self {
            config,
            resolver: Arc::new(PathRouteResolver),
        }
    }

    /// Use a custom route resolver.
    pub fn with_resolver(mut self, resolver: Arc<dyn RouteResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Build the site's content artifacts.
    ///
    /// The graph is loaded completely before the previous artifacts are cleared
    /// or anything is materialized. Parse,
    /// serialization and per-file write problems are collected and returned
    /// together; only an unreadable content root or unwritable output aborts.
    pub fn build(&self) -> Result<BuildResult, BuildError> {
        let start = Instant::now();

        // Load the full graph first; a failed load leaves the last output alone
        let outcome = self
            .config
            .loader()
            .with_resolver(Arc::clone(&self.resolver))
            .load()?;
        let graph = outcome.graph;
        let mut diagnostics = outcome.diagnostics;

        tracing::info!(
            "Loaded {} records from {} files",
            graph.len(),
            outcome.files
        );

        let artifact_dir = self.config.output_dir.join(ARTIFACT_DIR);
        if artifact_dir.exists() {
            fs::remove_dir_all(&artifact_dir)
                .map_err(|e| BuildError::WriteError(format!("{}: {}", artifact_dir.display(), e)))?;
        }
        fs::create_dir_all(&artifact_dir)
            .map_err(|e| BuildError::WriteError(format!("{}: {}", artifact_dir.display(), e)))?;

        // Find query call sites
        let (files, scan_diagnostics) = self.config.scanner().scan();
        diagnostics.extend(scan_diagnostics);

        let queries: Vec<&Query> = files
            .iter()
            .flat_map(|f| f.sites.iter().map(|s| &s.query))
            .chain(self.config.queries.iter())
            .collect();

        // Materialize
        let report = Materializer::new(&graph, &self.config.output_dir, &self.config.base_url)
            .materialize(queries);
        diagnostics.extend(report.failures.into_iter().map(Diagnostic::Materialize));

        // Rewrite call sites
        let mut rewritten = 0;
        for file in &files {
            let output = rewrite_source(&file.source, &file.sites, &self.config.base_url);
            let path = self.config.output_dir.join(&file.relative_path);
            match write_file(&path, output.as_bytes()) {
                Ok(()) => rewritten += 1,
                Err(message) => diagnostics.push(Diagnostic::Write { path, message }),
            }
        }

        // Manifest and graph document
        let manifest_json = serde_json::to_vec_pretty(&report.artifacts)
            .map_err(|e| BuildError::WriteError(e.to_string()))?;
        write_file(&artifact_dir.join("manifest.json"), &manifest_json)
            .map_err(BuildError::WriteError)?;

        match encode_graph(&graph) {
            Ok(bytes) => write_file(&artifact_dir.join("graph.json"), &bytes)
                .map_err(BuildError::WriteError)?,
            Err(e) => diagnostics.push(Diagnostic::Materialize(e)),
        }

        for diagnostic in &diagnostics {
            diagnostic.log();
        }

        let duration = start.elapsed();

        Ok(BuildResult {
            records: graph.len(),
            artifacts: report.artifacts.len(),
            rewritten,
            manifest: report.artifacts,
            diagnostics,
            duration_ms: duration.as_millis() as u64,
            output_dir: self.config.output_dir.clone(),
        })
    }
}
