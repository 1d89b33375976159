//! Finding and rewriting content query call sites.
//!
//! Site source code queries content with calls such as
//! `content.byCollection("nav")`. A build materializes each distinct query and
//! rewrites the call to `content.fetch("<artifact url>")`, so the running site
//! loads precomputed JSON instead of needing the graph.

use std::fs;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use lattice_graph::Query;

use crate::diagnostics::Diagnostic;

/// File extensions scanned for call sites.
pub const SITE_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "ts", "jsx", "tsx", "html", "md", "mdx"];

static CALL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bcontent\s*\.\s*(all|byRoutePrefix|byCollection)\s*\(\s*(?:"([^"\\\n]*)"|'([^'\\\n]*)')?\s*\)"#,
    )
    .expect("call pattern is valid")
});

/// One query call found in site source.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySite {
    /// The query the call performs
    pub query: Query,

    /// Line of the call (1-indexed)
    pub line: usize,

    /// Byte range of the call expression
    pub span: Range<usize>,
}

/// Find every well-formed query call in `source`.
///
/// `all` takes no argument; the other shapes take one string literal. Calls with
/// a non-literal argument can't be materialized and are skipped.
pub fn scan_source(source: &str) -> Vec<QuerySite> {
    CALL_PATTERN
        .captures_iter(source)
        .filter_map(|caps| {
            let call = caps.get(0)?;
            let argument = caps.get(2).or_else(|| caps.get(3)).map(|m| m.as_str());

            let query = match (&caps[1], argument) {
                ("all", None) => Query::All,
                ("byRoutePrefix", Some(prefix)) => Query::route_prefix(prefix),
                ("byCollection", Some(name)) if !name.is_empty() => Query::collection(name),
                _ => return None,
            };

            Some(QuerySite {
                query,
                line: source[..call.start()].matches('\n').count() + 1,
                span: call.range(),
            })
        })
        .collect()
}

/// Replace each site in `source` with a fetch of its artifact.
///
/// `sites` must come from [`scan_source`] on the same text.
pub fn rewrite_source(source: &str, sites: &[QuerySite], base_url: &str) -> String {
    let mut output = String::with_capacity(source.len());
    let mut cursor = 0;

    for site in sites {
        output.push_str(&source[cursor..site.span.start]);
        // JSON string syntax is valid JS, so the URL is escaped either way
        let literal = serde_json::Value::String(site.query.artifact_url(base_url));
        output.push_str(&format!("content.fetch({})", literal));
        cursor = site.span.end;
    }

    output.push_str(&source[cursor..]);
    output
}

/// A source file containing at least one query call.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    /// Path relative to its source root
    pub relative_path: PathBuf,

    /// Original text
    pub source: String,

    /// Calls in source order
    pub sites: Vec<QuerySite>,
}

/// Walks site source directories for query calls.
#[derive(Debug, Clone)]
pub struct SiteScanner {
    roots: Vec<PathBuf>,
}

impl SiteScanner {
    pub fn new(roots: Vec<PathBuf>) -> Self {
        Self { roots }
    }

    /// Scan every root. Missing roots are skipped with a warning.
    ///
    /// Returns the files that contain calls (sorted by path) and any read errors.
    pub fn scan(&self) -> (Vec<ScannedFile>, Vec<Diagnostic>) {
        let mut files = Vec::new();
        let mut diagnostics = Vec::new();

        for root in &self.roots {
            if !root.exists() {
                tracing::warn!("Source directory not found: {}", root.display());
                continue;
            }

            let mut paths: Vec<PathBuf> = WalkDir::new(root)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_site_file(e.path()))
                .map(|e| e.into_path())
                .collect();
            paths.sort();

            for path in paths {
                let source = match fs::read_to_string(&path) {
                    Ok(source) => source,
                    Err(e) => {
                        diagnostics.push(Diagnostic::Read {
                            path,
                            message: e.to_string(),
                        });
                        continue;
                    }
                };

                let sites = scan_source(&source);
                if sites.is_empty() {
                    continue;
                }

                let relative_path = path.strip_prefix(root).unwrap_or(&path).to_path_buf();
                files.push(ScannedFile {
                    relative_path,
                    source,
                    sites,
                });
            }
        }

        (files, diagnostics)
    }
}

/// Check whether `path` has one of the [`SITE_EXTENSIONS`].
pub fn is_site_file(path: &Path) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    SITE_EXTENSIONS.contains(&ext)
}
