//! Content discovery and graph loading.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rayon::prelude::*;
use walkdir::WalkDir;

use lattice_content::{
    fallback_title, parse_content, ContentRecord, PathRouteResolver, RouteResolver,
};
use lattice_graph::{CollectionRule, ContentGraph, GraphBuilder};

use crate::builder::BuildError;
use crate::diagnostics::Diagnostic;

/// Result of loading a content directory.
#[derive(Debug)]
pub struct LoadOutcome {
    /// The finished graph
    pub graph: ContentGraph,

    /// Number of content files discovered
    pub files: usize,

    /// Read errors, malformed frontmatter and duplicate routes
    pub diagnostics: Vec<Diagnostic>,
}

/// Loads a content directory into a [`ContentGraph`].
#[derive(Clone)]
pub struct ContentLoader {
    content_dir: PathBuf,
    extensions: Vec<String>,
    resolver: Arc<dyn RouteResolver>,
    rules: Vec<CollectionRule>,
}

impl ContentLoader {
    /// Create a loader for `content_dir` with default extensions (`md`, `mdx`)
    /// and path-derived routes.
    pub fn new(content_dir: impl Into<PathBuf>) -> Self {
        Self {
            content_dir: content_dir.into(),
            extensions: vec!["md".to_string(), "mdx".to_string()],
            resolver: Arc::new(PathRouteResolver),
            rules: Vec::new(),
        }
    }

    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn RouteResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_rules(mut self, rules: Vec<CollectionRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn content_dir(&self) -> &Path {
        &self.content_dir
    }

    /// Check whether `path` has one of the content extensions.
    pub fn is_content_file(&self, path: &Path) -> bool {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        self.extensions.iter().any(|e| e == ext)
    }

    /// Find every content file, sorted by path.
    ///
    /// Sorting makes last-write-wins on duplicate routes independent of
    /// directory iteration order.
    pub fn discover(&self) -> Result<Vec<PathBuf>, BuildError> {
        if !self.content_dir.exists() {
            return Err(BuildError::ReadError(format!(
                "Content directory not found: {}",
                self.content_dir.display()
            )));
        }

        let mut files: Vec<PathBuf> = WalkDir::new(&self.content_dir)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file() && self.is_content_file(e.path()))
            .map(|e| e.into_path())
            .collect();

        files.sort();
        Ok(files)
    }

    /// Parse one file into a record.
    pub fn parse_file(&self, path: &Path) -> Result<ContentRecord, Diagnostic> {
        let source = fs::read_to_string(path).map_err(|e| Diagnostic::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let parsed = parse_content(&source).map_err(|e| Diagnostic::MalformedFrontmatter {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let relative = path.strip_prefix(&self.content_dir).unwrap_or(path);
        let route = self.resolver.resolve(relative, parsed.frontmatter.as_ref());

        Ok(ContentRecord::from_parsed(&route, parsed, &fallback_title(relative)).with_source(path))
    }

    /// Discover, parse and build.
    ///
    /// Files are parsed in parallel; the graph is built only after every parse
    /// has finished, in path order. Files with malformed frontmatter are left
    /// out of the graph and reported.
    pub fn load(&self) -> Result<LoadOutcome, BuildError> {
        let files = self.discover()?;

        let parsed: Vec<Result<ContentRecord, Diagnostic>> =
            files.par_iter().map(|path| self.parse_file(path)).collect();

        let mut diagnostics = Vec::new();
        let mut builder = GraphBuilder::new().with_rules(self.rules.iter().cloned());

        for result in parsed {
            match result {
                Ok(record) => builder.push(record),
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }

        let (graph, warnings) = builder.build();
        diagnostics.extend(warnings.into_iter().map(Diagnostic::Graph));

        tracing::debug!(
            "Loaded {} records from {} files in {}",
            graph.len(),
            files.len(),
            self.content_dir.display()
        );

        Ok(LoadOutcome {
            graph,
            files: files.len(),
            diagnostics,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write(root: &Path, relative: &str, content: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    #[test]
    fn loads_records_with_routes_and_collections() {
        let temp = tempdir().unwrap();
        write(temp.path(), "index.md", "# Welcome");
        write(
            temp.path(),
            "blog/first.md",
            "---\ntitle: First\ncollections: [nav]\n---\nHello",
        );
        write(temp.path(), "notes.txt", "ignored");

        let outcome = ContentLoader::new(temp.path()).load().unwrap();

        assert_eq!(outcome.files, 2);
        assert!(outcome.diagnostics.is_empty());
        assert_eq!(outcome.graph.get("/").unwrap().title, "Welcome");
        let first = outcome.graph.get("/blog/first").unwrap();
        assert_eq!(first.title, "First");
        assert!(first.in_collection("nav"));
    }

    #[test]
    fn excludes_malformed_files_and_keeps_going() {
        let temp = tempdir().unwrap();
        write(temp.path(), "bad.md", "---\ntitle: [oops\n---\n");
        write(temp.path(), "good.md", "---\ntitle: Good\n---\n");

        let outcome = ContentLoader::new(temp.path()).load().unwrap();

        assert_eq!(outcome.graph.len(), 1);
        assert!(outcome.graph.get("/bad").is_none());
        assert!(outcome.graph.get("/good").is_some());
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(matches!(
            &outcome.diagnostics[0],
            Diagnostic::MalformedFrontmatter { path, .. } if path.ends_with("bad.md")
        ));
    }

    #[test]
    fn duplicate_routes_resolve_in_path_order() {
        let temp = tempdir().unwrap();
        // Paths compare by component, so about/index.md sorts before about.md
        write(temp.path(), "about/index.md", "---\ntitle: Nested\n---\n");
        write(temp.path(), "about.md", "---\ntitle: Flat\n---\n");

        let outcome = ContentLoader::new(temp.path()).load().unwrap();

        assert_eq!(outcome.graph.len(), 1);
        assert_eq!(outcome.graph.get("/about").unwrap().title, "Flat");
        assert_eq!(outcome.diagnostics.len(), 1);
        assert!(!outcome.diagnostics[0].is_error());
    }

    #[test]
    fn applies_configured_collection_rules() {
        let temp = tempdir().unwrap();
        write(temp.path(), "blog/a.md", "A");
        write(temp.path(), "about.md", "About");

        let outcome = ContentLoader::new(temp.path())
            .with_rules(vec![CollectionRule::new("posts", "/blog/")])
            .load()
            .unwrap();

        let posts: Vec<_> = outcome
            .graph
            .by_collection("posts")
            .iter()
            .map(|r| r.route.clone())
            .collect();
        assert_eq!(posts, vec!["/blog/a"]);
    }

    #[test]
    fn missing_content_dir_is_an_error() {
        let temp = tempdir().unwrap();

        let result = ContentLoader::new(temp.path().join("nope")).load();

        assert!(matches!(result, Err(BuildError::ReadError(_))));
    }
}
