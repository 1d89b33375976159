//! Problems collected during a build pass.

use std::path::PathBuf;

use lattice_graph::GraphWarning;

use crate::materializer::MaterializeError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

/// A problem found while loading content or materializing artifacts.
///
/// Diagnostics are collected over the whole pass and reported together, so one
/// bad file never hides the others.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    #[error("Failed to read {}: {message}", .path.display())]
    Read { path: PathBuf, message: String },

    #[error("Failed to write {}: {message}", .path.display())]
    Write { path: PathBuf, message: String },

    /// The file is excluded from the graph.
    #[error("Malformed frontmatter in {}: {message}", .path.display())]
    MalformedFrontmatter { path: PathBuf, message: String },

    #[error(transparent)]
    Graph(#[from] GraphWarning),

    #[error(transparent)]
    Materialize(#[from] MaterializeError),
}

impl Diagnostic {
    pub fn severity(&self) -> Severity {
        match self {
            Self::Graph(_) => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity() == Severity::Error
    }

    /// Emit through `tracing` at the matching level.
    pub fn log(&self) {
        match self.severity() {
            Severity::Warning => tracing::warn!("{}", self),
            Severity::Error => tracing::error!("{}", self),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn duplicate_routes_are_warnings() {
        let diagnostic = Diagnostic::from(GraphWarning::DuplicateRoute {
            route: "/about".to_string(),
            replaced: Some(PathBuf::from("about/index.md")),
            by: Some(PathBuf::from("about.md")),
        });

        assert_eq!(diagnostic.severity(), Severity::Warning);
        assert!(!diagnostic.is_error());
        assert!(diagnostic.to_string().contains("/about"));
    }

    #[test]
    fn malformed_frontmatter_is_an_error() {
        let diagnostic = Diagnostic::MalformedFrontmatter {
            path: PathBuf::from("bad.md"),
            message: "unclosed".to_string(),
        };

        assert_eq!(diagnostic.severity(), Severity::Error);
    }
}
