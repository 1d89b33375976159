//! Query shapes, signatures and artifact addressing.

use std::fmt;
use std::str::FromStr;

use lattice_content::normalize_route;
use xxhash_rust::xxh3::xxh3_64;

/// Directory (relative to the build output) holding materialized artifacts.
pub const ARTIFACT_DIR: &str = "_content";

/// A query against a content graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Query {
    /// Every record
    All,
    /// Records whose route lies under a prefix
    RoutePrefix(String),
    /// Records that are members of a collection
    Collection(String),
}

/// Errors from parsing a query signature.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum QueryParseError {
    #[error("Unknown query shape in '{0}' (expected all, route-prefix:<prefix> or collection:<name>)")]
    UnknownShape(String),

    #[error("Collection query requires a name")]
    EmptyCollection,
}

impl Query {
    pub fn route_prefix(prefix: impl Into<String>) -> Self {
        Self::RoutePrefix(prefix.into())
    }

    pub fn collection(name: impl Into<String>) -> Self {
        Self::Collection(name.into())
    }

    /// Shape name used in signatures and artifact file names.
    pub fn shape(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::RoutePrefix(_) => "route-prefix",
            Self::Collection(_) => "collection",
        }
    }

    /// Canonical signature.
    ///
    /// Equivalent prefixes (`/blog`, `/blog/`, `blog`) share one signature.
    pub fn signature(&self) -> String {
        match self {
            Self::All => "all".to_string(),
            Self::RoutePrefix(prefix) => format!("route-prefix:{}", normalize_prefix(prefix)),
            Self::Collection(name) => format!("collection:{}", name),
        }
    }

    /// Parse a signature produced by [`Query::signature`].
    pub fn parse_signature(signature: &str) -> Result<Self, QueryParseError> {
        let signature = signature.trim();

        if signature == "all" {
            return Ok(Self::All);
        }
        if let Some(prefix) = signature.strip_prefix("route-prefix:") {
            return Ok(Self::RoutePrefix(normalize_prefix(prefix)));
        }
        if let Some(name) = signature.strip_prefix("collection:") {
            if name.is_empty() {
                return Err(QueryParseError::EmptyCollection);
            }
            return Ok(Self::Collection(name.to_string()));
        }

        Err(QueryParseError::UnknownShape(signature.to_string()))
    }

    /// Artifact path relative to the build output, e.g.
    /// `_content/collection-5c1d0e9ab4f2a7e3.json`.
    pub fn artifact_path(&self) -> String {
        format!("{}/{}", ARTIFACT_DIR, self.artifact_file_name())
    }

    /// Artifact file name (the last component of [`Query::artifact_path`]).
    pub fn artifact_file_name(&self) -> String {
        let hash = xxh3_64(self.signature().as_bytes());
        format!("{}-{:016x}.json", self.shape(), hash)
    }

    /// URL of the artifact under `base_url`.
    pub fn artifact_url(&self, base_url: &str) -> String {
        format!("{}/{}", base_url.trim_end_matches('/'), self.artifact_path())
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.signature())
    }
}

impl FromStr for Query {
    type Err = QueryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_signature(s)
    }
}

/// Normalize a route prefix to segment form: leading `/` and a trailing `/`.
///
/// The root prefix (`""` or `/`) normalizes to `/` and matches every route.
pub fn normalize_prefix(prefix: &str) -> String {
    let base = normalize_route(prefix);
    if base == "/" {
        base
    } else {
        format!("{}/", base)
    }
}

/// Path-segment aware prefix test.
///
/// `/blog` and `/blog/` both match `/blog` and `/blog/post`, never `/blog-archive`.
#[derive(Debug, Clone)]
pub(crate) struct PrefixMatcher {
    /// Normalized prefix without the trailing separator; empty for the root
    base: String,
    /// `base` followed by the separator
    with_separator: String,
}

impl PrefixMatcher {
    pub(crate) fn new(prefix: &str) -> Self {
        let with_separator = normalize_prefix(prefix);
        let base = with_separator.trim_end_matches('/').to_string();
        Self {
            base,
            with_separator,
        }
    }

    pub(crate) fn matches(&self, route: &str) -> bool {
        if self.base.is_empty() {
            return true;
        }
        route.trim_end_matches('/') == self.base || route.starts_with(&self.with_separator)
    }
}
