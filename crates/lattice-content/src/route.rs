//! Route resolution for content files.

use std::path::{Component, Path};

use crate::frontmatter::Frontmatter;

/// Assigns the canonical route of a content file.
pub trait RouteResolver: Send + Sync {
    /// Resolve the route for a file at `relative` (relative to the content root).
    fn resolve(&self, relative: &Path, frontmatter: Option<&Frontmatter>) -> String;
}

/// Derives routes from the file layout.
///
/// - `index.md` -> `/`
/// - `blog/index.md` -> `/blog`
/// - `blog/first-post.md` -> `/blog/first-post`
///
/// A `route` or `slug` frontmatter key overrides the derived route.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathRouteResolver;

impl RouteResolver for PathRouteResolver {
    fn resolve(&self, relative: &Path, frontmatter: Option<&Frontmatter>) -> String {
        if let Some(fm) = frontmatter {
            if let Some(route) = fm.get_str("route").or_else(|| fm.get_str("slug")) {
                return normalize_route(route);
            }
        }

        let mut segments: Vec<String> = relative
            .parent()
            .unwrap_or(Path::new(""))
            .components()
            .filter_map(|c| match c {
                Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
                _ => None,
            })
            .collect();

        let stem = relative
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("index");

        if stem != "index" {
            segments.push(stem.to_string());
        }

        normalize_route(&segments.join("/"))
    }
}

/// Canonical route form: leading `/`, no trailing `/` (except the root),
/// no empty segments.
pub fn normalize_route(route: &str) -> String {
    let segments: Vec<&str> = route.split('/').filter(|s| !s.is_empty()).collect();
    format!("/{}", segments.join("/"))
}

/// Title used when a file has neither a `title` key nor a top-level heading.
///
/// The file stem, or the directory name for `index` files (`Home` at the root).
pub fn fallback_title(relative: &Path) -> String {
    let stem = relative
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("");

    if stem != "index" && !stem.is_empty() {
        return stem.to_string();
    }

    relative
        .parent()
        .and_then(|p| p.file_name())
        .and_then(|s| s.to_str())
        .unwrap_or("Home")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontmatter::extract_frontmatter;

    #[test]
    fn resolves_routes_from_paths() {
        let resolver = PathRouteResolver;

        assert_eq!(resolver.resolve(Path::new("index.md"), None), "/");
        assert_eq!(resolver.resolve(Path::new("blog/index.mdx"), None), "/blog");
        assert_eq!(
            resolver.resolve(Path::new("blog/first-post.md"), None),
            "/blog/first-post"
        );
    }

    #[test]
    fn frontmatter_overrides_route() {
        let (fm, _) = extract_frontmatter("---\nslug: getting-started/\n---\n").unwrap();

        let route = PathRouteResolver.resolve(Path::new("guides/start.md"), fm.as_ref());

        assert_eq!(route, "/getting-started");
    }

    #[test]
    fn normalizes_routes() {
        assert_eq!(normalize_route(""), "/");
        assert_eq!(normalize_route("/"), "/");
        assert_eq!(normalize_route("blog/"), "/blog");
        assert_eq!(normalize_route("//blog//a/"), "/blog/a");
    }

    #[test]
    fn derives_fallback_titles() {
        assert_eq!(fallback_title(Path::new("blog/first-post.md")), "first-post");
        assert_eq!(fallback_title(Path::new("blog/index.md")), "blog");
        assert_eq!(fallback_title(Path::new("index.md")), "Home");
    }
}
