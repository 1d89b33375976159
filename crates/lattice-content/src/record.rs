//! Normalized content records.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use crate::parser::{Heading, ParsedContent};
use crate::route::normalize_route;
use crate::value::Value;

/// One source content unit, normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentRecord {
    /// Canonical route, unique within a graph
    pub route: String,

    /// Display title (may be empty)
    pub title: String,

    /// Full frontmatter mapping
    pub data: BTreeMap<String, Value>,

    /// Collections this record declares membership in
    pub collections: BTreeSet<String>,

    /// Markdown body
    pub body: String,

    /// Heading outline of the body
    pub headings: Vec<Heading>,

    /// Source file, for diagnostics
    pub source: Option<PathBuf>,
}

impl ContentRecord {
    /// Create an empty record at `route` (normalized).
    pub fn new(route: impl AsRef<str>) -> Self {
        Self {
            route: normalize_route(route.as_ref()),
            title: String::new(),
            data: BTreeMap::new(),
            collections: BTreeSet::new(),
            body: String::new(),
            headings: Vec::new(),
            source: None,
        }
    }

    /// Build a record from a parsed document.
    ///
    /// The title is the `title` frontmatter key, else the first level-1 heading,
    /// else `fallback_title`. Collections come from the `collections` key (a list
    /// or a single name) and the `collection` alias.
    pub fn from_parsed(route: &str, parsed: ParsedContent, fallback_title: &str) -> Self {
        let data = parsed.frontmatter.map(|fm| fm.data).unwrap_or_default();

        let title = data
            .get("title")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                parsed
                    .headings
                    .iter()
                    .find(|h| h.level == 1)
                    .map(|h| h.title.clone())
            })
            .unwrap_or_else(|| fallback_title.to_string());

        let collections = declared_collections(&data);

        Self {
            route: normalize_route(route),
            title,
            data,
            collections,
            body: parsed.body,
            headings: parsed.headings,
            source: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collections.insert(name.into());
        self
    }

    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    pub fn with_source(mut self, source: impl Into<PathBuf>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Check collection membership.
    pub fn in_collection(&self, name: &str) -> bool {
        self.collections.contains(name)
    }
}

/// Collection names declared in frontmatter. Non-string entries are ignored.
fn declared_collections(data: &BTreeMap<String, Value>) -> BTreeSet<String> {
    let mut names = BTreeSet::new();

    for key in ["collections", "collection"] {
        match data.get(key) {
            Some(Value::String(name)) => {
                names.insert(name.clone());
            }
            Some(Value::List(items)) => {
                names.extend(items.iter().filter_map(Value::as_str).map(str::to_string));
            }
            _ => {}
        }
    }

    names.retain(|name| !name.is_empty());
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_content;

    #[test]
    fn takes_title_from_frontmatter() {
        let parsed = parse_content("---\ntitle: Hello\n---\n# Heading").unwrap();

        let record = ContentRecord::from_parsed("/hello", parsed, "hello");

        assert_eq!(record.title, "Hello");
        assert_eq!(record.data["title"], Value::from("Hello"));
    }

    #[test]
    fn falls_back_to_heading_then_file_name() {
        let with_heading = parse_content("Intro\n\n# Real Title\n").unwrap();
        let without = parse_content("Just text").unwrap();

        assert_eq!(
            ContentRecord::from_parsed("/a", with_heading, "a").title,
            "Real Title"
        );
        assert_eq!(ContentRecord::from_parsed("/b", without, "b").title, "b");
    }

    #[test]
    fn missing_frontmatter_gives_empty_data() {
        let parsed = parse_content("plain body").unwrap();

        let record = ContentRecord::from_parsed("notes/", parsed, "notes");

        assert_eq!(record.route, "/notes");
        assert!(record.data.is_empty());
        assert!(record.collections.is_empty());
        assert_eq!(record.body, "plain body");
    }

    #[test]
    fn reads_declared_collections() {
        let parsed =
            parse_content("---\ncollections: [nav, featured, 3]\ncollection: blog\n---\n").unwrap();

        let record = ContentRecord::from_parsed("/post", parsed, "post");

        assert!(record.in_collection("nav"));
        assert!(record.in_collection("featured"));
        assert!(record.in_collection("blog"));
        assert_eq!(record.collections.len(), 3);
    }
}
