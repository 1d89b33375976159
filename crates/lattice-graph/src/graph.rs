//! Graph construction and the query engine.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use lattice_content::ContentRecord;
use serde::Deserialize;

use crate::entry::{ContentEntry, GraphDocument};
use crate::query::{PrefixMatcher, Query};

/// Declared membership rule: every record under `route_prefix` joins `name`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CollectionRule {
    pub name: String,
    pub route_prefix: String,
}

impl CollectionRule {
    pub fn new(name: impl Into<String>, route_prefix: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            route_prefix: route_prefix.into(),
        }
    }
}

/// Non-fatal conditions found while building a graph.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphWarning {
    #[error("Duplicate route {route}: {} replaced by {}", display_source(.replaced), display_source(.by))]
    DuplicateRoute {
        route: String,
        replaced: Option<PathBuf>,
        by: Option<PathBuf>,
    },
}

fn display_source(source: &Option<PathBuf>) -> String {
    source
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<unnamed record>".to_string())
}

/// Collects records for one build cycle and produces a [`ContentGraph`].
#[derive(Debug, Default)]
pub struct GraphBuilder {
    records: Vec<ContentRecord>,
    routes: HashMap<String, usize>,
    rules: Vec<CollectionRule>,
    warnings: Vec<GraphWarning>,
}

impl GraphBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply collection rules during [`GraphBuilder::build`].
    pub fn with_rules(mut self, rules: impl IntoIterator<Item = CollectionRule>) -> Self {
        self.rules.extend(rules);
        self
    }

    /// Add a record.
    ///
    /// A record whose route is already present replaces the earlier record in
    /// its slot (last write wins) and records a [`GraphWarning::DuplicateRoute`].
    pub fn push(&mut self, record: ContentRecord) {
        if let Some(&slot) = self.routes.get(&record.route) {
            let replaced = &self.records[slot];
            let warning = GraphWarning::DuplicateRoute {
                route: record.route.clone(),
                replaced: replaced.source.clone(),
                by: record.source.clone(),
            };
            tracing::debug!("{}", warning);
            self.warnings.push(warning);
            self.records[slot] = record;
        } else {
            self.routes.insert(record.route.clone(), self.records.len());
            self.records.push(record);
        }
    }

    /// Number of distinct routes pushed so far.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Freeze the records into a graph.
    ///
    /// Collection rules are applied and the collection index is computed here,
    /// so every query against the result is a plain read.
    pub fn build(self) -> (ContentGraph, Vec<GraphWarning>) {
        let Self {
            mut records,
            routes,
            rules,
            warnings,
        } = self;

        let matchers: Vec<(&str, PrefixMatcher)> = rules
            .iter()
            .map(|rule| (rule.name.as_str(), PrefixMatcher::new(&rule.route_prefix)))
            .collect();

        for record in &mut records {
            for (name, matcher) in &matchers {
                if matcher.matches(&record.route) {
                    record.collections.insert(name.to_string());
                }
            }
        }

        let mut collections: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (slot, record) in records.iter().enumerate() {
            for name in &record.collections {
                collections.entry(name.clone()).or_default().push(slot);
            }
        }

        let graph = ContentGraph {
            records,
            routes,
            collections,
        };

        (graph, warnings)
    }
}

impl Extend<ContentRecord> for GraphBuilder {
    fn extend<I: IntoIterator<Item = ContentRecord>>(&mut self, iter: I) {
        for record in iter {
            self.push(record);
        }
    }
}

/// An immutable, indexed snapshot of every content record.
#[derive(Debug, Clone, Default)]
pub struct ContentGraph {
    /// Records in insertion order
    records: Vec<ContentRecord>,
    /// Route to slot
    routes: HashMap<String, usize>,
    /// Collection name to slots, in graph order
    collections: BTreeMap<String, Vec<usize>>,
}

impl ContentGraph {
    /// A graph with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a graph from records with no collection rules, discarding warnings.
    pub fn from_records(records: impl IntoIterator<Item = ContentRecord>) -> Self {
        let mut builder = GraphBuilder::new();
        builder.extend(records);
        builder.build().0
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Collection names, sorted.
    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.collections.keys().map(String::as_str)
    }

    /// Every record in graph order.
    pub fn all(&self) -> Vec<&ContentRecord> {
        self.records.iter().collect()
    }

    /// Records under `prefix`, in graph order. See [`crate::normalize_prefix`].
    pub fn by_route_prefix(&self, prefix: &str) -> Vec<&ContentRecord> {
        let matcher = PrefixMatcher::new(prefix);
        self.records
            .iter()
            .filter(|record| matcher.matches(&record.route))
            .collect()
    }

    /// Members of `name`, in graph order. Unknown names yield nothing.
    pub fn by_collection(&self, name: &str) -> Vec<&ContentRecord> {
        self.collections
            .get(name)
            .map(|slots| slots.iter().map(|&slot| &self.records[slot]).collect())
            .unwrap_or_default()
    }

    /// Exact route lookup.
    pub fn get(&self, route: &str) -> Option<&ContentRecord> {
        self.routes.get(route).map(|&slot| &self.records[slot])
    }

    /// Run a query, returning matching records.
    pub fn select(&self, query: &Query) -> Vec<&ContentRecord> {
        match query {
            Query::All => self.all(),
            Query::RoutePrefix(prefix) => self.by_route_prefix(prefix),
            Query::Collection(name) => self.by_collection(name),
        }
    }

    /// Run a query, returning results in wire shape.
    pub fn execute(&self, query: &Query) -> Vec<ContentEntry> {
        self.select(query)
            .into_iter()
            .map(ContentEntry::from)
            .collect()
    }

    /// The whole graph in wire shape.
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            records: self.records.iter().map(ContentEntry::from).collect(),
            collections: self
                .collections
                .iter()
                .map(|(name, slots)| {
                    let routes = slots
                        .iter()
                        .map(|&slot| self.records[slot].route.clone())
                        .collect();
                    (name.clone(), routes)
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn routes(records: &[&ContentRecord]) -> Vec<String> {
        records.iter().map(|r| r.route.clone()).collect()
    }

    fn blog_graph() -> ContentGraph {
        ContentGraph::from_records([
            ContentRecord::new("/blog/a").with_collection("nav"),
            ContentRecord::new("/blog/b").with_collection("nav"),
            ContentRecord::new("/index"),
        ])
    }

    #[test]
    fn end_to_end_blog_scenario() {
        let graph = blog_graph();

        assert_eq!(
            routes(&graph.by_route_prefix("/blog/")),
            vec!["/blog/a", "/blog/b"]
        );
        assert_eq!(
            routes(&graph.by_collection("nav")),
            vec!["/blog/a", "/blog/b"]
        );
        assert_eq!(
            routes(&graph.all()),
            vec!["/blog/a", "/blog/b", "/index"]
        );
    }

    #[test]
    fn all_returns_every_record_once_in_insertion_order() {
        let names = ["/z", "/a", "/m", "/a/b", "/"];
        let graph = ContentGraph::from_records(names.iter().map(ContentRecord::new));

        assert_eq!(routes(&graph.all()), names.to_vec());
    }

    #[test]
    fn duplicate_route_is_last_write_wins() {
        let mut builder = GraphBuilder::new();
        builder.push(
            ContentRecord::new("/about")
                .with_title("First")
                .with_source("about.md"),
        );
        builder.push(ContentRecord::new("/contact"));
        builder.push(
            ContentRecord::new("/about")
                .with_title("Second")
                .with_source("about/index.md"),
        );

        let (graph, warnings) = builder.build();

        assert_eq!(graph.len(), 2);
        assert_eq!(graph.get("/about").unwrap().title, "Second");
        // The replacement keeps the slot of the first occurrence
        assert_eq!(routes(&graph.all()), vec!["/about", "/contact"]);
        assert_eq!(
            warnings,
            vec![GraphWarning::DuplicateRoute {
                route: "/about".to_string(),
                replaced: Some(PathBuf::from("about.md")),
                by: Some(PathBuf::from("about/index.md")),
            }]
        );
    }

    #[test]
    fn duplicate_replacement_drops_old_collections() {
        let mut builder = GraphBuilder::new();
        builder.push(ContentRecord::new("/about").with_collection("nav"));
        builder.push(ContentRecord::new("/about"));

        let (graph, _) = builder.build();

        assert!(graph.by_collection("nav").is_empty());
    }

    #[test]
    fn prefix_does_not_match_sibling_routes() {
        let graph = ContentGraph::from_records([
            ContentRecord::new("/blog"),
            ContentRecord::new("/blog-archive"),
            ContentRecord::new("/blog/post"),
        ]);

        assert_eq!(
            routes(&graph.by_route_prefix("/blog")),
            vec!["/blog", "/blog/post"]
        );
        assert!(graph.by_route_prefix("/missing").is_empty());
        assert_eq!(graph.by_route_prefix("/").len(), 3);
    }

    #[test]
    fn unknown_collection_is_empty() {
        assert!(blog_graph().by_collection("does-not-exist").is_empty());
    }

    #[test]
    fn applies_collection_rules() {
        let mut builder = GraphBuilder::new().with_rules([CollectionRule::new("posts", "/blog")]);
        builder.extend([
            ContentRecord::new("/blog/a"),
            ContentRecord::new("/about"),
            ContentRecord::new("/blog/b").with_collection("featured"),
        ]);

        let (graph, warnings) = builder.build();

        assert!(warnings.is_empty());
        assert_eq!(
            routes(&graph.by_collection("posts")),
            vec!["/blog/a", "/blog/b"]
        );
        assert_eq!(routes(&graph.by_collection("featured")), vec!["/blog/b"]);
        assert_eq!(
            graph.collection_names().collect::<Vec<_>>(),
            vec!["featured", "posts"]
        );
    }

    #[test]
    fn execute_matches_select() {
        let graph = blog_graph();
        let query = Query::collection("nav");

        let entries = graph.execute(&query);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].route, "/blog/a");
        assert_eq!(entries[0].collections, vec!["nav"]);
    }

    #[test]
    fn graph_document_lists_collections_by_route() {
        let doc = blog_graph().to_document();

        assert_eq!(doc.records.len(), 3);
        assert_eq!(
            doc.collections["nav"],
            vec!["/blog/a".to_string(), "/blog/b".to_string()]
        );
    }
}
