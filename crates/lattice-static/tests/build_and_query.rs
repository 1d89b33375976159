//! End-to-end: build a site, then query it live and through its artifacts.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use lattice_client::{connect, ArtifactLocation, ClientMode, ContentSource};
use lattice_content::Value;
use lattice_graph::{GraphHandle, Query};
use lattice_static::{BuildConfig, Diagnostic, StaticBuilder};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn site(root: &Path) -> BuildConfig {
    write(
        root,
        "content/blog/a.md",
        "---\ntitle: First post\ncollections: [nav]\norder: 2\nweight: 207.96181086732759\ntags: [rust, ssg]\n---\nHello",
    );
    write(
        root,
        "content/blog/b.md",
        "---\ntitle: Second post\ncollection: nav\norder: 1\nmeta:\n  draft: false\n  ratio: 0.5\n---\n",
    );
    write(root, "content/index.md", "# Home page");
    write(root, "content/blog-archive.md", "Old posts");
    write(
        root,
        "src/layout.tsx",
        r#"const nav = await content.byCollection("nav");
const posts = await content.byRoutePrefix("/blog/");
const everything = await content.all();
"#,
    );

    BuildConfig {
        content_dir: root.join("content"),
        source_dirs: vec![root.join("src")],
        output_dir: root.join("dist"),
        ..Default::default()
    }
}

fn read_artifacts(dir: &Path) -> BTreeMap<String, Vec<u8>> {
    fs::read_dir(dir.join("_content"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .map(|p| {
            let name = p.file_name().unwrap().to_string_lossy().into_owned();
            (name, fs::read(p).unwrap())
        })
        .collect()
}

fn routes(entries: &[lattice_graph::ContentEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.route.as_str()).collect()
}

#[test]
fn rebuilding_unchanged_content_is_byte_identical() {
    let temp = tempdir().unwrap();
    let config = site(temp.path());

    StaticBuilder::new(config.clone()).build().unwrap();
    let first = read_artifacts(&config.output_dir);

    StaticBuilder::new(config.clone()).build().unwrap();
    let second = read_artifacts(&config.output_dir);

    // three queries plus manifest.json and graph.json
    assert_eq!(first.len(), 5);
    assert_eq!(first, second);
}

#[tokio::test]
async fn live_and_materialized_results_are_equal() {
    let temp = tempdir().unwrap();
    let config = site(temp.path());

    let result = StaticBuilder::new(config.clone()).build().unwrap();
    assert!(!result.has_errors(), "{:?}", result.diagnostics);
    assert_eq!(result.artifacts, 3);

    let graph = config.loader().load().unwrap().graph;
    let live = connect(ClientMode::Live(Arc::new(GraphHandle::new(graph))));
    let materialized = connect(ClientMode::Materialized(ArtifactLocation::Directory(
        config.output_dir.clone(),
    )));

    for query in [
        Query::All,
        Query::route_prefix("/blog/"),
        Query::collection("nav"),
    ] {
        let expected = live.execute(&query).await.unwrap();
        let fetched = materialized.execute(&query).await.unwrap();
        assert_eq!(fetched, expected, "mismatch for {}", query);
    }

    let nav = materialized.by_collection("nav").await.unwrap();
    assert_eq!(routes(&nav), vec!["/blog/a", "/blog/b"]);

    let posts = materialized.by_route_prefix("/blog").await.unwrap();
    assert_eq!(routes(&posts), vec!["/blog/a", "/blog/b"]);

    let all = live.all().await.unwrap();
    assert_eq!(all.len(), 4);

    // Full-precision floats survive the JSON round trip unchanged
    let first = &nav[0];
    assert_eq!(first.data["weight"], Value::Float(207.96181086732759));
}

#[tokio::test]
async fn unmaterialized_query_fails_instead_of_returning_empty() {
    let temp = tempdir().unwrap();
    let config = site(temp.path());
    StaticBuilder::new(config.clone()).build().unwrap();

    let materialized = connect(ClientMode::Materialized(ArtifactLocation::Directory(
        config.output_dir.clone(),
    )));

    assert!(materialized.by_collection("never-used").await.is_err());
}

#[test]
fn call_sites_are_rewritten_to_artifact_urls() {
    let temp = tempdir().unwrap();
    let config = site(temp.path());

    let result = StaticBuilder::new(config.clone()).build().unwrap();

    let layout = fs::read_to_string(config.output_dir.join("layout.tsx")).unwrap();
    for (signature, url) in &result.manifest {
        assert!(layout.contains(url.as_str()), "{} not rewritten", signature);
    }
    assert!(!layout.contains("content.byCollection"));
    assert_eq!(
        result.manifest["collection:nav"],
        Query::collection("nav").artifact_url("/")
    );
}

#[test]
fn duplicate_route_keeps_the_later_record() {
    let temp = tempdir().unwrap();
    let config = site(temp.path());
    write(temp.path(), "content/about/index.md", "---\ntitle: Earlier\n---\n");
    write(temp.path(), "content/about.md", "---\ntitle: Later\n---\n");

    let result = StaticBuilder::new(config.clone()).build().unwrap();
    let graph = config.loader().load().unwrap().graph;

    assert_eq!(graph.by_route_prefix("/about").len(), 1);
    assert_eq!(graph.get("/about").unwrap().title, "Later");
    assert!(result.diagnostics.iter().any(|d| matches!(
        d,
        Diagnostic::Graph(lattice_graph::GraphWarning::DuplicateRoute { route, .. }) if route == "/about"
    )));
    assert!(!result.has_errors());
}
