//! In-process execution against the current graph snapshot.

use std::sync::Arc;

use async_trait::async_trait;
use lattice_graph::{ContentEntry, GraphHandle, Query};

use crate::source::{ClientError, ContentSource};

/// Answers queries from the live graph. Used by the dev server and by tooling
/// that runs inside the build process.
#[derive(Debug, Clone)]
pub struct LiveSource {
    handle: Arc<GraphHandle>,
}

impl LiveSource {
    pub fn new(handle: Arc<GraphHandle>) -> Self {
        Self { handle }
    }

    /// The handle this source reads from.
    pub fn handle(&self) -> &Arc<GraphHandle> {
        &self.handle
    }
}

#[async_trait]
impl ContentSource for LiveSource {
    fn name(&self) -> &'static str {
        "live"
    }

    async fn execute(&self, query: &Query) -> Result<Vec<ContentEntry>, ClientError> {
        // One snapshot per query, even if a rebuild lands meanwhile
        let graph = self.handle.load();
        Ok(graph.execute(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lattice_content::ContentRecord;
    use lattice_graph::ContentGraph;

    #[tokio::test]
    async fn reflects_replaced_graphs() {
        let handle = Arc::new(GraphHandle::new(ContentGraph::from_records([
            ContentRecord::new("/a").with_collection("nav"),
        ])));
        let source = LiveSource::new(Arc::clone(&handle));

        assert_eq!(source.by_collection("nav").await.unwrap().len(), 1);

        handle.replace(ContentGraph::from_records([
            ContentRecord::new("/a").with_collection("nav"),
            ContentRecord::new("/b").with_collection("nav"),
        ]));

        let routes: Vec<String> = source
            .by_collection("nav")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.route)
            .collect();
        assert_eq!(routes, vec!["/a", "/b"]);
    }

    #[tokio::test]
    async fn unknown_queries_are_empty_not_errors() {
        let source = LiveSource::new(Arc::new(GraphHandle::default()));

        assert!(source.all().await.unwrap().is_empty());
        assert!(source.by_route_prefix("/nope").await.unwrap().is_empty());
        assert!(source.by_collection("nope").await.unwrap().is_empty());
    }
}
