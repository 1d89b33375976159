//! The query interface shared by every execution strategy.

use async_trait::async_trait;
use lattice_graph::{ContentEntry, Query};

use crate::artifact::FetchError;

/// Errors returned by a content source.
///
/// A failed fetch is never reported as an empty result: an empty `Vec` always
/// means the query legitimately matched nothing.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Failed to fetch artifact for {signature}: {source}")]
    Fetch {
        signature: String,
        #[source]
        source: FetchError,
    },
}

/// Query API consumed by page and component code.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Strategy identifier (e.g., "live", "artifact")
    fn name(&self) -> &'static str;

    /// Run a query.
    async fn execute(&self, query: &Query) -> Result<Vec<ContentEntry>, ClientError>;

    /// Every record in graph order.
    async fn all(&self) -> Result<Vec<ContentEntry>, ClientError> {
        self.execute(&Query::All).await
    }

    /// Records under a route prefix, in graph order.
    async fn by_route_prefix(&self, prefix: &str) -> Result<Vec<ContentEntry>, ClientError> {
        self.execute(&Query::route_prefix(prefix)).await
    }

    /// Members of a collection, in graph order.
    async fn by_collection(&self, name: &str) -> Result<Vec<ContentEntry>, ClientError> {
        self.execute(&Query::collection(name)).await
    }
}
