//! Atomically replaceable graph snapshot.
//!
//! Readers call [`GraphHandle::load`] and query the returned `Arc` for as long as
//! they need it. A rebuild calls [`GraphHandle::replace`]; readers holding the
//! previous snapshot finish against it, new readers see the new one.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::graph::ContentGraph;

/// Shared slot holding the current graph snapshot.
#[derive(Debug)]
pub struct GraphHandle {
    current: ArcSwap<ContentGraph>,
}

impl GraphHandle {
    /// Create a handle holding `graph`.
    pub fn new(graph: ContentGraph) -> Self {
        Self {
            current: ArcSwap::from_pointee(graph),
        }
    }

    /// Current snapshot. Lock-free.
    #[inline]
    pub fn load(&self) -> Arc<ContentGraph> {
        self.current.load_full()
    }

    /// Atomically install a new snapshot, returning the previous one.
    pub fn replace(&self, graph: ContentGraph) -> Arc<ContentGraph> {
        self.current.swap(Arc::new(graph))
    }
}

impl Default for GraphHandle {
    fn default() -> Self {
        Self::new(ContentGraph::empty())
    }
}
