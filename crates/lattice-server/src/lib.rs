//! Development server for lattice sites.
//!
//! Serves content queries live from an in-memory graph, rebuilds the graph
//! when content changes, and pushes reload notifications over WebSocket.

pub mod api;
pub mod server;
pub mod watcher;
pub mod websocket;

pub use server::{classify_change, ChangeKind, DevServer, DevServerConfig, ServerError};
pub use watcher::{FileWatcher, WatchEvent};
pub use websocket::{HmrHub, HmrMessage};
