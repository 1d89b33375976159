//! Development server implementation.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use lattice_graph::{ContentGraph, GraphHandle, Query};
use lattice_static::{is_site_file, BuildConfig, ScannedFile};

use crate::api;
use crate::watcher::{FileWatcher, WatchEvent};
use crate::websocket::{hmr_client_script, HmrHub, HmrMessage};

/// Configuration for the development server.
#[derive(Debug, Clone)]
pub struct DevServerConfig {
    /// Content, site source and query settings shared with static builds
    pub build: BuildConfig,

    /// Port to listen on
    pub port: u16,

    /// Host to bind to
    pub host: String,

    /// Open browser on start
    pub open: bool,
}

impl Default for DevServerConfig {
    fn default() -> Self {
        Self {
            build: BuildConfig::default(),
            port: 7777,
            host: "127.0.0.1".to_string(),
            open: true,
        }
    }
}

/// Errors that can occur with the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Failed to bind to {0}: {1}")]
    BindError(SocketAddr, String),

    #[error("File watch error: {0}")]
    WatchError(String),

    #[error("Failed to load content: {0}")]
    LoadError(String),
}

/// What a changed path means for the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ChangeKind {
    /// Affects the content graph
    Content,

    /// A site source file that may add or remove query calls
    Source,

    /// Anything else under a watched directory
    Other,
}

/// Decide how a change to `path` is handled.
///
/// Paths under the content directory that are content files, or that have no
/// extension (directories being added or removed), are content changes.
pub fn classify_change(config: &BuildConfig, path: &Path) -> ChangeKind {
    if path.starts_with(&config.content_dir) {
        let loader = config.loader();
        if path.extension().is_none() || loader.is_content_file(path) {
            return ChangeKind::Content;
        }
    }

    let in_sources = config.source_dirs.iter().any(|dir| path.starts_with(dir));
    if in_sources && is_site_file(path) {
        return ChangeKind::Source;
    }

    ChangeKind::Other
}

/// Shared server state.
pub struct ServerState {
    pub(crate) config: DevServerConfig,
    pub(crate) graph: Arc<GraphHandle>,
    pub(crate) hmr: HmrHub,

    /// Artifact file name to the query it answers
    pub(crate) artifacts: RwLock<BTreeMap<String, Query>>,
}

impl ServerState {
    /// State serving `graph`, with only the configured queries known.
    pub fn new(config: DevServerConfig, graph: ContentGraph) -> Self {
        let artifacts = index_queries(&[], &config.build.queries);
        Self {
            config,
            graph: Arc::new(GraphHandle::new(graph)),
            hmr: HmrHub::new(),
            artifacts: RwLock::new(artifacts),
        }
    }

    /// The live graph handle.
    pub fn graph(&self) -> &Arc<GraphHandle> {
        &self.graph
    }

    /// Rebuild the graph on the blocking pool and swap it in.
    ///
    /// On failure the current snapshot stays in place.
    pub async fn reload_content(&self) -> Result<usize, ServerError> {
        let loader = self.config.build.loader();
        let outcome = tokio::task::spawn_blocking(move || loader.load())
            .await
            .map_err(|e| ServerError::LoadError(e.to_string()))?
            .map_err(|e| ServerError::LoadError(e.to_string()))?;

        for diagnostic in &outcome.diagnostics {
            diagnostic.log();
        }

        let records = outcome.graph.len();
        self.graph.replace(outcome.graph);
        tracing::info!("Loaded {} records from {} files", records, outcome.files);

        Ok(records)
    }

    /// Rescan site sources and refresh the known-artifact index.
    pub async fn rescan_sites(&self) -> usize {
        let scanner = self.config.build.scanner();
        let files = match tokio::task::spawn_blocking(move || scanner.scan()).await {
            Ok((files, diagnostics)) => {
                for diagnostic in &diagnostics {
                    diagnostic.log();
                }
                files
            }
            Err(e) => {
                tracing::error!("Site scan failed: {}", e);
                return self.artifacts.read().await.len();
            }
        };

        let index = index_queries(&files, &self.config.build.queries);
        let count = index.len();
        *self.artifacts.write().await = index;

        tracing::debug!("Indexed {} queries", count);
        count
    }

    /// The query answered by artifact `file_name`, if any.
    pub async fn artifact_query(&self, file_name: &str) -> Option<Query> {
        self.artifacts.read().await.get(file_name).cloned()
    }

    /// Signature to artifact URL for every known query.
    pub async fn manifest(&self) -> BTreeMap<String, String> {
        self.artifacts
            .read()
            .await
            .values()
            .map(|q| (q.signature(), q.artifact_url(&self.config.build.base_url)))
            .collect()
    }
}

fn index_queries(files: &[ScannedFile], configured: &[Query]) -> BTreeMap<String, Query> {
    files
        .iter()
        .flat_map(|f| f.sites.iter().map(|s| &s.query))
        .chain(configured)
        .map(|q| (q.artifact_file_name(), q.clone()))
        .collect()
}

/// Development server.
pub struct DevServer {
    config: DevServerConfig,
}

impl DevServer {
    /// Create a new development server.
    pub fn new(config: DevServerConfig) -> Self {
        Self { config }
    }

    /// Start the development server.
    ///
    /// Fails if the initial content load fails; later rebuild failures keep
    /// the last good graph.
    pub async fn start(self) -> Result<(), ServerError> {
        let addr: SocketAddr = format!("{}:{}", self.config.host, self.config.port)
            .parse()
            .map_err(|_| {
                ServerError::InvalidAddress(format!("{}:{}", self.config.host, self.config.port))
            })?;

        let mut config = self.config.clone();
        config.build.content_dir = absolutize(&config.build.content_dir);
        config.build.source_dirs = config.build.source_dirs.iter().map(|d| absolutize(d)).collect();

        let state = Arc::new(ServerState::new(config.clone(), ContentGraph::empty()));
        state.reload_content().await?;
        state.rescan_sites().await;

        // Set up file watcher
        let mut watch_paths = vec![config.build.content_dir.clone()];
        watch_paths.extend(config.build.source_dirs.iter().cloned());

        let (watcher, mut rx) =
            FileWatcher::new(&watch_paths).map_err(|e| ServerError::WatchError(e.to_string()))?;

        let state_clone = Arc::clone(&state);
        tokio::spawn(async move {
            while let Some(event) = rx.recv().await {
                let mut events = vec![event];
                while let Ok(more) = rx.try_recv() {
                    events.push(more);
                }
                handle_watch_events(&state_clone, &events).await;
            }
            // Keep watcher alive
            drop(watcher);
        });

        let app = router(state, config.build.source_dirs.first());

        tracing::info!("Starting dev server at http://{}", addr);

        if config.open {
            let url = format!("http://{}", addr);
            if let Err(e) = open::that(&url) {
                tracing::debug!("Could not open browser: {}", e);
            }
        }

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        axum::serve(listener, app)
            .await
            .map_err(|e| ServerError::BindError(addr, e.to_string()))?;

        Ok(())
    }
}

/// Build the router. The first site source directory is served as static files.
///
/// Content endpoints allow any origin so a site running under another dev
/// server can query them.
pub fn router(state: Arc<ServerState>, static_root: Option<&PathBuf>) -> Router {
    let mut app = Router::new()
        .route("/__content/all", get(api::all))
        .route("/__content/route-prefix", get(api::route_prefix))
        .route("/__content/collection/{name}", get(api::collection))
        .route("/__content/route", get(api::route))
        .route("/__content/graph", get(api::graph))
        .route("/_content/{file}", get(api::artifact))
        .route("/__hmr", get(ws_handler))
        .route("/__hmr.js", get(hmr_script_handler))
        .layer(CorsLayer::permissive());

    if let Some(root) = static_root {
        app = app.fallback_service(ServeDir::new(root));
    }

    app.with_state(state)
}

fn absolutize(path: &Path) -> PathBuf {
    std::fs::canonicalize(path)
        .or_else(|_| std::path::absolute(path))
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Handle a batch of file watch events.
///
/// The graph is rebuilt at most once per batch.
async fn handle_watch_events(state: &ServerState, events: &[WatchEvent]) {
    let mut content = false;
    let mut source = false;

    for event in events {
        let kind = classify_change(&state.config.build, event.path());
        tracing::debug!("{:?} change: {}", kind, event.path().display());
        match kind {
            ChangeKind::Content => content = true,
            ChangeKind::Source => source = true,
            ChangeKind::Other => {}
        }
    }

    if source {
        state.rescan_sites().await;
    }

    if content {
        match state.reload_content().await {
            Ok(records) if !source => {
                state.hmr.send(HmrMessage::ContentUpdated { records });
                return;
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("Rebuild failed, keeping previous graph: {}", e);
                state.hmr.send(HmrMessage::BuildFailed {
                    message: e.to_string(),
                });
                return;
            }
        }
    }

    state.hmr.send(HmrMessage::Reload);
}

/// Handler for the HMR WebSocket endpoint.
async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_ws(socket, state))
}

/// Handle a WebSocket connection.
async fn handle_ws(mut socket: WebSocket, state: Arc<ServerState>) {
    let mut rx = state.hmr.subscribe();

    if !send_message(&mut socket, &HmrMessage::Connected).await {
        return;
    }

    // Forward HMR messages to the client
    while let Ok(hmr_msg) = rx.recv().await {
        if !send_message(&mut socket, &hmr_msg).await {
            break;
        }
    }
}

async fn send_message(socket: &mut WebSocket, msg: &HmrMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(json) => json,
        Err(e) => {
            tracing::error!("Failed to encode HMR message: {}", e);
            return false;
        }
    };
    socket.send(Message::Text(json.into())).await.is_ok()
}

/// Handler for the HMR client script.
async fn hmr_script_handler() -> impl IntoResponse {
    let script = hmr_client_script("/__hmr");
    ([("content-type", "application/javascript")], script)
}
