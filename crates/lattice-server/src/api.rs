//! Live content query endpoints.
//!
//! Everything here reads the current graph snapshot. `/_content/{file}` answers
//! with the same bytes a static build would write for that artifact, so a site
//! rewritten to fetch artifacts also works against the dev server.

use std::sync::Arc;

use axum::{
    extract::{Path, Query as Params, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use lattice_content::normalize_route;
use lattice_graph::{ContentEntry, Query};
use lattice_static::{encode_graph, encode_query};

use crate::server::ServerState;

#[derive(Debug, Deserialize)]
pub struct PrefixParams {
    #[serde(default)]
    pub prefix: String,
}

#[derive(Debug, Deserialize)]
pub struct RouteParams {
    pub route: String,
}

/// `GET /__content/all`
pub async fn all(State(state): State<Arc<ServerState>>) -> Response {
    execute(&state, &Query::All)
}

/// `GET /__content/route-prefix?prefix=/blog/`
pub async fn route_prefix(
    State(state): State<Arc<ServerState>>,
    Params(params): Params<PrefixParams>,
) -> Response {
    execute(&state, &Query::route_prefix(params.prefix))
}

/// `GET /__content/collection/{name}`
pub async fn collection(
    State(state): State<Arc<ServerState>>,
    Path(name): Path<String>,
) -> Response {
    execute(&state, &Query::collection(name))
}

/// `GET /__content/route?route=/about`
pub async fn route(
    State(state): State<Arc<ServerState>>,
    Params(params): Params<RouteParams>,
) -> Response {
    let route = normalize_route(&params.route);
    let graph = state.graph.load();

    match graph.get(&route) {
        Some(record) => {
            json(serde_json::to_vec(&ContentEntry::from(record)).map_err(|e| e.to_string()))
        }
        None => (StatusCode::NOT_FOUND, format!("No content at {}", route)).into_response(),
    }
}

/// `GET /__content/graph`
pub async fn graph(State(state): State<Arc<ServerState>>) -> Response {
    json(encode_graph(&state.graph.load()).map_err(|e| e.to_string()))
}

/// `GET /_content/{file}`
pub async fn artifact(
    State(state): State<Arc<ServerState>>,
    Path(file): Path<String>,
) -> Response {
    if file == "manifest.json" {
        let manifest = state.manifest().await;
        return json(serde_json::to_vec_pretty(&manifest).map_err(|e| e.to_string()));
    }
    if file == "graph.json" {
        return graph(State(state)).await;
    }

    match state.artifact_query(&file).await {
        Some(query) => execute(&state, &query),
        None => (StatusCode::NOT_FOUND, format!("Unknown artifact {}", file)).into_response(),
    }
}

fn execute(state: &ServerState, query: &Query) -> Response {
    json(encode_query(&state.graph.load(), query).map_err(|e| e.to_string()))
}

fn json(result: Result<Vec<u8>, String>) -> Response {
    match result {
        Ok(bytes) => ([(header::CONTENT_TYPE, "application/json")], bytes).into_response(),
        Err(message) => {
            tracing::error!("{}", message);
            (StatusCode::INTERNAL_SERVER_ERROR, message).into_response()
        }
    }
}
