//! One-off query command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use lattice_client::{connect, ArtifactLocation, ClientMode, ContentSource};
use lattice_graph::{GraphHandle, Query};

use crate::config::load_config;

/// Run the query command.
///
/// Without `from`, content is loaded and queried live. With `from`, the query
/// is answered from the artifacts of an earlier build.
pub async fn run(config_path: &Path, signature: &str, from: Option<String>) -> Result<()> {
    let query = Query::parse_signature(signature)
        .with_context(|| format!("Invalid query: {}", signature))?;

    let mode = match from {
        Some(location) => ClientMode::Materialized(ArtifactLocation::parse(&location)),
        None => {
            let loader = load_config(config_path)?.build_config()?.loader();
            let outcome = tokio::task::spawn_blocking(move || loader.load())
                .await
                .context("Load task failed")??;
            for diagnostic in &outcome.diagnostics {
                diagnostic.log();
            }
            ClientMode::Live(Arc::new(GraphHandle::new(outcome.graph)))
        }
    };

    let source = connect(mode);
    tracing::debug!("Querying {} via {}", query, source.name());

    let entries = source.execute(&query).await?;
    println!("{}", serde_json::to_string_pretty(&entries)?);

    Ok(())
}
