//! Static build command.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use lattice_static::StaticBuilder;

use crate::config::load_config;

/// Run the build command.
pub async fn run(config_path: &Path, output: Option<PathBuf>, allow_errors: bool) -> Result<()> {
    tracing::info!("Building content artifacts...");

    let mut config = load_config(config_path)?.build_config()?;
    if let Some(output) = output {
        config.output_dir = output;
    }

    let builder = StaticBuilder::new(config);
    let result = tokio::task::spawn_blocking(move || builder.build())
        .await
        .context("Build task failed")??;

    tracing::info!(
        "Built {} artifacts from {} records, rewrote {} files in {}ms",
        result.artifacts,
        result.records,
        result.rewritten,
        result.duration_ms
    );

    tracing::info!("Output: {}", result.output_dir.display());

    if result.has_errors() {
        let errors = result.error_count();
        if allow_errors {
            tracing::warn!("Build finished with {} errors", errors);
        } else {
            anyhow::bail!("Build finished with {} errors", errors);
        }
    }

    Ok(())
}
