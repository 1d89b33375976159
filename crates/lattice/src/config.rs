//! `lattice.toml` loading.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use lattice_graph::{CollectionRule, Query};
use lattice_static::BuildConfig;

/// Configuration file structure (lattice.toml).
#[derive(Debug, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub content: ContentConfig,
    #[serde(default)]
    pub site: SiteConfig,
    #[serde(default)]
    pub collections: Vec<CollectionRule>,
    #[serde(default)]
    pub build: BuildSettings,
}

#[derive(Debug, Deserialize)]
pub struct ContentConfig {
    #[serde(default = "default_content_dir")]
    pub dir: String,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            dir: default_content_dir(),
            extensions: default_extensions(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SiteConfig {
    /// Directories scanned for content query calls
    #[serde(default = "default_sources")]
    pub sources: Vec<String>,
    #[serde(default = "default_output")]
    pub output: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            sources: default_sources(),
            output: default_output(),
            base_url: default_base_url(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct BuildSettings {
    /// Query signatures materialized even without a call site
    #[serde(default)]
    pub queries: Vec<String>,
}

fn default_content_dir() -> String {
    "content".to_string()
}
fn default_extensions() -> Vec<String> {
    vec!["md".to_string(), "mdx".to_string()]
}
fn default_sources() -> Vec<String> {
    vec!["src".to_string()]
}
fn default_output() -> String {
    "dist".to_string()
}
fn default_base_url() -> String {
    "/".to_string()
}

/// Load configuration from `path` if it exists.
/// Returns an error if the config file exists but is malformed.
pub fn load_config(path: &Path) -> Result<ConfigFile> {
    if !path.exists() {
        tracing::debug!("No {}, using defaults", path.display());
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    tracing::info!("Loaded config from {}", path.display());
    Ok(config)
}

impl ConfigFile {
    /// Build settings described by this file.
    pub fn build_config(&self) -> Result<BuildConfig> {
        let queries = self
            .build
            .queries
            .iter()
            .map(|signature| {
                Query::parse_signature(signature)
                    .with_context(|| format!("Invalid query in [build] queries: {:?}", signature))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(BuildConfig {
            content_dir: PathBuf::from(&self.content.dir),
            extensions: self.content.extensions.clone(),
            source_dirs: self.site.sources.iter().map(PathBuf::from).collect(),
            output_dir: PathBuf::from(&self.site.output),
            base_url: self.site.base_url.clone(),
            collections: self.collections.clone(),
            queries,
        })
    }
}
