//! Execution by fetching materialized artifacts.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use lattice_graph::{ContentEntry, Query};

use crate::source::{ClientError, ContentSource};

/// Errors that can occur while retrieving an artifact.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Artifact not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} fetching {location}")]
    Status { location: String, status: u16 },

    #[error("Network error fetching {location}: {message}")]
    Network { location: String, message: String },

    #[error("Failed to read {location}: {message}")]
    Io { location: String, message: String },

    #[error("Invalid artifact at {location}: {message}")]
    Decode { location: String, message: String },
}

/// Retrieves artifact bytes by path relative to the build output.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Human-readable location of `path`, for errors and logs.
    fn locate(&self, path: &str) -> String;

    /// Fetch the bytes stored at `path` (e.g. `_content/all-<hash>.json`).
    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads artifacts from a build output directory.
#[derive(Debug, Clone)]
pub struct DirFetcher {
    root: PathBuf,
}

impl DirFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ArtifactFetcher for DirFetcher {
    fn locate(&self, path: &str) -> String {
        self.root.join(path).display().to_string()
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let location = self.root.join(path);
        tokio::fs::read(&location).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                FetchError::NotFound(location.display().to_string())
            } else {
                FetchError::Io {
                    location: location.display().to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

/// Fetches artifacts over HTTP from a deployed (or previewed) site.
#[derive(Clone)]
pub struct HttpFetcher {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpFetcher {
    /// Create a fetcher for the site rooted at `base_url`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build();

        Self {
            base_url: base_url.into(),
            agent: ureq::Agent::new_with_config(config),
        }
    }
}

#[async_trait]
impl ArtifactFetcher for HttpFetcher {
    fn locate(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn fetch(&self, path: &str) -> Result<Vec<u8>, FetchError> {
        let url = self.locate(path);
        let agent = self.agent.clone();
        let location = url.clone();

        // ureq is blocking; keep it off the async workers
        tokio::task::spawn_blocking(move || fetch_blocking(&agent, &url))
            .await
            .map_err(|e| FetchError::Network {
                location,
                message: e.to_string(),
            })?
    }
}

fn fetch_blocking(agent: &ureq::Agent, url: &str) -> Result<Vec<u8>, FetchError> {
    match agent.get(url).call() {
        // Artifacts for large sites exceed ureq's default 10 MiB body limit
        Ok(mut response) => response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| FetchError::Network {
                location: url.to_string(),
                message: format!("failed to read response: {}", e),
            }),
        Err(ureq::Error::StatusCode(404)) => Err(FetchError::NotFound(url.to_string())),
        Err(ureq::Error::StatusCode(status)) => Err(FetchError::Status {
            location: url.to_string(),
            status,
        }),
        Err(e) => Err(FetchError::Network {
            location: url.to_string(),
            message: e.to_string(),
        }),
    }
}

/// Answers queries by fetching and decoding the artifact of each query.
#[derive(Debug, Clone)]
pub struct ArtifactSource<F> {
    fetcher: F,
}

impl<F: ArtifactFetcher> ArtifactSource<F> {
    pub fn new(fetcher: F) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl<F: ArtifactFetcher> ContentSource for ArtifactSource<F> {
    fn name(&self) -> &'static str {
        "artifact"
    }

    async fn execute(&self, query: &Query) -> Result<Vec<ContentEntry>, ClientError> {
        let path = query.artifact_path();
        tracing::debug!("Fetching {} for {}", self.fetcher.locate(&path), query);

        let fail = |source: FetchError| ClientError::Fetch {
            signature: query.signature(),
            source,
        };

        let bytes = self.fetcher.fetch(&path).await.map_err(fail)?;

        serde_json::from_slice(&bytes).map_err(|e| {
            fail(FetchError::Decode {
                location: self.fetcher.locate(&path),
                message: e.to_string(),
            })
        })
    }
}
