//! Selecting the execution strategy.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use lattice_graph::GraphHandle;

use crate::artifact::{ArtifactSource, DirFetcher, HttpFetcher};
use crate::live::LiveSource;
use crate::source::ContentSource;

/// Timeout applied to every HTTP artifact fetch.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Where materialized artifacts live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactLocation {
    /// A local build output directory
    Directory(PathBuf),
    /// The base URL of a served site
    Remote(String),
}

impl ArtifactLocation {
    /// `http://` and `https://` locations are remote, anything else is a directory.
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Remote(location.to_string())
        } else {
            Self::Directory(PathBuf::from(location))
        }
    }
}

/// How content queries are executed.
#[derive(Debug, Clone)]
pub enum ClientMode {
    /// In-process against the current graph (development)
    Live(Arc<GraphHandle>),
    /// Fetch precomputed artifacts (after a build)
    Materialized(ArtifactLocation),
}

/// Create the content source for `mode`.
pub fn connect(mode: ClientMode) -> Box<dyn ContentSource> {
    match mode {
        ClientMode::Live(handle) => Box::new(LiveSource::new(handle)),
        ClientMode::Materialized(ArtifactLocation::Directory(root)) => {
            Box::new(ArtifactSource::new(DirFetcher::new(root)))
        }
        ClientMode::Materialized(ArtifactLocation::Remote(base_url)) => {
            Box::new(ArtifactSource::new(HttpFetcher::new(base_url, FETCH_TIMEOUT)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_locations() {
        assert_eq!(
            ArtifactLocation::parse("https://docs.example.com/"),
            ArtifactLocation::Remote("https://docs.example.com/".to_string())
        );
        assert_eq!(
            ArtifactLocation::parse("dist"),
            ArtifactLocation::Directory(PathBuf::from("dist"))
        );
    }

    #[test]
    fn selects_strategy_by_mode() {
        let live = connect(ClientMode::Live(Arc::new(GraphHandle::default())));
        let materialized = connect(ClientMode::Materialized(ArtifactLocation::parse("dist")));

        assert_eq!(live.name(), "live");
        assert_eq!(materialized.name(), "artifact");
    }
}
