//! Isomorphic content client.
//!
//! Page code talks to a [`ContentSource`]. During development that is a
//! [`LiveSource`] answering from the current in-process graph; after a build it
//! is an [`ArtifactSource`] fetching the precomputed artifact of each query.
//! Both return the same [`ContentEntry`](lattice_graph::ContentEntry) values for
//! the same content, and the choice is made once through [`ClientMode`].

pub mod artifact;
pub mod live;
pub mod mode;
pub mod source;

pub use artifact::{ArtifactFetcher, ArtifactSource, DirFetcher, FetchError, HttpFetcher};
pub use live::LiveSource;
pub use mode::{connect, ArtifactLocation, ClientMode};
pub use source::{ClientError, ContentSource};
