//! Persistence for PeerLink: fitted model artifacts and the JSON profile feed.

pub mod artifact;
pub mod feed;

pub use artifact::{ArtifactDescription, ArtifactStore, LatestPointer, ModelArtifact};
pub use feed::JsonFeedStore;
