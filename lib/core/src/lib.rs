//! # PeerLink Core
//!
//! Core library for the PeerLink recommendation engine.
//!
//! This crate provides the data model and the numeric pipeline shared by
//! every scoring strategy:
//!
//! - [`UserProfile`] - Profile snapshot decoded leniently at the boundary
//! - [`FeatureExtractor`] - Fixed six-dimensional [`FeatureVector`]s
//! - [`Normalizer`] - Frozen per-dimension standardization
//! - [`NeighborIndex`] - Exact cosine k-nearest-neighbor index
//! - [`SimilarityModel`] / [`ModelHandle`] - Immutable fitted snapshots and their atomic swap
//! - [`ProfileStore`] - Source of candidate pools
//!
//! ## Example
//!
//! ```rust
//! use peerlink_core::{ModelConfig, SimilarityModel, UserProfile};
//!
//! let corpus: Vec<UserProfile> = (0..10)
//!     .map(|i| {
//!         UserProfile::new(format!("u{}", i))
//!             .with_batch(format!("{}", 2020 + i % 3))
//!             .with_semester(format!("{}th", 1 + i % 6))
//!     })
//!     .collect();
//!
//! let model = SimilarityModel::fit(&corpus, &ModelConfig::default()).unwrap();
//! let query = model.embed(&corpus[0]);
//! let neighbors = model.index().query(&query);
//! assert!(neighbors.len() <= 6);
//! ```

pub mod error;
pub mod profile;
pub mod features;
pub mod normalizer;
pub mod vector;
pub mod knn;
pub mod model;
pub mod store;
pub mod background;

pub use error::{Error, ErrorCategory, Result};
pub use profile::UserProfile;
pub use features::{Extraction, FeatureExtractor, FeatureVector, ParsedField, FEATURE_DIM, FEATURE_NAMES};
pub use normalizer::{Normalizer, ScaledFeatureVector};
pub use knn::{distance_to_similarity, Neighbor, NeighborIndex};
pub use model::{
    FitGuard, ModelConfig, ModelHandle, ModelLease, ModelSink, ModelState, ModelStatus,
    SimilarityModel,
};
pub use store::{InMemoryProfileStore, ProfileStore};
pub use background::{BackgroundJob, BackgroundJobSystem, RefitJob};
