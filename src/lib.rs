//! # PeerLink
//!
//! "People you may know" recommendations for a campus social network.
//!
//! PeerLink scores every candidate in a pool against a target user and
//! returns a ranked, explainable list. Two strategies are available:
//!
//! - **Rule-based**: weighted matches on batch, semester and department plus
//!   interest overlap. Needs no model.
//! - **Nearest neighbor**: cosine k-NN over standardized six-dimensional
//!   profile vectors, served from an immutable fitted snapshot.
//!
//! ## Quick Start
//!
//! ### As a Server
//!
//! ```bash
//! peerlink --feed users.json --artifacts-dir ./data/models train
//! peerlink --feed users.json --artifacts-dir ./data/models serve --port 8000
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use peerlink::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<()> {
//! let store = Arc::new(InMemoryProfileStore::new(vec![
//!     UserProfile::new("u1").with_batch("2023").with_semester("3rd").with_department("CS"),
//!     UserProfile::new("u2").with_batch("2023").with_semester("3rd").with_department("CS"),
//! ]));
//! let service = RecommendationService::new(store, EngineConfig::default())?;
//!
//! let response = service
//!     .recommend(&RecommendationRequest::new("u1", Strategy::RuleBased))
//!     .await?;
//! for r in &response.data {
//!     println!("{} {:.1} {:?}", r.candidate_id, r.similarity_score, r.breakdown);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Crate Structure
//!
//! - `peerlink-core` - Profiles, feature extraction, scaling, the KNN index and model snapshots
//! - `peerlink-engine` - Scorers, ranking, response types and the recommendation service
//! - `peerlink-storage` - Checksummed model artifacts and the JSON profile feed
//! - `peerlink-api` - REST API

// Re-export core types
pub use peerlink_core::{
    Error, ErrorCategory, FeatureExtractor, FeatureVector, InMemoryProfileStore, ModelConfig,
    ModelHandle, ModelState, ModelStatus, NeighborIndex, Normalizer, ProfileStore, Result,
    SimilarityModel, UserProfile,
};

// Re-export engine
pub use peerlink_engine::{
    EngineConfig, NeighborScorer, Ranker, RecommendationRequest, RecommendationResponse,
    RecommendationResult, RecommendationService, RefitOutcome, RuleBasedScorer, ScoredCandidate,
    Scorer, Strategy,
};

// Re-export storage
pub use peerlink_storage::{ArtifactStore, JsonFeedStore};

// Re-export API
pub use peerlink_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        ArtifactStore, EngineConfig, Error, InMemoryProfileStore, JsonFeedStore, ModelConfig,
        ProfileStore, RecommendationRequest, RecommendationResponse, RecommendationService,
        RestApi, Result, Scorer, SimilarityModel, Strategy, UserProfile,
    };
}
