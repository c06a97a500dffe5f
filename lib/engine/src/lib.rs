//! # PeerLink Engine
//!
//! Scoring and ranking on top of [`peerlink_core`].
//!
//! Two interchangeable strategies implement [`Scorer`]:
//!
//! - [`RuleBasedScorer`] - Weighted categorical and interest-overlap rules, no model required
//! - [`NeighborScorer`] - Cosine k-nearest-neighbor search against a fitted snapshot
//!
//! [`Ranker`] applies exclusions, ordering and truncation, and
//! [`RecommendationService`] ties a profile store, the active model and
//! both strategies together.
//!
//! ## Example
//!
//! ```rust
//! use peerlink_core::UserProfile;
//! use peerlink_engine::RuleBasedScorer;
//!
//! let a = UserProfile::new("a").with_batch("2023").with_semester("3").with_department("CS");
//! let b = UserProfile::new("b").with_batch("2023").with_semester("3").with_department("CS");
//!
//! let score = RuleBasedScorer::new().score_pair(&a, &b);
//! assert_eq!(score.score, 90.0);
//! ```

pub mod config;
pub mod distance;
pub mod explain;
pub mod neighbor;
pub mod rank;
pub mod rule;
pub mod scorer;
pub mod service;

pub use config::EngineConfig;
pub use explain::{ErrorDetail, ErrorResponse, RecommendationResponse, RecommendationResult};
pub use neighbor::{NeighborScorer, DEFAULT_MIN_SIMILARITY};
pub use rank::{Ranker, DEFAULT_LIMIT};
pub use rule::{RuleBasedScorer, RuleScore};
pub use scorer::{ScoredCandidate, Scorer, Strategy};
pub use service::{RecommendationRequest, RecommendationService, RefitOutcome};
