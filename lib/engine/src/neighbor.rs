//! Nearest-neighbor scoring against a fitted [`SimilarityModel`].

use crate::distance::round_score;
use crate::scorer::{ScoredCandidate, Scorer, Strategy};
use ahash::AHashSet;
use peerlink_core::{SimilarityModel, UserProfile};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const SIGNAL_COSINE: &str = "cosine_similarity";

/// Results at or below this similarity are dropped.
pub const DEFAULT_MIN_SIMILARITY: f32 = 20.0;

/// Scores the target's k nearest corpus members that are in the pool.
#[derive(Debug, Clone)]
pub struct NeighborScorer {
    model: Arc<SimilarityModel>,
    min_similarity: f32,
}

impl NeighborScorer {
    pub fn new(model: Arc<SimilarityModel>, min_similarity: f32) -> Self {
        Self { model, min_similarity }
    }
}

impl Scorer for NeighborScorer {
    fn strategy(&self) -> Strategy {
        Strategy::NearestNeighbor
    }

    fn score_candidates(&self, target: &UserProfile, pool: &[UserProfile]) -> Vec<ScoredCandidate> {
        let eligible: AHashSet<&str> = pool.iter().map(|p| p.id.as_str()).collect();
        let query = self.model.embed(target);

        self.model
            .index()
            .query(&query)
            .into_iter()
            .filter(|n| n.id != target.id && eligible.contains(n.id.as_str()))
            .filter_map(|n| {
                let similarity = thresholded_score(n.similarity(), self.min_similarity)?;
                Some(ScoredCandidate {
                    id: n.id,
                    score: similarity,
                    breakdown: BTreeMap::from([(SIGNAL_COSINE.to_string(), similarity)]),
                    strategy: Strategy::NearestNeighbor,
                })
            })
            .collect()
    }
}

/// Threshold on the unrounded similarity, then round for reporting.
#[inline]
fn thresholded_score(similarity: f32, min_similarity: f32) -> Option<f32> {
    (similarity > min_similarity).then(|| round_score(similarity))
}
