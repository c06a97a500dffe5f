//! The pluggable scoring interface shared by every strategy.

use peerlink_core::{Error, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Which scoring algorithm produced a result.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strategy {
    #[default]
    #[serde(rename = "rule-based", alias = "rule_based")]
    RuleBased,
    #[serde(rename = "knn", alias = "nearest-neighbor")]
    NearestNeighbor,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RuleBased => "rule-based",
            Strategy::NearestNeighbor => "knn",
        }
    }

    /// Human-readable description reported next to results.
    pub fn algorithm(&self) -> &'static str {
        match self {
            Strategy::RuleBased => "Smart Priority (batch, semester, department, interests)",
            Strategy::NearestNeighbor => "K-Nearest Neighbors (cosine similarity over scaled profile features)",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rule-based" | "rule_based" | "rules" => Ok(Strategy::RuleBased),
            "knn" | "nearest-neighbor" => Ok(Strategy::NearestNeighbor),
            other => Err(Error::InvalidRequest(format!("unknown strategy '{}'", other))),
        }
    }
}

/// A candidate with its score in `[0, 100]` and per-signal contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredCandidate {
    pub id: String,
    pub score: f32,
    pub breakdown: BTreeMap<String, f32>,
    pub strategy: Strategy,
}

/// Scores every candidate in a pool against one target profile.
///
/// Implementations skip the target itself; exclusion of connections and
/// ordering are left to the [`Ranker`](crate::Ranker).
pub trait Scorer: Send + Sync {
    fn strategy(&self) -> Strategy;

    fn score_candidates(&self, target: &UserProfile, pool: &[UserProfile]) -> Vec<ScoredCandidate>;
}
