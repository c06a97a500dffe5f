//! Explainable output structures
//!
//! Every recommendation carries the per-signal contributions that produced
//! its score, so callers can show why a person was suggested.

use crate::scorer::{ScoredCandidate, Strategy};
use peerlink_core::{Error, ErrorCategory, UserProfile};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One recommended person.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    pub candidate_id: String,
    /// Score in `[0, 100]`
    pub similarity_score: f32,
    /// Signal name to score contribution
    pub breakdown: BTreeMap<String, f32>,
    pub strategy: Strategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl RecommendationResult {
    /// Attach display fields from the candidate's profile when available.
    pub fn from_scored(scored: ScoredCandidate, profile: Option<&UserProfile>) -> Self {
        Self {
            candidate_id: scored.id,
            similarity_score: scored.score,
            breakdown: scored.breakdown,
            strategy: scored.strategy,
            name: profile.and_then(|p| p.name.clone()),
            username: profile.and_then(|p| p.username.clone()),
        }
    }
}

/// Response to a recommendation request.
///
/// `success = false` with empty `data` is a soft failure (empty pool or
/// unknown target), not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub success: bool,
    pub data: Vec<RecommendationResult>,
    pub total_candidates: usize,
    pub message: String,
    /// Why `data` is empty on a soft failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ErrorCategory>,
    pub strategy: Strategy,
    pub algorithm: String,
    /// Set when results came from a snapshot past its freshness threshold.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub stale_model: bool,
}

impl RecommendationResponse {
    pub fn found(data: Vec<RecommendationResult>, total_candidates: usize, strategy: Strategy) -> Self {
        Self {
            success: true,
            message: format!("Found {} recommendations", data.len()),
            data,
            total_candidates,
            reason: None,
            strategy,
            algorithm: strategy.algorithm().to_string(),
            stale_model: false,
        }
    }

    pub fn unavailable(message: impl Into<String>, total_candidates: usize, strategy: Strategy) -> Self {
        Self {
            success: false,
            data: Vec::new(),
            total_candidates,
            message: message.into(),
            reason: Some(ErrorCategory::DataUnavailable),
            strategy,
            algorithm: strategy.algorithm().to_string(),
            stale_model: false,
        }
    }

    #[must_use]
    pub fn with_stale_model(mut self, stale: bool) -> Self {
        self.stale_model = stale;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub category: ErrorCategory,
    pub detail: String,
}

/// Structured error object: `{"error": {"category": ..., "detail": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

impl From<&Error> for ErrorResponse {
    fn from(e: &Error) -> Self {
        Self {
            error: ErrorDetail {
                category: e.category(),
                detail: e.to_string(),
            },
        }
    }
}
