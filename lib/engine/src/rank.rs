//! Exclusion, ordering and truncation of scored candidates.

use crate::scorer::ScoredCandidate;
use ahash::AHashSet;
use ordered_float::OrderedFloat;
use peerlink_core::{Error, Result};
use std::collections::BTreeSet;

pub const DEFAULT_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy)]
pub struct Ranker {
    limit: usize,
}

impl Default for Ranker {
    fn default() -> Self {
        Self { limit: DEFAULT_LIMIT }
    }
}

impl Ranker {
    pub fn new(limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(Error::InvalidRequest("limit must be at least 1".to_string()));
        }
        Ok(Self { limit })
    }

    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drop excluded ids, sort by score descending then id ascending, and
    /// keep the first `limit`. A repeated id keeps only its best entry.
    pub fn rank(&self, candidates: Vec<ScoredCandidate>, exclusions: &BTreeSet<String>) -> Vec<ScoredCandidate> {
        let mut kept: Vec<ScoredCandidate> = candidates
            .into_iter()
            .filter(|c| !exclusions.contains(&c.id))
            .collect();

        kept.sort_by(|a, b| {
            OrderedFloat(b.score)
                .cmp(&OrderedFloat(a.score))
                .then_with(|| a.id.cmp(&b.id))
        });

        let mut seen = AHashSet::with_capacity(kept.len());
        kept.retain(|c| seen.insert(c.id.clone()));
        kept.truncate(self.limit);
        kept
    }
}
