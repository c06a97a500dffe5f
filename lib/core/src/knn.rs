//! Exact cosine k-nearest-neighbor index over scaled feature vectors.
//!
//! Corpora here are one profile per user, so a linear scan is used instead
//! of an approximate graph index.

use crate::normalizer::ScaledFeatureVector;
use crate::vector::cosine_distance;
use crate::{Error, Result};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

/// One query hit.
#[derive(Debug, Clone, PartialEq)]
pub struct Neighbor {
    pub id: String,
    /// Position of the hit in the index (aligned with [`NeighborIndex::ids`]).
    pub position: usize,
    /// Cosine distance in `[0, 2]`.
    pub distance: f32,
}

impl Neighbor {
    /// `100 * (1 - distance)`, clamped to `[0, 100]`.
    #[inline]
    pub fn similarity(&self) -> f32 {
        distance_to_similarity(self.distance)
    }
}

#[inline]
pub fn distance_to_similarity(distance: f32) -> f32 {
    (100.0 * (1.0 - distance)).clamp(0.0, 100.0)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeighborIndex {
    ids: Vec<String>,
    vectors: Vec<ScaledFeatureVector>,
    k: usize,
}

impl NeighborIndex {
    /// Build an index. `k` is capped at `corpus_size - 1`.
    pub fn build(ids: Vec<String>, vectors: Vec<ScaledFeatureVector>, configured_k: usize) -> Result<Self> {
        let k = configured_k.min(vectors.len().saturating_sub(1));
        Self::from_parts(ids, vectors, k)
    }

    /// Rebuild a persisted index, checking that ids and vectors line up.
    pub fn from_parts(ids: Vec<String>, vectors: Vec<ScaledFeatureVector>, k: usize) -> Result<Self> {
        if ids.len() != vectors.len() {
            return Err(Error::InvalidDimension {
                expected: ids.len(),
                actual: vectors.len(),
            });
        }
        if ids.is_empty() {
            return Err(Error::InsufficientData { required: 1, actual: 0 });
        }
        if k >= ids.len() {
            return Err(Error::InvalidConfig(format!(
                "k = {} must be smaller than the corpus size {}",
                k,
                ids.len()
            )));
        }
        Ok(Self { ids, vectors, k })
    }

    #[inline]
    pub fn k(&self) -> usize {
        self.k
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    #[inline]
    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    #[inline]
    pub fn vectors(&self) -> &[ScaledFeatureVector] {
        &self.vectors
    }

    /// The index's `k` nearest members, ascending by distance.
    pub fn query(&self, query: &ScaledFeatureVector) -> Vec<Neighbor> {
        self.query_n(query, self.k)
    }

    /// The `n` nearest members, ascending by distance; ties keep index order.
    pub fn query_n(&self, query: &ScaledFeatureVector, n: usize) -> Vec<Neighbor> {
        let mut scored: Vec<(usize, f32)> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| (position, cosine_distance(query.as_slice(), v.as_slice())))
            .collect();

        scored.sort_by(|a, b| {
            OrderedFloat(a.1)
                .cmp(&OrderedFloat(b.1))
                .then_with(|| a.0.cmp(&b.0))
        });
        scored.truncate(n);

        scored
            .into_iter()
            .map(|(position, distance)| Neighbor {
                id: self.ids[position].clone(),
                position,
                distance,
            })
            .collect()
    }
}
