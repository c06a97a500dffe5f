//! Per-dimension standardization (`(x - mean) / std`).
//!
//! Parameters are fitted once on a reference corpus and then frozen; the same
//! [`Normalizer`] instance scales both the corpus and every later query.

use crate::features::{FeatureVector, FEATURE_DIM};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// A feature vector after standardization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScaledFeatureVector([f32; FEATURE_DIM]);

impl ScaledFeatureVector {
    #[inline]
    #[must_use]
    pub fn new(values: [f32; FEATURE_DIM]) -> Self {
        Self(values)
    }

    #[inline]
    #[must_use]
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    #[inline]
    #[must_use]
    pub fn values(&self) -> [f32; FEATURE_DIM] {
        self.0
    }
}

/// Frozen scaler parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Normalizer {
    mean: [f32; FEATURE_DIM],
    std: [f32; FEATURE_DIM],
}

impl Normalizer {
    /// Fit mean and population standard deviation per dimension.
    ///
    /// A dimension with zero spread gets `std = 1` so the transform stays finite.
    pub fn fit(corpus: &[FeatureVector]) -> Result<Self> {
        if corpus.is_empty() {
            return Err(Error::InsufficientData { required: 1, actual: 0 });
        }

        let n = corpus.len() as f64;
        let mut mean = [0.0f32; FEATURE_DIM];
        let mut std = [1.0f32; FEATURE_DIM];

        for dim in 0..FEATURE_DIM {
            let sum: f64 = corpus.iter().map(|v| v.values()[dim] as f64).sum();
            let mu = sum / n;
            let variance: f64 = corpus
                .iter()
                .map(|v| {
                    let d = v.values()[dim] as f64 - mu;
                    d * d
                })
                .sum::<f64>()
                / n;
            let sigma = variance.sqrt() as f32;

            mean[dim] = mu as f32;
            std[dim] = if sigma > 0.0 && sigma.is_finite() { sigma } else { 1.0 };
        }

        Ok(Self { mean, std })
    }

    /// Rebuild a normalizer from persisted parameters.
    pub fn from_parts(mean: [f32; FEATURE_DIM], std: [f32; FEATURE_DIM]) -> Result<Self> {
        if let Some(bad) = std.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(Error::Serialization(format!(
                "scaler standard deviation must be positive and finite, got {}",
                bad
            )));
        }
        if mean.iter().any(|m| !m.is_finite()) {
            return Err(Error::Serialization("scaler mean must be finite".to_string()));
        }
        Ok(Self { mean, std })
    }

    #[inline]
    pub fn mean(&self) -> &[f32; FEATURE_DIM] {
        &self.mean
    }

    #[inline]
    pub fn std(&self) -> &[f32; FEATURE_DIM] {
        &self.std
    }

    #[inline]
    pub fn transform(&self, vector: &FeatureVector) -> ScaledFeatureVector {
        let raw = vector.values();
        let mut scaled = [0.0f32; FEATURE_DIM];
        for dim in 0..FEATURE_DIM {
            scaled[dim] = (raw[dim] - self.mean[dim]) / self.std[dim];
        }
        ScaledFeatureVector(scaled)
    }

    pub fn transform_all(&self, vectors: &[FeatureVector]) -> Vec<ScaledFeatureVector> {
        vectors.iter().map(|v| self.transform(v)).collect()
    }
}
