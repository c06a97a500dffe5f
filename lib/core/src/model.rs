//! Fitted similarity model snapshots and the handle that serves them.
//!
//! A [`SimilarityModel`] is immutable once built. The [`ModelHandle`] holds
//! the currently active snapshot behind an `Arc`; readers clone the `Arc`
//! under a short read lock and keep scoring against it even if a refit swaps
//! in a newer snapshot meanwhile.

use crate::features::{FeatureExtractor, FeatureVector};
use crate::knn::NeighborIndex;
use crate::normalizer::{Normalizer, ScaledFeatureVector};
use crate::profile::UserProfile;
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use uuid::Uuid;

/// Fit-time parameters.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    /// Requested neighbor count; the index caps it at `corpus_size - 1`.
    pub neighbors_k: usize,
    /// Smallest corpus a fit accepts.
    pub min_training_profiles: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            neighbors_k: 6,
            min_training_profiles: 5,
        }
    }
}

impl ModelConfig {
    pub fn validate(&self) -> Result<()> {
        if self.neighbors_k == 0 {
            return Err(Error::InvalidConfig("neighbors_k must be at least 1".to_string()));
        }
        if self.min_training_profiles < 2 {
            return Err(Error::InvalidConfig(
                "min_training_profiles must be at least 2".to_string(),
            ));
        }
        Ok(())
    }
}

/// Immutable fitted snapshot: scaler, index and the ids aligned with it.
#[derive(Debug, Clone)]
pub struct SimilarityModel {
    id: Uuid,
    normalizer: Normalizer,
    index: NeighborIndex,
    fitted_at: DateTime<Utc>,
}

impl SimilarityModel {
    /// Batch fit over a full corpus of profiles.
    pub fn fit(profiles: &[UserProfile], config: &ModelConfig) -> Result<Self> {
        config.validate()?;
        if profiles.len() < config.min_training_profiles {
            return Err(Error::InsufficientData {
                required: config.min_training_profiles,
                actual: profiles.len(),
            });
        }

        let extractor = FeatureExtractor::new();
        let raw: Vec<FeatureVector> = profiles.par_iter().map(|p| extractor.extract(p)).collect();
        let normalizer = Normalizer::fit(&raw)?;
        let scaled = normalizer.transform_all(&raw);
        let ids = profiles.iter().map(|p| p.id.clone()).collect();
        let index = NeighborIndex::build(ids, scaled, config.neighbors_k)?;

        let model = Self {
            id: Uuid::new_v4(),
            normalizer,
            index,
            fitted_at: Utc::now(),
        };
        info!(
            model = %model.id,
            corpus = model.corpus_size(),
            k = model.index.k(),
            "similarity model fitted"
        );
        Ok(model)
    }

    pub fn from_parts(
        id: Uuid,
        normalizer: Normalizer,
        index: NeighborIndex,
        fitted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            normalizer,
            index,
            fitted_at,
        }
    }

    #[inline]
    pub fn id(&self) -> Uuid {
        self.id
    }

    #[inline]
    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    #[inline]
    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }

    #[inline]
    pub fn fitted_at(&self) -> DateTime<Utc> {
        self.fitted_at
    }

    #[inline]
    pub fn corpus_size(&self) -> usize {
        self.index.len()
    }

    /// Extract and scale a profile with this snapshot's frozen parameters.
    pub fn embed(&self, profile: &UserProfile) -> ScaledFeatureVector {
        self.normalizer.transform(&FeatureExtractor::new().extract(profile))
    }

    /// Whether the snapshot is older than `max_age`.
    pub fn is_older_than(&self, max_age: Duration) -> bool {
        Utc::now()
            .signed_duration_since(self.fitted_at)
            .to_std()
            .map(|age| age > max_age)
            .unwrap_or(false)
    }
}

/// Receives each freshly fitted snapshot before it is swapped in.
pub trait ModelSink: Send + Sync {
    fn persist(&self, model: &SimilarityModel) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelState {
    Unfitted,
    Fitting,
    Fitted,
    Stale,
}

/// Snapshot acquired for one request.
#[derive(Debug, Clone)]
pub struct ModelLease {
    pub model: Arc<SimilarityModel>,
    pub stale: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModelStatus {
    pub state: ModelState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fitted_at: Option<DateTime<Utc>>,
    pub corpus_size: usize,
    pub k: usize,
}

/// Owner of the active snapshot.
pub struct ModelHandle {
    current: RwLock<Option<Arc<SimilarityModel>>>,
    fitting: AtomicBool,
    invalidated: AtomicBool,
    max_age: Duration,
}

impl ModelHandle {
    pub fn new(max_age: Duration) -> Self {
        Self {
            current: RwLock::new(None),
            fitting: AtomicBool::new(false),
            invalidated: AtomicBool::new(false),
            max_age,
        }
    }

    pub fn with_model(model: SimilarityModel, max_age: Duration) -> Self {
        let handle = Self::new(max_age);
        handle.install(model);
        handle
    }

    /// Swap in a new snapshot. In-flight leases keep the old one alive.
    pub fn install(&self, model: SimilarityModel) -> Arc<SimilarityModel> {
        let model = Arc::new(model);
        let previous = self.current.write().replace(model.clone());
        self.invalidated.store(false, Ordering::Release);
        info!(
            model = %model.id(),
            replaced = ?previous.map(|p| p.id()),
            "similarity model installed"
        );
        model
    }

    /// Mark the active snapshot stale; it keeps serving until a refit lands.
    pub fn invalidate(&self) {
        self.invalidated.store(true, Ordering::Release);
    }

    pub fn current(&self) -> Option<Arc<SimilarityModel>> {
        self.current.read().clone()
    }

    pub fn acquire(&self) -> Result<ModelLease> {
        let model = self.current().ok_or(Error::ModelNotFitted)?;
        let stale = self.is_stale(&model);
        Ok(ModelLease { model, stale })
    }

    fn is_stale(&self, model: &SimilarityModel) -> bool {
        self.invalidated.load(Ordering::Acquire) || model.is_older_than(self.max_age)
    }

    pub fn state(&self) -> ModelState {
        if self.fitting.load(Ordering::Acquire) {
            return ModelState::Fitting;
        }
        match self.current() {
            None => ModelState::Unfitted,
            Some(model) if self.is_stale(&model) => ModelState::Stale,
            Some(_) => ModelState::Fitted,
        }
    }

    pub fn status(&self) -> ModelStatus {
        let current = self.current();
        ModelStatus {
            state: self.state(),
            model_id: current.as_ref().map(|m| m.id()),
            fitted_at: current.as_ref().map(|m| m.fitted_at()),
            corpus_size: current.as_ref().map(|m| m.corpus_size()).unwrap_or(0),
            k: current.as_ref().map(|m| m.index().k()).unwrap_or(0),
        }
    }

    /// Claim the single fit slot. Returns `None` while another fit runs.
    pub fn try_begin_fit(self: &Arc<Self>) -> Option<FitGuard> {
        self.fitting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| FitGuard {
                handle: self.clone(),
            })
    }
}

/// Held for the duration of a fit; releases the fit slot on drop.
pub struct FitGuard {
    handle: Arc<ModelHandle>,
}

impl FitGuard {
    pub fn handle(&self) -> &Arc<ModelHandle> {
        &self.handle
    }
}

impl Drop for FitGuard {
    fn drop(&mut self) {
        self.handle.fitting.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(n: usize) -> Vec<UserProfile> {
        (0..n)
            .map(|i| {
                UserProfile::new(format!("u{}", i))
                    .with_batch(format!("{}", 2020 + (i % 4)))
                    .with_semester(format!("{}th", 1 + (i % 8)))
                    .with_interests((0..(i % 5)).map(|j| format!("topic{}", j)))
            })
            .collect()
    }

    #[test]
    fn test_fit_requires_minimum_corpus() {
        let result = SimilarityModel::fit(&corpus(3), &ModelConfig::default());
        assert!(matches!(
            result,
            Err(Error::InsufficientData { required: 5, actual: 3 })
        ));
    }

    #[test]
    fn test_fit_caps_k() {
        let model = SimilarityModel::fit(&corpus(5), &ModelConfig::default()).unwrap();
        assert_eq!(model.index().k(), 4);
        assert_eq!(model.corpus_size(), 5);
        assert_eq!(model.index().ids()[0], "u0");
    }

    #[test]
    fn test_handle_lifecycle() {
        let handle = Arc::new(ModelHandle::new(Duration::from_secs(3600)));
        assert_eq!(handle.state(), ModelState::Unfitted);
        assert!(matches!(handle.acquire(), Err(Error::ModelNotFitted)));

        {
            let _guard = handle.try_begin_fit().unwrap();
            assert_eq!(handle.state(), ModelState::Fitting);
            assert!(handle.try_begin_fit().is_none());
        }

        handle.install(SimilarityModel::fit(&corpus(8), &ModelConfig::default()).unwrap());
        assert_eq!(handle.state(), ModelState::Fitted);
        assert!(!handle.acquire().unwrap().stale);

        handle.invalidate();
        assert_eq!(handle.state(), ModelState::Stale);
        assert!(handle.acquire().unwrap().stale);
    }

    #[test]
    fn test_in_flight_lease_survives_swap() {
        let handle = ModelHandle::new(Duration::from_secs(3600));
        let first = handle.install(SimilarityModel::fit(&corpus(6), &ModelConfig::default()).unwrap());
        let lease = handle.acquire().unwrap();

        let second = handle.install(SimilarityModel::fit(&corpus(9), &ModelConfig::default()).unwrap());
        assert_ne!(first.id(), second.id());
        assert_eq!(lease.model.id(), first.id());
        assert_eq!(lease.model.corpus_size(), 6);
        assert_eq!(handle.current().unwrap().corpus_size(), 9);
    }

    #[test]
    fn test_zero_max_age_is_stale() {
        let handle = ModelHandle::with_model(
            SimilarityModel::fit(&corpus(6), &ModelConfig::default()).unwrap(),
            Duration::ZERO,
        );
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(handle.state(), ModelState::Stale);
    }
}
