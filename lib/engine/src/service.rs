//! Request orchestration: pool fetch, scoring, ranking.

use crate::config::EngineConfig;
use crate::explain::{RecommendationResponse, RecommendationResult};
use crate::neighbor::NeighborScorer;
use crate::rank::Ranker;
use crate::rule::RuleBasedScorer;
use crate::scorer::{Scorer, Strategy};
use ahash::AHashMap;
use peerlink_core::{
    BackgroundJobSystem, Error, ModelHandle, ModelSink, ModelStatus, ProfileStore, RefitJob,
    Result, SimilarityModel, UserProfile,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    #[serde(alias = "user_id")]
    pub target_user_id: String,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub strategy: Strategy,
}

impl RecommendationRequest {
    pub fn new(target_user_id: impl Into<String>, strategy: Strategy) -> Self {
        Self {
            target_user_id: target_user_id.into(),
            limit: None,
            strategy,
        }
    }

    #[must_use]
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RefitOutcome {
    Scheduled,
    AlreadyRunning,
}

/// Serves recommendations for one profile store.
pub struct RecommendationService<S: ProfileStore> {
    store: Arc<S>,
    config: EngineConfig,
    model: Arc<ModelHandle>,
    rule_scorer: RuleBasedScorer,
    sink: Option<Arc<dyn ModelSink>>,
    background: BackgroundJobSystem,
}

impl<S: ProfileStore> RecommendationService<S> {
    pub fn new(store: Arc<S>, config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let model = Arc::new(ModelHandle::new(config.model_max_age));
        Ok(Self {
            store,
            config,
            model,
            rule_scorer: RuleBasedScorer::new(),
            sink: None,
            background: BackgroundJobSystem::new()?,
        })
    }

    /// Persist every fitted snapshot through `sink` before it is installed.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn ModelSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Serve from an externally owned model handle.
    #[must_use]
    pub fn with_model_handle(mut self, handle: Arc<ModelHandle>) -> Self {
        self.model = handle;
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn model_handle(&self) -> &Arc<ModelHandle> {
        &self.model
    }

    pub fn model_status(&self) -> ModelStatus {
        self.model.status()
    }

    pub fn install_model(&self, model: SimilarityModel) -> Arc<SimilarityModel> {
        self.model.install(model)
    }

    pub fn invalidate_model(&self) {
        self.model.invalidate();
    }

    /// Fetch the candidate pool, bounded by `fetch_timeout`.
    pub async fn fetch_pool(&self) -> Result<Vec<UserProfile>> {
        let timeout = self.config.fetch_timeout;
        match tokio::time::timeout(timeout, self.store.fetch_profiles()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(timeout_ms = timeout.as_millis() as u64, "profile store timed out");
                Err(Error::UpstreamTimeout {
                    timeout_ms: timeout.as_millis() as u64,
                })
            }
        }
    }

    pub async fn recommend(&self, request: &RecommendationRequest) -> Result<RecommendationResponse> {
        let limit = request.limit.unwrap_or(self.config.default_limit);
        // reject before paying for the fetch
        Ranker::new(limit)?;

        let pool = self.fetch_pool().await?;
        self.recommend_from_pool(&request.target_user_id, &pool, request.strategy, limit)
    }

    /// Score and rank `pool` for `target_id`. Never touches the store.
    pub fn recommend_from_pool(
        &self,
        target_id: &str,
        pool: &[UserProfile],
        strategy: Strategy,
        limit: usize,
    ) -> Result<RecommendationResponse> {
        let ranker = Ranker::new(limit)?;

        if pool.is_empty() {
            info!(target = %target_id, "empty candidate pool");
            return Ok(RecommendationResponse::unavailable(
                "No users found in candidate pool",
                0,
                strategy,
            ));
        }

        let Some(target) = pool.iter().find(|p| p.id == target_id) else {
            info!(target = %target_id, pool = pool.len(), "target not in candidate pool");
            return Ok(RecommendationResponse::unavailable(
                format!("User {} not found in candidate pool", target_id),
                pool.len(),
                strategy,
            ));
        };

        let mut stale = false;
        let neighbor_scorer;
        let scorer: &dyn Scorer = match strategy {
            Strategy::RuleBased => &self.rule_scorer,
            Strategy::NearestNeighbor => {
                let lease = self.model.acquire()?;
                if lease.stale {
                    stale = true;
                    warn!(model = %lease.model.id(), "serving from stale similarity model");
                    if pool.len() >= self.config.model.min_training_profiles {
                        self.schedule_refit(pool.to_vec());
                    } else {
                        debug!(pool = pool.len(), "pool too small to refit from");
                    }
                }
                neighbor_scorer = NeighborScorer::new(lease.model, self.config.min_similarity);
                &neighbor_scorer
            }
        };

        let scored = scorer.score_candidates(target, pool);
        let considered = scored.len();
        let ranked = ranker.rank(scored, &target.excluded_ids());

        let by_id: AHashMap<&str, &UserProfile> = pool.iter().map(|p| (p.id.as_str(), p)).collect();
        let data: Vec<RecommendationResult> = ranked
            .into_iter()
            .map(|c| {
                let profile = by_id.get(c.id.as_str()).copied();
                RecommendationResult::from_scored(c, profile)
            })
            .collect();

        debug!(
            target = %target_id,
            strategy = %strategy,
            pool = pool.len(),
            scored = considered,
            returned = data.len(),
            "recommendations ranked"
        );

        Ok(RecommendationResponse::found(data, pool.len(), strategy).with_stale_model(stale))
    }

    /// Fit and install a snapshot on the calling thread.
    pub fn fit_blocking(&self, profiles: &[UserProfile]) -> Result<Arc<SimilarityModel>> {
        let _guard = self
            .model
            .try_begin_fit()
            .ok_or_else(|| Error::InvalidRequest("a model fit is already running".to_string()))?;

        let model = SimilarityModel::fit(profiles, &self.config.model)?;
        if let Some(sink) = &self.sink {
            sink.persist(&model)?;
        }
        Ok(self.model.install(model))
    }

    /// Fetch the corpus and refit in the background. Returns without waiting
    /// for the fit.
    pub async fn request_refit(&self) -> Result<RefitOutcome> {
        let profiles = self.fetch_pool().await?;
        Ok(self.schedule_refit(profiles))
    }

    fn schedule_refit(&self, profiles: Vec<UserProfile>) -> RefitOutcome {
        match self.model.try_begin_fit() {
            Some(guard) => {
                info!(corpus = profiles.len(), "scheduling background refit");
                self.background.submit(Box::new(RefitJob::new(
                    profiles,
                    self.config.model.clone(),
                    self.sink.clone(),
                    guard,
                )));
                RefitOutcome::Scheduled
            }
            None => RefitOutcome::AlreadyRunning,
        }
    }
}
