use crate::neighbor::DEFAULT_MIN_SIMILARITY;
use crate::rank::DEFAULT_LIMIT;
use peerlink_core::{Error, ModelConfig, Result};
use std::time::Duration;

/// Serving configuration for a [`RecommendationService`](crate::RecommendationService).
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub model: ModelConfig,
    /// KNN results at or below this similarity are dropped.
    pub min_similarity: f32,
    /// Limit used when a request does not specify one.
    pub default_limit: usize,
    /// Upper bound on a candidate-pool fetch.
    pub fetch_timeout: Duration,
    /// Snapshots older than this are served as stale and trigger a refit.
    pub model_max_age: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            default_limit: DEFAULT_LIMIT,
            fetch_timeout: Duration::from_secs(5),
            model_max_age: Duration::from_secs(24 * 60 * 60),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.model.validate()?;
        if !(0.0..100.0).contains(&self.min_similarity) {
            return Err(Error::InvalidConfig(format!(
                "min_similarity must be in [0, 100), got {}",
                self.min_similarity
            )));
        }
        if self.default_limit == 0 {
            return Err(Error::InvalidConfig("default_limit must be at least 1".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(Error::InvalidConfig("fetch_timeout must be positive".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = EngineConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.model.neighbors_k, 6);
        assert_eq!(config.min_similarity, 20.0);
        assert_eq!(config.default_limit, 10);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = EngineConfig {
            default_limit: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));

        let config = EngineConfig {
            min_similarity: 150.0,
            ..EngineConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
