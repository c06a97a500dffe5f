//! Source of candidate pools.

use crate::profile::UserProfile;
use crate::Result;
use parking_lot::RwLock;
use std::future::Future;
use std::sync::Arc;

/// Supplies the full set of profiles eligible for recommendation.
///
/// Implementations may be slow; callers bound every fetch with a timeout.
pub trait ProfileStore: Send + Sync + 'static {
    fn fetch_profiles(&self) -> impl Future<Output = Result<Vec<UserProfile>>> + Send;
}

/// Profiles held in memory, replaceable at runtime.
#[derive(Debug, Default, Clone)]
pub struct InMemoryProfileStore {
    profiles: Arc<RwLock<Vec<UserProfile>>>,
}

impl InMemoryProfileStore {
    pub fn new(profiles: Vec<UserProfile>) -> Self {
        Self {
            profiles: Arc::new(RwLock::new(profiles)),
        }
    }

    pub fn replace(&self, profiles: Vec<UserProfile>) {
        *self.profiles.write() = profiles;
    }

    pub fn upsert(&self, profile: UserProfile) {
        let mut profiles = self.profiles.write();
        match profiles.iter_mut().find(|p| p.id == profile.id) {
            Some(existing) => *existing = profile,
            None => profiles.push(profile),
        }
    }

    pub fn len(&self) -> usize {
        self.profiles.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.read().is_empty()
    }
}

impl ProfileStore for InMemoryProfileStore {
    async fn fetch_profiles(&self) -> Result<Vec<UserProfile>> {
        Ok(self.profiles.read().clone())
    }
}
