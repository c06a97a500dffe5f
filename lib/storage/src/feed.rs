// Profile feed backed by a JSON export on disk
use peerlink_core::{Error, ProfileStore, Result, UserProfile};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads a JSON array of profile records on every fetch, so edits to the
/// file show up without a restart.
///
/// Records that fail to decode are skipped and logged; the rest are served.
#[derive(Debug, Clone)]
pub struct JsonFeedStore {
    path: PathBuf,
}

impl JsonFeedStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decode a feed document. Accepts a bare array or `{"users": [...]}`.
    pub fn parse(raw: &[u8]) -> Result<Vec<UserProfile>> {
        let document: Value = serde_json::from_slice(raw)
            .map_err(|e| Error::Upstream(format!("feed is not valid JSON: {}", e)))?;
        let records = match document {
            Value::Array(records) => records,
            Value::Object(mut map) => match map.remove("users") {
                Some(Value::Array(records)) => records,
                _ => {
                    return Err(Error::Upstream(
                        "feed object has no \"users\" array".to_string(),
                    ))
                }
            },
            _ => {
                return Err(Error::Upstream(
                    "feed must be a JSON array of profiles".to_string(),
                ))
            }
        };

        let total = records.len();
        let profiles: Vec<UserProfile> = records
            .into_iter()
            .enumerate()
            .filter_map(|(position, record)| match serde_json::from_value(record) {
                Ok(profile) => Some(profile),
                Err(e) => {
                    warn!(position, error = %e, "skipping malformed profile record");
                    None
                }
            })
            .collect();

        debug!(total, decoded = profiles.len(), "profile feed parsed");
        Ok(profiles)
    }
}

impl ProfileStore for JsonFeedStore {
    async fn fetch_profiles(&self) -> Result<Vec<UserProfile>> {
        let raw = tokio::fs::read(&self.path).await.map_err(|e| {
            Error::Upstream(format!("reading feed {}: {}", self.path.display(), e))
        })?;
        Self::parse(&raw)
    }
}
