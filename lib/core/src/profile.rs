//! User profile snapshots as delivered by the profile store.
//!
//! Records are decoded once at the boundary. Every field except the id is
//! optional, and the decoders are lenient: numbers are accepted where strings
//! are expected, `null` collapses to "absent", and a null or malformed list
//! decodes as the empty set.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;

/// Role value that sets the `role_flag` feature.
pub const FACULTY_ROLE: &str = "faculty";

/// A read-only snapshot of one user's profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(alias = "_id", alias = "user_id", deserialize_with = "id_string")]
    pub id: String,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Enrolment year, kept as text; the numeric reading lives in the feature extractor.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub batch: Option<String>,
    /// Free-form semester label such as `"3rd"` or `"Sem 5"`.
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, deserialize_with = "lenient_string", skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, deserialize_with = "lenient_set")]
    pub interests: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_set")]
    pub skills: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_set")]
    pub following: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_set")]
    pub followers: BTreeSet<String>,
    #[serde(default, deserialize_with = "lenient_set")]
    pub connections: BTreeSet<String>,
}

impl UserProfile {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_batch(mut self, batch: impl Into<String>) -> Self {
        self.batch = Some(batch.into());
        self
    }

    #[must_use]
    pub fn with_semester(mut self, semester: impl Into<String>) -> Self {
        self.semester = Some(semester.into());
        self
    }

    #[must_use]
    pub fn with_department(mut self, department: impl Into<String>) -> Self {
        self.department = Some(department.into());
        self
    }

    #[must_use]
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    #[must_use]
    pub fn with_interests<I, T>(mut self, interests: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.interests = interests.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_skills<I, T>(mut self, skills: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.skills = skills.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_following<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.following = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_followers<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.followers = ids.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn with_connections<I, T>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.connections = ids.into_iter().map(Into::into).collect();
        self
    }

    #[inline]
    pub fn is_faculty(&self) -> bool {
        self.role.as_deref() == Some(FACULTY_ROLE)
    }

    /// Number of follow edges touching this user in either direction.
    #[inline]
    pub fn engagement(&self) -> usize {
        self.following.len() + self.followers.len()
    }

    /// Ids that must never be recommended to this user: the user itself and
    /// everyone it is already connected to.
    pub fn excluded_ids(&self) -> BTreeSet<String> {
        let mut excluded = self.connections.clone();
        excluded.insert(self.id.clone());
        excluded
    }
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn id_string<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(value).ok_or_else(|| serde::de::Error::custom("profile id must be a non-empty string or number"))
}

fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.and_then(scalar_to_string))
}

fn lenient_set<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Array(items)) => items.into_iter().filter_map(scalar_to_string).collect(),
        _ => BTreeSet::new(),
    })
}
