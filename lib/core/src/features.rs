//! Fixed-schema feature extraction.
//!
//! Every profile maps to exactly [`FEATURE_DIM`] numbers, in this order:
//!
//! | index | feature            | source                                  |
//! |-------|--------------------|-----------------------------------------|
//! | 0     | `batch`            | batch parsed as a number                |
//! | 1     | `semester`         | digits of the semester label            |
//! | 2     | `role_flag`        | 1 for faculty, else 0                   |
//! | 3     | `interest_count`   | number of interests                     |
//! | 4     | `skill_count`      | number of skills                        |
//! | 5     | `engagement_count` | `|following| + |followers|`             |
//!
//! Extraction never fails. Unparsable numeric fields fall back to zero and
//! are reported through [`ParsedField::Defaulted`].

use crate::profile::UserProfile;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const FEATURE_DIM: usize = 6;

pub const FEATURE_NAMES: [&str; FEATURE_DIM] = [
    "batch",
    "semester",
    "role_flag",
    "interest_count",
    "skill_count",
    "engagement_count",
];

/// Raw feature vector for one profile.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector([f32; FEATURE_DIM]);

impl FeatureVector {
    #[inline]
    #[must_use]
    pub fn new(values: [f32; FEATURE_DIM]) -> Self {
        Self(values)
    }

    #[inline]
    #[must_use]
    pub fn dim(&self) -> usize {
        FEATURE_DIM
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

/// Outcome of reading one numeric field.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedField {
    Parsed(f32),
    /// Field absent; zero is used.
    Missing,
    /// Field present but unreadable; zero is used.
    Defaulted { raw: String },
}

impl ParsedField {
    #[inline]
    pub fn value(&self) -> f32 {
        match self {
            ParsedField::Parsed(v) => *v,
            ParsedField::Missing | ParsedField::Defaulted { .. } => 0.0,
        }
    }

    #[inline]
    pub fn is_defaulted(&self) -> bool {
        matches!(self, ParsedField::Defaulted { .. })
    }
}

/// Parse an enrolment year. Accepts anything `f32::from_str` accepts after trimming.
pub fn parse_batch(raw: Option<&str>) -> ParsedField {
    match raw {
        None => ParsedField::Missing,
        Some(s) => match s.trim().parse::<f32>() {
            Ok(v) if v.is_finite() => ParsedField::Parsed(v),
            _ => ParsedField::Defaulted { raw: s.to_string() },
        },
    }
}

/// Parse a semester label by keeping only its digits, so `"3rd"` and
/// `"Sem 5"` read as 3 and 5.
pub fn parse_semester(raw: Option<&str>) -> ParsedField {
    let Some(s) = raw else {
        return ParsedField::Missing;
    };
    let lowered = s.to_lowercase().replace("sem", "");
    let digits: String = lowered.chars().filter(char::is_ascii_digit).collect();
    match digits.parse::<f32>() {
        Ok(v) => ParsedField::Parsed(v),
        Err(_) => ParsedField::Defaulted { raw: s.to_string() },
    }
}

/// Feature vector together with the parse outcomes that produced it.
#[derive(Debug, Clone)]
pub struct Extraction {
    pub vector: FeatureVector,
    pub batch: ParsedField,
    pub semester: ParsedField,
}

impl Extraction {
    /// Names of the features that fell back to zero because of malformed input.
    pub fn defaulted_features(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.batch.is_defaulted() {
            names.push(FEATURE_NAMES[0]);
        }
        if self.semester.is_defaulted() {
            names.push(FEATURE_NAMES[1]);
        }
        names
    }
}

/// Maps profiles to [`FeatureVector`]s. Stateless and deterministic.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureExtractor;

impl FeatureExtractor {
    pub fn new() -> Self {
        Self
    }

    pub fn extract(&self, profile: &UserProfile) -> FeatureVector {
        self.extract_detailed(profile).vector
    }

    pub fn extract_detailed(&self, profile: &UserProfile) -> Extraction {
        let batch = parse_batch(profile.batch.as_deref());
        let semester = parse_semester(profile.semester.as_deref());

        let vector = FeatureVector::new([
            batch.value(),
            semester.value(),
            if profile.is_faculty() { 1.0 } else { 0.0 },
            profile.interests.len() as f32,
            profile.skills.len() as f32,
            profile.engagement() as f32,
        ]);

        let extraction = Extraction { vector, batch, semester };
        for (name, field) in [(FEATURE_NAMES[0], &extraction.batch), (FEATURE_NAMES[1], &extraction.semester)] {
            if let ParsedField::Defaulted { raw } = field {
                debug!(profile = %profile.id, feature = name, raw = %raw, "malformed feature defaulted to 0");
            }
        }
        extraction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_profile_has_full_dimension() {
        let v = FeatureExtractor::new().extract(&UserProfile::new("empty"));
        assert_eq!(v.dim(), FEATURE_DIM);
        assert_eq!(v.as_slice().len(), 6);
        assert!(v.as_slice().iter().all(|x| *x == 0.0));
    }

    #[test]
    fn test_full_profile() {
        let profile = UserProfile::new("u")
            .with_batch("2023")
            .with_semester("3rd")
            .with_role("faculty")
            .with_interests(["ai", "music"])
            .with_skills(["rust", "go", "sql"])
            .with_following(["a", "b"])
            .with_followers(["c"]);

        let v = FeatureExtractor::new().extract(&profile);
        assert_eq!(v.values(), [2023.0, 3.0, 1.0, 2.0, 3.0, 3.0]);
    }

    #[test]
    fn test_semester_parsing() {
        assert_eq!(parse_semester(Some("5th")), ParsedField::Parsed(5.0));
        assert_eq!(parse_semester(Some("Sem 7")), ParsedField::Parsed(7.0));
        assert_eq!(parse_semester(Some("10")), ParsedField::Parsed(10.0));
        assert_eq!(parse_semester(None), ParsedField::Missing);
        assert!(parse_semester(Some("final")).is_defaulted());
    }

    #[test]
    fn test_batch_parsing() {
        assert_eq!(parse_batch(Some(" 2021 ")), ParsedField::Parsed(2021.0));
        assert_eq!(parse_batch(Some("2021.0")), ParsedField::Parsed(2021.0));
        assert!(parse_batch(Some("twenty")).is_defaulted());
        assert!(parse_batch(Some("NaN")).is_defaulted());
        assert_eq!(parse_batch(None).value(), 0.0);
    }

    #[test]
    fn test_defaulted_features_reported() {
        let profile = UserProfile::new("u").with_batch("abc").with_semester("3rd");
        let extraction = FeatureExtractor::new().extract_detailed(&profile);
        assert_eq!(extraction.defaulted_features(), vec!["batch"]);
        assert_eq!(extraction.vector.values()[0], 0.0);
        assert_eq!(extraction.vector.values()[1], 3.0);
    }

    #[test]
    fn test_extraction_is_deterministic() {
        let profile = UserProfile::new("u").with_batch("2020").with_interests(["x"]);
        let extractor = FeatureExtractor::new();
        assert_eq!(extractor.extract(&profile), extractor.extract(&profile));
    }
}
