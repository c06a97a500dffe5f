//! Rule-based affinity scoring.
//!
//! Signals are additive and independent of each other: a candidate in the
//! same batch and semester collects both the batch+semester bonus and the
//! batch-only bonus.

use crate::distance::{categorical_match, jaccard, round_score};
use crate::scorer::{ScoredCandidate, Scorer, Strategy};
use peerlink_core::UserProfile;
use std::collections::BTreeMap;

pub const SIGNAL_BATCH_SEMESTER: &str = "batch_semester";
pub const SIGNAL_BATCH_ONLY: &str = "batch_only";
pub const SIGNAL_DEPARTMENT: &str = "department";
pub const SIGNAL_INTERESTS: &str = "interests";

pub const BATCH_SEMESTER_BONUS: f32 = 40.0;
pub const BATCH_BONUS: f32 = 30.0;
pub const DEPARTMENT_BONUS: f32 = 20.0;
pub const INTEREST_WEIGHT: f32 = 10.0;

pub const SCORE_FLOOR: f32 = 30.0;
pub const SCORE_CEILING: f32 = 95.0;

/// Pairwise score and its per-signal contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleScore {
    /// Clamped to `[SCORE_FLOOR, SCORE_CEILING]`, one decimal.
    pub score: f32,
    /// Sum of contributions before clamping.
    pub raw: f32,
    pub breakdown: BTreeMap<String, f32>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedScorer;

impl RuleBasedScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one pair. Symmetric in its arguments.
    pub fn score_pair(&self, target: &UserProfile, candidate: &UserProfile) -> RuleScore {
        let same_batch = categorical_match(target.batch.as_deref(), candidate.batch.as_deref());
        let same_semester = categorical_match(target.semester.as_deref(), candidate.semester.as_deref());
        let same_department =
            categorical_match(target.department.as_deref(), candidate.department.as_deref());
        let overlap = jaccard(&target.interests, &candidate.interests);

        let contributions = [
            (SIGNAL_BATCH_SEMESTER, if same_batch && same_semester { BATCH_SEMESTER_BONUS } else { 0.0 }),
            (SIGNAL_BATCH_ONLY, if same_batch { BATCH_BONUS } else { 0.0 }),
            (SIGNAL_DEPARTMENT, if same_department { DEPARTMENT_BONUS } else { 0.0 }),
            (SIGNAL_INTERESTS, overlap * INTEREST_WEIGHT),
        ];

        let raw: f32 = contributions.iter().map(|(_, c)| c).sum();
        let breakdown = contributions
            .iter()
            .map(|(name, c)| (name.to_string(), *c))
            .collect();

        RuleScore {
            score: round_score(raw.clamp(SCORE_FLOOR, SCORE_CEILING)),
            raw,
            breakdown,
        }
    }
}

impl Scorer for RuleBasedScorer {
    fn strategy(&self) -> Strategy {
        Strategy::RuleBased
    }

    fn score_candidates(&self, target: &UserProfile, pool: &[UserProfile]) -> Vec<ScoredCandidate> {
        pool.iter()
            .filter(|candidate| candidate.id != target.id)
            .map(|candidate| {
                let RuleScore { score, breakdown, .. } = self.score_pair(target, candidate);
                ScoredCandidate {
                    id: candidate.id.clone(),
                    score,
                    breakdown,
                    strategy: Strategy::RuleBased,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student(id: &str, batch: &str, semester: &str, department: &str, interests: &[&str]) -> UserProfile {
        UserProfile::new(id)
            .with_batch(batch)
            .with_semester(semester)
            .with_department(department)
            .with_interests(interests.iter().copied())
    }

    #[test]
    fn test_full_match_scenario() {
        let target = student("t", "2023", "3rd", "CS", &["ai", "music"]);
        let candidate = student("c", "2023", "3rd", "CS", &["ai", "sports"]);

        let result = RuleBasedScorer::new().score_pair(&target, &candidate);

        assert!((result.raw - 93.333).abs() < 1e-2, "raw = {}", result.raw);
        assert!((result.score - 93.3).abs() < 1e-4, "score = {}", result.score);
        assert_eq!(result.breakdown[SIGNAL_BATCH_SEMESTER], 40.0);
        assert_eq!(result.breakdown[SIGNAL_BATCH_ONLY], 30.0);
        assert_eq!(result.breakdown[SIGNAL_DEPARTMENT], 20.0);
        assert!((result.breakdown[SIGNAL_INTERESTS] - 10.0 / 3.0).abs() < 1e-4);
    }

    #[test]
    fn test_nothing_shared_hits_floor() {
        let target = student("t", "2021", "1st", "CS", &["ai"]);
        let candidate = student("c", "2024", "7th", "ME", &["cricket"]);

        let result = RuleBasedScorer::new().score_pair(&target, &candidate);
        assert_eq!(result.raw, 0.0);
        assert_eq!(result.score, SCORE_FLOOR);
    }

    #[test]
    fn test_identical_profiles_hit_ceiling() {
        let a = student("a", "2022", "5th", "EE", &["robots"]);
        let b = student("b", "2022", "5th", "EE", &["robots"]);

        let result = RuleBasedScorer::new().score_pair(&a, &b);
        assert_eq!(result.raw, 100.0);
        assert_eq!(result.score, SCORE_CEILING);
    }

    #[test]
    fn test_batch_without_semester() {
        let a = student("a", "2022", "5th", "EE", &[]);
        let b = student("b", "2022", "6th", "CS", &[]);

        let result = RuleBasedScorer::new().score_pair(&a, &b);
        assert_eq!(result.breakdown[SIGNAL_BATCH_SEMESTER], 0.0);
        assert_eq!(result.breakdown[SIGNAL_BATCH_ONLY], 30.0);
        assert_eq!(result.score, 30.0);
    }

    #[test]
    fn test_absent_fields_compare_equal() {
        let a = UserProfile::new("a");
        let b = UserProfile::new("b");

        let result = RuleBasedScorer::new().score_pair(&a, &b);
        assert_eq!(result.breakdown[SIGNAL_BATCH_SEMESTER], 40.0);
        assert_eq!(result.breakdown[SIGNAL_BATCH_ONLY], 30.0);
        assert_eq!(result.breakdown[SIGNAL_DEPARTMENT], 20.0);
        assert_eq!(result.breakdown[SIGNAL_INTERESTS], 0.0);
        assert_eq!(result.score, 90.0);

        let c = UserProfile::new("c").with_batch("2023");
        let result = RuleBasedScorer::new().score_pair(&a, &c);
        assert_eq!(result.breakdown[SIGNAL_BATCH_ONLY], 0.0);
        assert_eq!(result.breakdown[SIGNAL_DEPARTMENT], 20.0);
        assert_eq!(result.score, SCORE_FLOOR);
    }

    #[test]
    fn test_department_is_case_sensitive() {
        let a = student("a", "2021", "1st", "CS", &[]);
        let b = student("b", "2024", "7th", "cs", &[]);

        let result = RuleBasedScorer::new().score_pair(&a, &b);
        assert_eq!(result.breakdown[SIGNAL_DEPARTMENT], 0.0);
        assert_eq!(result.score, SCORE_FLOOR);
    }

    #[test]
    fn test_symmetry() {
        let scorer = RuleBasedScorer::new();
        let pairs = [
            (student("a", "2023", "3rd", "CS", &["ai", "music"]), student("b", "2023", "4th", "CS", &["ai"])),
            (student("c", "2020", "1st", "ME", &[]), student("d", "2020", "1st", "EE", &["x", "y"])),
            (UserProfile::new("e").with_batch("2021"), student("f", "2021", "2nd", "CS", &["z"])),
        ];

        for (a, b) in &pairs {
            let ab = scorer.score_pair(a, b);
            let ba = scorer.score_pair(b, a);
            assert_eq!(ab.breakdown, ba.breakdown);
            assert_eq!(ab.score, ba.score);
        }
    }

    #[test]
    fn test_score_bounds_over_grid() {
        let scorer = RuleBasedScorer::new();
        let batches = ["2021", "2022", ""];
        let semesters = ["1st", "2nd"];
        let departments = ["CS", "EE"];
        let interest_sets: [&[&str]; 3] = [&[], &["ai"], &["ai", "music", "art"]];

        let mut profiles = Vec::new();
        for (i, batch) in batches.iter().enumerate() {
            for (j, semester) in semesters.iter().enumerate() {
                for (k, department) in departments.iter().enumerate() {
                    for (l, interests) in interest_sets.iter().enumerate() {
                        let mut p = student(&format!("p{}{}{}{}", i, j, k, l), batch, semester, department, interests);
                        if batch.is_empty() {
                            p.batch = None;
                        }
                        profiles.push(p);
                    }
                }
            }
        }

        for a in &profiles {
            for b in &profiles {
                let s = scorer.score_pair(a, b).score;
                assert!((SCORE_FLOOR..=SCORE_CEILING).contains(&s), "score {} out of range", s);
            }
        }
    }

    #[test]
    fn test_score_candidates_skips_target() {
        let target = student("t", "2023", "3rd", "CS", &[]);
        let pool = vec![target.clone(), student("x", "2023", "3rd", "CS", &[])];

        let scored = RuleBasedScorer::new().score_candidates(&target, &pool);
        assert_eq!(scored.len(), 1);
        assert_eq!(scored[0].id, "x");
        assert_eq!(scored[0].strategy, Strategy::RuleBased);
        assert_eq!(scored[0].score, 90.0);
    }
}
