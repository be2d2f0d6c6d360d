use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::domain::{EntryId, EntryPick, EntryScore, MatchId, MatchRecord, Outcome, WeekId};
use super::repository::RepositoryError;

/// Points awarded per correct pick count. Counts past the end earn the last value.
const POINTS_CURVE: [u32; 11] = [0, 1, 2, 10, 20, 50, 100, 200, 400, 800, 1600];

pub fn points_for_correct_picks(correct_picks: u32) -> u32 {
    let index = usize::try_from(correct_picks)
        .unwrap_or(usize::MAX)
        .min(POINTS_CURVE.len() - 1);
    POINTS_CURVE[index]
}

/// How picks that do not line up with the week's fixtures are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlignmentPolicy {
    /// Reject the scoring pass when an entry's picks do not cover the week exactly.
    #[default]
    Strict,
    /// Compare only the picks that reference a fixture of the week.
    Overlapping,
}

impl FromStr for AlignmentPolicy {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "overlapping" | "overlap" => Ok(Self::Overlapping),
            other => Err(other.to_string()),
        }
    }
}

/// Resolved outcomes for every fixture of a week.
#[derive(Debug, Clone, Default)]
pub struct WeekOutcomes {
    outcomes: BTreeMap<MatchId, Option<Outcome>>,
    resolved: usize,
}

impl WeekOutcomes {
    pub fn from_matches(matches: &[MatchRecord]) -> Self {
        let outcomes: BTreeMap<_, _> = matches
            .iter()
            .map(|fixture| (fixture.id.clone(), fixture.outcome()))
            .collect();
        let resolved = outcomes.values().filter(|value| value.is_some()).count();
        Self { outcomes, resolved }
    }

    pub fn match_count(&self) -> usize {
        self.outcomes.len()
    }

    pub fn resolved_count(&self) -> usize {
        self.resolved
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        !self.is_empty() && self.resolved == self.outcomes.len()
    }

    fn contains(&self, match_id: &MatchId) -> bool {
        self.outcomes.contains_key(match_id)
    }

    fn resolved(&self, match_id: &MatchId) -> Option<Outcome> {
        self.outcomes.get(match_id).copied().flatten()
    }
}

/// Pure scoring rules applied to one entry at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryScorer {
    policy: AlignmentPolicy,
}

impl EntryScorer {
    pub fn new(policy: AlignmentPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> AlignmentPolicy {
        self.policy
    }

    /// Count picks matching a resolved outcome. Unresolved fixtures are skipped rather than
    /// counted as misses.
    pub fn correct_picks(
        &self,
        entry_id: &EntryId,
        picks: &[EntryPick],
        outcomes: &WeekOutcomes,
    ) -> Result<u32, ScoringError> {
        let mut seen = BTreeSet::new();
        let aligned: Vec<&EntryPick> = picks
            .iter()
            .filter(|pick| outcomes.contains(&pick.match_id))
            .filter(|pick| seen.insert(pick.match_id.clone()))
            .collect();

        if self.policy == AlignmentPolicy::Strict {
            let expected = outcomes.match_count();
            if picks.len() != expected || aligned.len() != expected {
                let actual = if picks.len() != expected {
                    picks.len()
                } else {
                    aligned.len()
                };
                return Err(ScoringError::AlignmentMismatch {
                    entry_id: entry_id.clone(),
                    expected,
                    actual,
                });
            }
        }

        let correct = aligned
            .into_iter()
            .filter(|pick| outcomes.resolved(&pick.match_id) == Some(pick.pick))
            .count();
        Ok(u32::try_from(correct).unwrap_or(u32::MAX))
    }

    /// Build the persisted score. The entry is only stamped once the whole week is resolved.
    pub fn entry_score(
        &self,
        correct_picks: u32,
        outcomes: &WeekOutcomes,
        now: DateTime<Utc>,
    ) -> EntryScore {
        EntryScore {
            correct_picks,
            points: points_for_correct_picks(correct_picks),
            scored_at: outcomes.is_complete().then_some(now),
        }
    }
}

/// Result of one or more scoring passes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreWeekSummary {
    /// Weeks whose every fixture had a result, so entries were stamped final.
    pub scored_weeks: Vec<WeekId>,
    /// Weeks scored from partial results.
    pub pending_weeks: Vec<WeekId>,
    pub updated_count: usize,
}

impl ScoreWeekSummary {
    pub fn merge(&mut self, other: ScoreWeekSummary) {
        self.scored_weeks.extend(other.scored_weeks);
        self.pending_weeks.extend(other.pending_weeks);
        self.updated_count += other.updated_count;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoringError {
    #[error("entry {} has {actual} aligned picks but the week has {expected} matches", .entry_id.0)]
    AlignmentMismatch {
        entry_id: EntryId,
        expected: usize,
        actual: usize,
    },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixture(id: &str, home: Option<u32>, away: Option<u32>) -> MatchRecord {
        MatchRecord {
            id: MatchId(id.to_string()),
            week_id: WeekId::parse("2026-W05").expect("week"),
            home_team: "Chiefs".to_string(),
            away_team: "Pirates".to_string(),
            kickoff_at: Utc.with_ymd_and_hms(2026, 1, 31, 15, 0, 0).unwrap(),
            home_score: home,
            away_score: away,
        }
    }

    fn pick(id: &str, pick: Outcome) -> EntryPick {
        EntryPick {
            match_id: MatchId(id.to_string()),
            pick,
        }
    }

    fn entry() -> EntryId {
        EntryId("entry-1".to_string())
    }

    #[test]
    fn curve_matches_published_table() {
        let expected = [0, 1, 2, 10, 20, 50, 100, 200, 400, 800, 1600];
        for (correct, points) in expected.iter().enumerate() {
            assert_eq!(points_for_correct_picks(correct as u32), *points);
        }
        assert_eq!(points_for_correct_picks(7), 200);
        assert_eq!(points_for_correct_picks(25), 1600);
        assert_eq!(points_for_correct_picks(u32::MAX), 1600);
    }

    #[test]
    fn curve_never_decreases() {
        let mut previous = 0;
        for correct in 0..20 {
            let points = points_for_correct_picks(correct);
            assert!(points >= previous, "curve dipped at {correct}");
            previous = points;
        }
    }

    #[test]
    fn unresolved_matches_are_skipped_not_counted_wrong() {
        let outcomes = WeekOutcomes::from_matches(&[
            fixture("m1", Some(2), Some(1)),
            fixture("m2", None, None),
            fixture("m3", Some(1), Some(1)),
        ]);
        let scorer = EntryScorer::default();
        let picks = [
            pick("m1", Outcome::Home),
            pick("m2", Outcome::Away),
            pick("m3", Outcome::Draw),
        ];

        let correct = scorer
            .correct_picks(&entry(), &picks, &outcomes)
            .expect("aligned");
        assert_eq!(correct, 2);
        assert_eq!(outcomes.resolved_count(), 2);
        assert!(!outcomes.is_complete());

        let score = scorer.entry_score(correct, &outcomes, Utc::now());
        assert_eq!(score.points, 2);
        assert!(score.scored_at.is_none());
    }

    #[test]
    fn strict_policy_rejects_short_and_foreign_picks() {
        let outcomes = WeekOutcomes::from_matches(&[
            fixture("m1", Some(2), Some(1)),
            fixture("m2", Some(0), Some(0)),
        ]);
        let scorer = EntryScorer::new(AlignmentPolicy::Strict);

        match scorer.correct_picks(&entry(), &[pick("m1", Outcome::Home)], &outcomes) {
            Err(ScoringError::AlignmentMismatch {
                expected, actual, ..
            }) => {
                assert_eq!(expected, 2);
                assert_eq!(actual, 1);
            }
            other => panic!("expected alignment mismatch, got {other:?}"),
        }

        let foreign = [pick("m1", Outcome::Home), pick("m9", Outcome::Draw)];
        assert!(matches!(
            scorer.correct_picks(&entry(), &foreign, &outcomes),
            Err(ScoringError::AlignmentMismatch { actual: 1, .. })
        ));
    }

    #[test]
    fn overlapping_policy_scores_paired_picks_only() {
        let outcomes = WeekOutcomes::from_matches(&[
            fixture("m1", Some(2), Some(1)),
            fixture("m2", Some(0), Some(0)),
        ]);
        let scorer = EntryScorer::new(AlignmentPolicy::Overlapping);
        assert_eq!(scorer.policy(), AlignmentPolicy::Overlapping);
        let picks = [pick("m1", Outcome::Home), pick("m9", Outcome::Draw)];

        let correct = scorer
            .correct_picks(&entry(), &picks, &outcomes)
            .expect("overlap tolerated");
        assert_eq!(correct, 1);
    }

    #[test]
    fn complete_week_stamps_scored_at() {
        let outcomes = WeekOutcomes::from_matches(&[fixture("m1", Some(0), Some(3))]);
        let now = Utc.with_ymd_and_hms(2026, 2, 2, 8, 0, 0).unwrap();
        let score = EntryScorer::default().entry_score(1, &outcomes, now);
        assert_eq!(score.scored_at, Some(now));
        assert_eq!(score.points, 1);
    }

    #[test]
    fn alignment_policy_parses_config_values() {
        assert_eq!("Strict".parse::<AlignmentPolicy>(), Ok(AlignmentPolicy::Strict));
        assert_eq!(" overlapping ".parse::<AlignmentPolicy>(), Ok(AlignmentPolicy::Overlapping));
        assert!("lenient".parse::<AlignmentPolicy>().is_err());
    }
}
