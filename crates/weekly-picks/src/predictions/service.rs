use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::GameConfig;

use super::domain::{
    DomainError, EntryId, EntryPick, EntryRecord, EntryScore, MatchId, MatchRecord,
    MatchScoreUpdate, NewMatch, Outcome, PlayerId, PrizeDrawRecord, WeekId,
};
use super::draw::{
    assign_prizes, eligible_players, ensure_week_resolved, DrawError, DrawOutcome, DrawRequest,
};
use super::repository::{PredictionRepository, RepositoryError};
use super::scoring::{EntryScorer, ScoreWeekSummary, ScoringError, WeekOutcomes};

/// Service composing the repository, scoring rules, and draw engine for admin actions.
pub struct PredictionService<R> {
    repository: Arc<R>,
    scorer: EntryScorer,
    config: GameConfig,
}

static MATCH_SEQUENCE: AtomicU64 = AtomicU64::new(1);
static ENTRY_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_match_id() -> MatchId {
    let id = MATCH_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    MatchId(format!("match-{id:06}"))
}

fn next_entry_id() -> EntryId {
    let id = ENTRY_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    EntryId(format!("entry-{id:06}"))
}

impl<R> PredictionService<R>
where
    R: PredictionRepository + 'static,
{
    pub fn new(repository: Arc<R>, config: GameConfig) -> Self {
        Self {
            repository,
            scorer: EntryScorer::new(config.alignment),
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Active week for `today`, honoring the configured override.
    pub fn current_week(&self, today: NaiveDate) -> WeekId {
        WeekId::current(today, self.config.current_week_override.as_deref())
    }

    /// Draw request seeded with configured defaults where the caller left values unset.
    pub fn draw_request(
        &self,
        prize_codes: Vec<String>,
        min_points: Option<u32>,
        reject_if_drawn: Option<bool>,
    ) -> DrawRequest {
        DrawRequest {
            min_points: min_points.unwrap_or(self.config.draw_min_points),
            prize_codes,
            reject_if_drawn: reject_if_drawn.unwrap_or(self.config.reject_if_drawn),
        }
    }

    /// Re-score every entry of the week against the current match results.
    ///
    /// Every entry is scored before anything is written, so an alignment failure leaves
    /// stored scores untouched.
    pub fn score_week(&self, week_id: &WeekId) -> Result<ScoreWeekSummary, ScoringError> {
        let matches = self.repository.matches_for_week(week_id)?;
        let outcomes = WeekOutcomes::from_matches(&matches);
        if outcomes.is_empty() {
            debug!(week_id = %week_id, "no fixtures scheduled, skipping scoring");
            return Ok(ScoreWeekSummary::default());
        }

        let updates = self.plan_scores(week_id, &outcomes)?;
        let updated_count = updates.len();
        for (entry_id, score) in updates {
            self.repository.update_entry_score(&entry_id, score)?;
        }

        let mut summary = ScoreWeekSummary {
            updated_count,
            ..ScoreWeekSummary::default()
        };
        if outcomes.is_complete() {
            summary.scored_weeks.push(week_id.clone());
        } else {
            summary.pending_weeks.push(week_id.clone());
        }

        info!(
            week_id = %week_id,
            alignment = ?self.scorer.policy(),
            updated = summary.updated_count,
            resolved = outcomes.resolved_count(),
            matches = outcomes.match_count(),
            "scored week"
        );
        Ok(summary)
    }

    fn plan_scores(
        &self,
        week_id: &WeekId,
        outcomes: &WeekOutcomes,
    ) -> Result<Vec<(EntryId, EntryScore)>, ScoringError> {
        let entries = self.repository.entries_for_week(week_id)?;
        let now = Utc::now();
        let mut updates = Vec::with_capacity(entries.len());
        for entry in &entries {
            let picks = self.repository.picks_for_entry(&entry.id)?;
            let correct = self.scorer.correct_picks(&entry.id, &picks, outcomes)?;
            updates.push((entry.id.clone(), self.scorer.entry_score(correct, outcomes, now)));
        }
        Ok(updates)
    }

    /// Score several weeks in order, ignoring repeats.
    pub fn score_weeks(&self, week_ids: &[WeekId]) -> Result<ScoreWeekSummary, ScoringError> {
        let mut summary = ScoreWeekSummary::default();
        let mut visited = Vec::with_capacity(week_ids.len());
        for week_id in week_ids {
            if visited.contains(&week_id) {
                continue;
            }
            visited.push(week_id);
            summary.merge(self.score_week(week_id)?);
        }
        Ok(summary)
    }

    /// Draw winners for the week using the thread-local generator.
    pub fn run_draw(
        &self,
        week_id: &WeekId,
        request: &DrawRequest,
    ) -> Result<DrawOutcome, DrawError> {
        self.run_draw_with_rng(week_id, request, &mut rand::thread_rng())
    }

    pub fn run_draw_with_rng<G: Rng>(
        &self,
        week_id: &WeekId,
        request: &DrawRequest,
        rng: &mut G,
    ) -> Result<DrawOutcome, DrawError> {
        let matches = self.repository.matches_for_week(week_id)?;
        ensure_week_resolved(&matches)?;

        if self.repository.entries_for_week(week_id)?.is_empty() {
            return Err(DrawError::NoEntries);
        }

        let min_points = request.effective_min_points();
        let eligible = eligible_players(self.repository.aggregate_points(week_id)?, min_points);
        if eligible.is_empty() {
            return Err(DrawError::NoEligiblePlayers { min_points });
        }

        let prize_codes = request.usable_prize_codes();
        if prize_codes.is_empty() {
            return Err(DrawError::NoPrizes);
        }

        if request.reject_if_drawn {
            let existing = self.repository.draws_for_week(week_id)?.len();
            if existing > 0 {
                warn!(week_id = %week_id, existing, "draw refused, winners already recorded");
                return Err(DrawError::AlreadyDrawn { existing });
            }
        }

        let total_eligible = eligible.len();
        let winners = assign_prizes(eligible, &prize_codes, rng);

        let created_at = Utc::now();
        let records = winners
            .iter()
            .map(|winner| PrizeDrawRecord {
                week_id: week_id.clone(),
                player_id: winner.player_id.clone(),
                prize_code: winner.prize_code.clone(),
                message: winner.message.clone(),
                created_at,
            })
            .collect();
        self.repository.insert_draw_records(records)?;

        info!(
            week_id = %week_id,
            min_points,
            eligible = total_eligible,
            winners = winners.len(),
            "prize draw completed"
        );

        Ok(DrawOutcome {
            week_id: week_id.clone(),
            min_points,
            total_eligible,
            winners,
        })
    }

    /// Per-player totals for the week, highest first.
    pub fn standings(&self, week_id: &WeekId) -> Result<Vec<PlayerStanding>, RepositoryError> {
        let mut totals: BTreeMap<PlayerId, PlayerStanding> = BTreeMap::new();
        for entry in self.repository.entries_for_week(week_id)? {
            let standing = totals
                .entry(entry.player_id.clone())
                .or_insert_with(|| PlayerStanding {
                    player_id: entry.player_id.clone(),
                    entry_count: 0,
                    total_points: 0,
                });
            standing.entry_count += 1;
            standing.total_points += u64::from(entry.points);
        }

        let mut standings: Vec<_> = totals.into_values().collect();
        standings.sort_by(|a, b| {
            b.total_points
                .cmp(&a.total_points)
                .then_with(|| a.player_id.cmp(&b.player_id))
        });
        Ok(standings)
    }

    /// Create fixtures for a week. Ids are assigned here.
    ///
    /// A week's fixture list is closed once any entry exists, since stored picks are
    /// paired with the fixtures present at submission.
    pub fn schedule_matches(
        &self,
        week_id: &WeekId,
        fixtures: Vec<NewMatch>,
    ) -> Result<Vec<MatchRecord>, PredictionServiceError> {
        if fixtures.is_empty() {
            return Err(PredictionServiceError::InvalidFixture(
                "at least one match is required".to_string(),
            ));
        }
        let existing = self.repository.entries_for_week(week_id)?.len();
        if existing > 0 {
            warn!(week_id = %week_id, existing, "fixtures refused, entries already submitted");
            return Err(PredictionServiceError::WeekHasEntries(week_id.clone()));
        }

        let mut records = Vec::with_capacity(fixtures.len());
        for fixture in fixtures {
            let home_team = fixture.home_team.trim().to_string();
            let away_team = fixture.away_team.trim().to_string();
            if home_team.is_empty() || away_team.is_empty() {
                return Err(PredictionServiceError::InvalidFixture(
                    "each match needs a home and away team".to_string(),
                ));
            }
            records.push(MatchRecord {
                id: next_match_id(),
                week_id: week_id.clone(),
                home_team,
                away_team,
                kickoff_at: fixture.kickoff_at,
                home_score: None,
                away_score: None,
            });
        }

        self.repository.insert_matches(records.clone())?;
        info!(week_id = %week_id, created = records.len(), "scheduled matches");
        Ok(records)
    }

    /// Write final scores and re-score every week the updates touched.
    ///
    /// Unknown match ids and entries that cannot be scored fail the whole batch before any
    /// score is written.
    pub fn record_match_scores(
        &self,
        updates: Vec<MatchScoreUpdate>,
    ) -> Result<ScoreWeekSummary, PredictionServiceError> {
        if updates.is_empty() {
            return Err(PredictionServiceError::EmptyScoreUpdate);
        }

        let mut touched = Vec::new();
        for update in &updates {
            let Some(fixture) = self.repository.find_match(&update.match_id)? else {
                warn!(match_id = %update.match_id.0, "score batch refused, unknown match");
                return Err(RepositoryError::NotFound.into());
            };
            if !touched.contains(&fixture.week_id) {
                touched.push(fixture.week_id);
            }
        }

        for week_id in &touched {
            let mut matches = self.repository.matches_for_week(week_id)?;
            for fixture in &mut matches {
                if let Some(update) = updates.iter().rev().find(|u| u.match_id == fixture.id) {
                    fixture.home_score = update.home_score;
                    fixture.away_score = update.away_score;
                }
            }
            self.plan_scores(week_id, &WeekOutcomes::from_matches(&matches))?;
        }

        self.repository.set_match_scores(&updates)?;
        Ok(self.score_weeks(&touched)?)
    }

    /// Store one prediction per fixture of the week, paired in kickoff order.
    pub fn submit_entry(
        &self,
        week_id: &WeekId,
        contact: &str,
        picks: Vec<Outcome>,
    ) -> Result<EntryRecord, PredictionServiceError> {
        let player_id = PlayerId::from_contact(contact)?;
        let matches = self.repository.matches_for_week(week_id)?;
        if matches.is_empty() {
            return Err(PredictionServiceError::NoFixtures(week_id.clone()));
        }
        if matches.len() != picks.len() {
            return Err(PredictionServiceError::PickCountMismatch {
                expected: matches.len(),
                actual: picks.len(),
            });
        }

        let entry = EntryRecord {
            id: next_entry_id(),
            week_id: week_id.clone(),
            player_id,
            submitted_at: Utc::now(),
            correct_picks: None,
            points: 0,
            scored_at: None,
        };
        let picks = matches
            .into_iter()
            .zip(picks)
            .map(|(fixture, pick)| EntryPick {
                match_id: fixture.id,
                pick,
            })
            .collect();

        let stored = self.repository.insert_entry(entry, picks)?;
        debug!(
            week_id = %week_id,
            entry_id = %stored.id.0,
            player = stored.player_id.as_str(),
            "entry accepted"
        );
        Ok(stored)
    }

    /// Fixtures of the week in kickoff order, with whatever scores are recorded.
    pub fn week_matches(&self, week_id: &WeekId) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.repository.matches_for_week(week_id)
    }

    /// A player's entries for the week, newest first, each pick set against its fixture.
    pub fn player_entries(
        &self,
        week_id: &WeekId,
        contact: &str,
    ) -> Result<PlayerWeekEntries, PredictionServiceError> {
        let player_id = PlayerId::from_contact(contact)?;
        let matches = self.repository.matches_for_week(week_id)?;

        let mut entries = Vec::new();
        for entry in self.repository.entries_for_week(week_id)? {
            if entry.player_id != player_id {
                continue;
            }
            let picks = self.repository.picks_for_entry(&entry.id)?;
            let picks = matches
                .iter()
                .map(|fixture| {
                    let pick = picks
                        .iter()
                        .find(|pick| pick.match_id == fixture.id)
                        .map(|pick| pick.pick);
                    PickBreakdown {
                        match_id: fixture.id.clone(),
                        home_team: fixture.home_team.clone(),
                        away_team: fixture.away_team.clone(),
                        kickoff_at: fixture.kickoff_at,
                        pick,
                        home_score: fixture.home_score,
                        away_score: fixture.away_score,
                        is_finished: fixture.is_finished(),
                        correct: pick.zip(fixture.outcome()).map(|(pick, result)| pick == result),
                    }
                })
                .collect();
            entries.push(EntryBreakdown {
                entry_id: entry.id,
                submitted_at: entry.submitted_at,
                correct_picks: entry.correct_picks,
                points: entry.points,
                scored_at: entry.scored_at,
                picks,
            });
        }
        entries.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| a.entry_id.cmp(&b.entry_id))
        });

        Ok(PlayerWeekEntries {
            week_id: week_id.clone(),
            player_id,
            entries,
        })
    }

    /// Per-week totals for one player, most recently played week first.
    pub fn player_weeks(&self, contact: &str) -> Result<PlayerHistory, PredictionServiceError> {
        let player_id = PlayerId::from_contact(contact)?;
        let mut weeks: BTreeMap<WeekId, PlayerWeekSummary> = BTreeMap::new();
        for entry in self.repository.entries_for_player(&player_id)? {
            let summary = weeks
                .entry(entry.week_id.clone())
                .or_insert_with(|| PlayerWeekSummary {
                    week_id: entry.week_id.clone(),
                    entry_count: 0,
                    total_points: 0,
                    latest_submitted_at: entry.submitted_at,
                });
            summary.entry_count += 1;
            summary.total_points += u64::from(entry.points);
            summary.latest_submitted_at = summary.latest_submitted_at.max(entry.submitted_at);
        }

        let mut weeks: Vec<_> = weeks.into_values().collect();
        weeks.sort_by(|a, b| {
            b.latest_submitted_at
                .cmp(&a.latest_submitted_at)
                .then_with(|| b.week_id.cmp(&a.week_id))
        });
        Ok(PlayerHistory { player_id, weeks })
    }
}

/// Aggregate row for a week's leaderboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStanding {
    pub player_id: PlayerId,
    pub entry_count: usize,
    pub total_points: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickBreakdown {
    pub match_id: MatchId,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: DateTime<Utc>,
    /// `None` when the entry predates the fixture.
    pub pick: Option<Outcome>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub is_finished: bool,
    /// Unset until the fixture has a result.
    pub correct: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryBreakdown {
    pub entry_id: EntryId,
    pub submitted_at: DateTime<Utc>,
    pub correct_picks: Option<u32>,
    pub points: u32,
    pub scored_at: Option<DateTime<Utc>>,
    pub picks: Vec<PickBreakdown>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWeekEntries {
    pub week_id: WeekId,
    pub player_id: PlayerId,
    pub entries: Vec<EntryBreakdown>,
}

/// One week of a player's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerWeekSummary {
    pub week_id: WeekId,
    pub entry_count: usize,
    pub total_points: u64,
    pub latest_submitted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerHistory {
    pub player_id: PlayerId,
    pub weeks: Vec<PlayerWeekSummary>,
}

/// Error raised by the prediction service outside of the scoring and draw contracts.
#[derive(Debug, thiserror::Error)]
pub enum PredictionServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error(transparent)]
    Scoring(#[from] ScoringError),
    #[error(transparent)]
    Draw(#[from] DrawError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error("Missing scores array.")]
    EmptyScoreUpdate,
    #[error("invalid fixture: {0}")]
    InvalidFixture(String),
    #[error("No fixtures available for week {0}.")]
    NoFixtures(WeekId),
    #[error("Week {0} already has entries; its fixtures can no longer change.")]
    WeekHasEntries(WeekId),
    #[error("Picks do not match this week's fixtures (expected {expected}, got {actual}).")]
    PickCountMismatch { expected: usize, actual: usize },
}
