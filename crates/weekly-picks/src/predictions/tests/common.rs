use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, Duration, TimeZone, Utc};
use serde_json::Value;

use crate::config::GameConfig;
use crate::predictions::domain::{
    EntryId, EntryPick, EntryRecord, EntryScore, MatchId, MatchRecord, MatchScoreUpdate,
    NewMatch, Outcome, PlayerId, PrizeDrawRecord, WeekId,
};
use crate::predictions::repository::{PredictionRepository, RepositoryError};
use crate::predictions::{prediction_router, PredictionService};

pub(super) fn week() -> WeekId {
    WeekId::parse("2026-W05").expect("valid week")
}

pub(super) fn kickoff(offset_hours: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap() + Duration::hours(offset_hours)
}

pub(super) fn fixtures(count: usize) -> Vec<NewMatch> {
    (0..count)
        .map(|index| NewMatch {
            home_team: format!("Home {index}"),
            away_team: format!("Away {index}"),
            kickoff_at: kickoff(index as i64),
        })
        .collect()
}

pub(super) fn score(match_id: &MatchId, home: u32, away: u32) -> MatchScoreUpdate {
    MatchScoreUpdate {
        match_id: match_id.clone(),
        home_score: Some(home),
        away_score: Some(away),
    }
}

pub(super) fn build_service() -> (PredictionService<MemoryRepository>, Arc<MemoryRepository>) {
    build_service_with(GameConfig::default())
}

pub(super) fn build_service_with(
    config: GameConfig,
) -> (PredictionService<MemoryRepository>, Arc<MemoryRepository>) {
    let repository = Arc::new(MemoryRepository::default());
    let service = PredictionService::new(repository.clone(), config);
    (service, repository)
}

/// Schedule `results.len()` fixtures and apply the given final scores.
pub(super) fn seeded_week(
    service: &PredictionService<MemoryRepository>,
    results: &[Option<(u32, u32)>],
) -> Vec<MatchRecord> {
    let matches = service
        .schedule_matches(&week(), fixtures(results.len()))
        .expect("fixtures scheduled");
    let updates: Vec<_> = matches
        .iter()
        .zip(results)
        .filter_map(|(fixture, result)| result.map(|(h, a)| score(&fixture.id, h, a)))
        .collect();
    if !updates.is_empty() {
        service
            .record_match_scores(updates)
            .expect("scores recorded");
    }
    matches
}

pub(super) fn submit(
    service: &PredictionService<MemoryRepository>,
    contact: &str,
    picks: &[Outcome],
) -> EntryRecord {
    service
        .submit_entry(&week(), contact, picks.to_vec())
        .expect("entry accepted")
}

#[derive(Default)]
pub(super) struct MemoryState {
    pub(super) matches: Vec<MatchRecord>,
    pub(super) entries: Vec<EntryRecord>,
    pub(super) picks: HashMap<EntryId, Vec<EntryPick>>,
    pub(super) draws: Vec<PrizeDrawRecord>,
}

#[derive(Default, Clone)]
pub(super) struct MemoryRepository {
    pub(super) state: Arc<Mutex<MemoryState>>,
}

impl MemoryRepository {
    pub(super) fn entry(&self, id: &EntryId) -> EntryRecord {
        let guard = self.state.lock().expect("repository mutex poisoned");
        guard
            .entries
            .iter()
            .find(|entry| &entry.id == id)
            .cloned()
            .expect("entry present")
    }

    pub(super) fn draws(&self) -> Vec<PrizeDrawRecord> {
        self.state
            .lock()
            .expect("repository mutex poisoned")
            .draws
            .clone()
    }

    pub(super) fn fixture(&self, id: &MatchId) -> MatchRecord {
        self.find_match(id)
            .expect("lookup succeeds")
            .expect("fixture present")
    }

    /// Store an entry directly, bypassing the pick count check at submission.
    pub(super) fn force_entry(&self, entry: EntryRecord, picks: Vec<EntryPick>) {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.picks.insert(entry.id.clone(), picks);
        guard.entries.push(entry);
    }
}

impl PredictionRepository for MemoryRepository {
    fn matches_for_week(&self, week_id: &WeekId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        let mut matches: Vec<_> = guard
            .matches
            .iter()
            .filter(|fixture| &fixture.week_id == week_id)
            .cloned()
            .collect();
        matches.sort_by_key(|fixture| fixture.kickoff_at);
        Ok(matches)
    }

    fn entries_for_week(&self, week_id: &WeekId) -> Result<Vec<EntryRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .entries
            .iter()
            .filter(|entry| &entry.week_id == week_id)
            .cloned()
            .collect())
    }

    fn entries_for_player(
        &self,
        player_id: &PlayerId,
    ) -> Result<Vec<EntryRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .entries
            .iter()
            .filter(|entry| &entry.player_id == player_id)
            .cloned()
            .collect())
    }

    fn picks_for_entry(&self, entry_id: &EntryId) -> Result<Vec<EntryPick>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard.picks.get(entry_id).cloned().unwrap_or_default())
    }

    fn update_entry_score(
        &self,
        entry_id: &EntryId,
        score: EntryScore,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        let entry = guard
            .entries
            .iter_mut()
            .find(|entry| &entry.id == entry_id)
            .ok_or(RepositoryError::NotFound)?;
        entry.correct_picks = Some(score.correct_picks);
        entry.points = score.points;
        entry.scored_at = score.scored_at;
        Ok(())
    }

    fn insert_draw_records(&self, records: Vec<PrizeDrawRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.draws.extend(records);
        Ok(())
    }

    fn draws_for_week(&self, week_id: &WeekId) -> Result<Vec<PrizeDrawRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .draws
            .iter()
            .filter(|draw| &draw.week_id == week_id)
            .cloned()
            .collect())
    }

    fn insert_matches(&self, matches: Vec<MatchRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        guard.matches.extend(matches);
        Ok(())
    }

    fn find_match(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        let guard = self.state.lock().expect("repository mutex poisoned");
        Ok(guard
            .matches
            .iter()
            .find(|fixture| &fixture.id == match_id)
            .cloned())
    }

    fn set_match_scores(
        &self,
        updates: &[MatchScoreUpdate],
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if updates
            .iter()
            .any(|update| !guard.matches.iter().any(|known| known.id == update.match_id))
        {
            return Err(RepositoryError::NotFound);
        }
        let mut updated = Vec::with_capacity(updates.len());
        for update in updates {
            if let Some(fixture) = guard
                .matches
                .iter_mut()
                .find(|fixture| fixture.id == update.match_id)
            {
                fixture.home_score = update.home_score;
                fixture.away_score = update.away_score;
                updated.push(fixture.clone());
            }
        }
        Ok(updated)
    }

    fn insert_entry(
        &self,
        entry: EntryRecord,
        picks: Vec<EntryPick>,
    ) -> Result<EntryRecord, RepositoryError> {
        let mut guard = self.state.lock().expect("repository mutex poisoned");
        if guard.picks.contains_key(&entry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.picks.insert(entry.id.clone(), picks);
        guard.entries.push(entry.clone());
        Ok(entry)
    }
}

/// Reads succeed against the wrapped store; every write fails.
pub(super) struct ReadOnlyRepository(pub(super) MemoryRepository);

impl PredictionRepository for ReadOnlyRepository {
    fn matches_for_week(&self, week_id: &WeekId) -> Result<Vec<MatchRecord>, RepositoryError> {
        self.0.matches_for_week(week_id)
    }

    fn entries_for_week(&self, week_id: &WeekId) -> Result<Vec<EntryRecord>, RepositoryError> {
        self.0.entries_for_week(week_id)
    }

    fn entries_for_player(
        &self,
        player_id: &PlayerId,
    ) -> Result<Vec<EntryRecord>, RepositoryError> {
        self.0.entries_for_player(player_id)
    }

    fn picks_for_entry(&self, entry_id: &EntryId) -> Result<Vec<EntryPick>, RepositoryError> {
        self.0.picks_for_entry(entry_id)
    }

    fn update_entry_score(
        &self,
        _entry_id: &EntryId,
        _score: EntryScore,
    ) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn insert_draw_records(&self, _records: Vec<PrizeDrawRecord>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn draws_for_week(&self, week_id: &WeekId) -> Result<Vec<PrizeDrawRecord>, RepositoryError> {
        self.0.draws_for_week(week_id)
    }

    fn insert_matches(&self, _matches: Vec<MatchRecord>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn find_match(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        self.0.find_match(match_id)
    }

    fn set_match_scores(
        &self,
        _updates: &[MatchScoreUpdate],
    ) -> Result<Vec<MatchRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }

    fn insert_entry(
        &self,
        _entry: EntryRecord,
        _picks: Vec<EntryPick>,
    ) -> Result<EntryRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("read only".to_string()))
    }
}

pub(super) fn router_with_service(service: PredictionService<MemoryRepository>) -> axum::Router {
    prediction_router(Arc::new(service))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
