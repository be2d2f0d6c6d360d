use chrono::NaiveDate;
use metrics_exporter_prometheus::PrometheusHandle;
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use weekly_picks::predictions::{
    EntryId, EntryPick, EntryRecord, EntryScore, MatchId, MatchRecord, MatchScoreUpdate, PlayerId,
    PredictionRepository, PrizeDrawRecord, RepositoryError, WeekId,
};

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

#[derive(Default)]
struct PredictionTables {
    matches: Vec<MatchRecord>,
    entries: Vec<EntryRecord>,
    picks: HashMap<EntryId, Vec<EntryPick>>,
    draws: Vec<PrizeDrawRecord>,
}

/// Process-local store; every table sits behind one lock so multi-row writes are atomic.
#[derive(Default, Clone)]
pub(crate) struct InMemoryPredictionRepository {
    tables: Arc<Mutex<PredictionTables>>,
}

impl PredictionRepository for InMemoryPredictionRepository {
    fn matches_for_week(&self, week_id: &WeekId) -> Result<Vec<MatchRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        let mut matches: Vec<_> = guard
            .matches
            .iter()
            .filter(|fixture| &fixture.week_id == week_id)
            .cloned()
            .collect();
        matches.sort_by(|a, b| a.kickoff_at.cmp(&b.kickoff_at).then_with(|| a.id.cmp(&b.id)));
        Ok(matches)
    }

    fn entries_for_week(&self, week_id: &WeekId) -> Result<Vec<EntryRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
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
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .entries
            .iter()
            .filter(|entry| &entry.player_id == player_id)
            .cloned()
            .collect())
    }

    fn picks_for_entry(&self, entry_id: &EntryId) -> Result<Vec<EntryPick>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard.picks.get(entry_id).cloned().unwrap_or_default())
    }

    fn update_entry_score(
        &self,
        entry_id: &EntryId,
        score: EntryScore,
    ) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
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
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        guard.draws.extend(records);
        Ok(())
    }

    fn draws_for_week(&self, week_id: &WeekId) -> Result<Vec<PrizeDrawRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
        Ok(guard
            .draws
            .iter()
            .filter(|draw| &draw.week_id == week_id)
            .cloned()
            .collect())
    }

    fn insert_matches(&self, matches: Vec<MatchRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if matches
            .iter()
            .any(|fixture| guard.matches.iter().any(|known| known.id == fixture.id))
        {
            return Err(RepositoryError::Conflict);
        }
        guard.matches.extend(matches);
        Ok(())
    }

    fn find_match(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError> {
        let guard = self.tables.lock().expect("repository mutex poisoned");
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
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        let mut positions = Vec::with_capacity(updates.len());
        for update in updates {
            let position = guard
                .matches
                .iter()
                .position(|fixture| fixture.id == update.match_id)
                .ok_or(RepositoryError::NotFound)?;
            positions.push(position);
        }
        let mut updated = Vec::with_capacity(updates.len());
        for (update, position) in updates.iter().zip(positions) {
            let fixture = &mut guard.matches[position];
            fixture.home_score = update.home_score;
            fixture.away_score = update.away_score;
            updated.push(fixture.clone());
        }
        Ok(updated)
    }

    fn insert_entry(
        &self,
        entry: EntryRecord,
        picks: Vec<EntryPick>,
    ) -> Result<EntryRecord, RepositoryError> {
        let mut guard = self.tables.lock().expect("repository mutex poisoned");
        if guard.picks.contains_key(&entry.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.picks.insert(entry.id.clone(), picks);
        guard.entries.push(entry.clone());
        Ok(entry)
    }
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
