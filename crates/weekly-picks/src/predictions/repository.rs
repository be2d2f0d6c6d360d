use super::domain::{
    EntryId, EntryPick, EntryRecord, EntryScore, MatchId, MatchRecord, MatchScoreUpdate, PlayerId,
    PrizeDrawRecord, WeekId,
};
use super::draw::{aggregate_tickets, PlayerTickets};

/// Storage abstraction so scoring and draws can run against any backing store.
///
/// Implementations must return fixtures ordered by kickoff and must apply
/// [`PredictionRepository::insert_draw_records`] and [`PredictionRepository::set_match_scores`]
/// atomically: every row or none.
pub trait PredictionRepository: Send + Sync {
    fn matches_for_week(&self, week_id: &WeekId) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn entries_for_week(&self, week_id: &WeekId) -> Result<Vec<EntryRecord>, RepositoryError>;
    /// Every entry the player submitted, across all weeks.
    fn entries_for_player(&self, player_id: &PlayerId)
        -> Result<Vec<EntryRecord>, RepositoryError>;
    fn picks_for_entry(&self, entry_id: &EntryId) -> Result<Vec<EntryPick>, RepositoryError>;
    fn update_entry_score(
        &self,
        entry_id: &EntryId,
        score: EntryScore,
    ) -> Result<(), RepositoryError>;

    /// Per-player point totals for the week. Stores with a native aggregate query should
    /// override this.
    fn aggregate_points(&self, week_id: &WeekId) -> Result<Vec<PlayerTickets>, RepositoryError> {
        Ok(aggregate_tickets(&self.entries_for_week(week_id)?))
    }

    fn insert_draw_records(&self, records: Vec<PrizeDrawRecord>) -> Result<(), RepositoryError>;
    fn draws_for_week(&self, week_id: &WeekId) -> Result<Vec<PrizeDrawRecord>, RepositoryError>;

    fn find_match(&self, match_id: &MatchId) -> Result<Option<MatchRecord>, RepositoryError>;
    fn insert_matches(&self, matches: Vec<MatchRecord>) -> Result<(), RepositoryError>;
    /// Overwrite scores for a batch of fixtures, returning them updated. An unknown match id
    /// fails the batch with [`RepositoryError::NotFound`] before anything is written.
    fn set_match_scores(
        &self,
        updates: &[MatchScoreUpdate],
    ) -> Result<Vec<MatchRecord>, RepositoryError>;
    fn insert_entry(
        &self,
        entry: EntryRecord,
        picks: Vec<EntryPick>,
    ) -> Result<EntryRecord, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
