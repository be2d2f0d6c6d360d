//! Weekly prediction scoring and prize draws.
//!
//! Match results resolve into outcomes, entries are scored against them on a super-linear
//! points curve, and per-player totals become tickets in a weighted draw without
//! replacement. Storage stays behind [`PredictionRepository`] so the HTTP layer and tests
//! can supply their own backing store.

pub mod domain;
pub mod draw;
pub mod outcome;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    DomainError, EntryId, EntryPick, EntryRecord, EntryScore, MatchId, MatchRecord,
    MatchScoreUpdate, NewMatch, Outcome, PlayerId, PrizeDrawRecord, WeekId,
};
pub use draw::{DrawError, DrawOutcome, DrawRequest, DrawWinner, PlayerTickets};
pub use outcome::outcome;
pub use repository::{PredictionRepository, RepositoryError};
pub use router::prediction_router;
pub use scoring::{
    points_for_correct_picks, AlignmentPolicy, EntryScorer, ScoreWeekSummary, ScoringError,
};
pub use service::{
    EntryBreakdown, PickBreakdown, PlayerHistory, PlayerStanding, PlayerWeekEntries,
    PlayerWeekSummary, PredictionService, PredictionServiceError,
};
