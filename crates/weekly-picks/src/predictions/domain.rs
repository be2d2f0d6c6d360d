use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use crate::week::WeekId;

use super::outcome::outcome;

/// Identifier wrapper for scheduled fixtures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MatchId(pub String);

/// Identifier wrapper for submitted entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryId(pub String);

/// Stable player identity derived from the contact number the player messaged from.
///
/// Only ASCII digits are kept so `+27 82-555 0101` and `27825550101` resolve to the same
/// player when entries and tickets are grouped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerId(String);

impl PlayerId {
    pub fn from_contact(contact: &str) -> Result<Self, DomainError> {
        let digits: String = contact.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(DomainError::InvalidPlayer(contact.to_string()));
        }
        Ok(Self(digits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_contact(&value)
    }
}

impl From<PlayerId> for String {
    fn from(value: PlayerId) -> Self {
        value.0
    }
}

/// Result of a match, also used as the value of a player's pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "H")]
    Home,
    #[serde(rename = "D")]
    Draw,
    #[serde(rename = "A")]
    Away,
}

impl Outcome {
    pub fn code(self) -> &'static str {
        match self {
            Outcome::Home => "H",
            Outcome::Draw => "D",
            Outcome::Away => "A",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Outcome::Home => "Home win",
            Outcome::Draw => "Draw",
            Outcome::Away => "Away win",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Outcome {
    type Err = DomainError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "H" | "HOME" => Ok(Outcome::Home),
            "D" | "DRAW" => Ok(Outcome::Draw),
            "A" | "AWAY" => Ok(Outcome::Away),
            _ => Err(DomainError::InvalidPick(raw.to_string())),
        }
    }
}

/// Fixture with optional final scores. Finished once both scores are present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub id: MatchId,
    pub week_id: WeekId,
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: DateTime<Utc>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

impl MatchRecord {
    pub fn is_finished(&self) -> bool {
        self.home_score.is_some() && self.away_score.is_some()
    }

    pub fn outcome(&self) -> Option<Outcome> {
        outcome(self.home_score, self.away_score)
    }
}

/// Admin supplied fixture prior to id assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewMatch {
    pub home_team: String,
    pub away_team: String,
    pub kickoff_at: DateTime<Utc>,
}

/// Score write for a single fixture. `None` clears a previously entered score.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScoreUpdate {
    pub match_id: MatchId,
    #[serde(default)]
    pub home_score: Option<u32>,
    #[serde(default)]
    pub away_score: Option<u32>,
}

/// One player's prediction submission for one week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub id: EntryId,
    pub week_id: WeekId,
    pub player_id: PlayerId,
    pub submitted_at: DateTime<Utc>,
    pub correct_picks: Option<u32>,
    pub points: u32,
    pub scored_at: Option<DateTime<Utc>>,
}

impl EntryRecord {
    /// Scored against a week whose every match had a result.
    pub fn is_final(&self) -> bool {
        self.scored_at.is_some()
    }
}

/// Match level prediction attached to an entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPick {
    pub match_id: MatchId,
    pub pick: Outcome,
}

/// Values the scorer writes back onto an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryScore {
    pub correct_picks: u32,
    pub points: u32,
    pub scored_at: Option<DateTime<Utc>>,
}

/// Persisted winner assignment produced by a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeDrawRecord {
    pub week_id: WeekId,
    pub player_id: PlayerId,
    pub prize_code: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Validation failures raised at the domain boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("invalid pick '{0}': use H, D, or A")]
    InvalidPick(String),
    #[error("contact '{0}' does not contain a phone number")]
    InvalidPlayer(String),
    #[error("week id must not be blank")]
    InvalidWeek(String),
}
