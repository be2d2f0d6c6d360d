use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::domain::{EntryRecord, MatchRecord, PlayerId, WeekId};
use super::repository::RepositoryError;

pub const DEFAULT_MIN_POINTS: u32 = 1;

const PRIZE_MESSAGE_LINES: [&str; 2] = [
    "Congratulations you've won on your picks this week.",
    "Please go to your home spaza to claim your prize.",
];

/// Parameters for a single draw invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawRequest {
    pub min_points: u32,
    pub prize_codes: Vec<String>,
    /// Refuse to draw when the week already has winners on record.
    #[serde(default)]
    pub reject_if_drawn: bool,
}

impl DrawRequest {
    pub fn new(prize_codes: Vec<String>) -> Self {
        Self {
            min_points: DEFAULT_MIN_POINTS,
            prize_codes,
            reject_if_drawn: false,
        }
    }

    pub fn with_min_points(mut self, min_points: u32) -> Self {
        self.min_points = min_points;
        self
    }

    pub fn rejecting_redraws(mut self) -> Self {
        self.reject_if_drawn = true;
        self
    }

    /// Threshold actually applied; a player always needs at least one ticket.
    pub fn effective_min_points(&self) -> u32 {
        self.min_points.max(DEFAULT_MIN_POINTS)
    }

    /// Trimmed, non-blank codes in the order given, first occurrence wins.
    pub fn usable_prize_codes(&self) -> Vec<String> {
        let mut seen = BTreeSet::new();
        self.prize_codes
            .iter()
            .map(|code| code.trim())
            .filter(|code| !code.is_empty())
            .filter(|code| seen.insert(code.to_string()))
            .map(str::to_string)
            .collect()
    }
}

/// A player's aggregate points for a week, used as the draw weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTickets {
    pub player_id: PlayerId,
    pub tickets: u64,
}

/// Sum entry points per player. Output is ordered by player id.
pub fn aggregate_tickets(entries: &[EntryRecord]) -> Vec<PlayerTickets> {
    let mut totals: BTreeMap<&PlayerId, u64> = BTreeMap::new();
    for entry in entries {
        *totals.entry(&entry.player_id).or_default() += u64::from(entry.points);
    }
    totals
        .into_iter()
        .map(|(player_id, tickets)| PlayerTickets {
            player_id: player_id.clone(),
            tickets,
        })
        .collect()
}

pub fn eligible_players(tickets: Vec<PlayerTickets>, min_points: u32) -> Vec<PlayerTickets> {
    let threshold = u64::from(min_points.max(DEFAULT_MIN_POINTS));
    let mut eligible: Vec<_> = tickets
        .into_iter()
        .filter(|player| player.tickets >= threshold)
        .collect();
    eligible.sort_by(|a, b| a.player_id.cmp(&b.player_id));
    eligible
}

/// Every fixture of the week must carry a final score before a draw.
pub fn ensure_week_resolved(matches: &[MatchRecord]) -> Result<(), DrawError> {
    if matches.is_empty() {
        return Err(DrawError::NoMatches);
    }
    let unresolved = matches.iter().filter(|fixture| !fixture.is_finished()).count();
    if unresolved > 0 {
        return Err(DrawError::IncompleteWeek { unresolved });
    }
    Ok(())
}

/// Cumulative-weight inversion over the remaining pool: roll in `[1, total]` and walk the
/// pool subtracting weights until the roll is covered.
fn pick_weighted<R: Rng>(pool: &[PlayerTickets], rng: &mut R) -> usize {
    let total: u64 = pool.iter().map(|player| player.tickets).sum();
    let mut roll = rng.gen_range(1..=total);
    for (index, player) in pool.iter().enumerate() {
        if roll <= player.tickets {
            return index;
        }
        roll -= player.tickets;
    }
    pool.len() - 1
}

/// Weighted sampling without replacement. Each drawn player takes the next unused code.
///
/// Pool members must hold at least one ticket.
pub fn assign_prizes<R: Rng>(
    mut pool: Vec<PlayerTickets>,
    prize_codes: &[String],
    rng: &mut R,
) -> Vec<DrawWinner> {
    pool.retain(|player| player.tickets > 0);
    let mut winners = Vec::with_capacity(prize_codes.len().min(pool.len()));
    for code in prize_codes {
        if pool.is_empty() {
            break;
        }
        let index = pick_weighted(&pool, rng);
        let winner = pool.swap_remove(index);
        winners.push(DrawWinner {
            player_id: winner.player_id,
            tickets_held: winner.tickets,
            prize_code: code.clone(),
            message: prize_message(code),
        });
    }
    winners
}

pub fn prize_message(prize_code: &str) -> String {
    format!("{}\n{prize_code}", PRIZE_MESSAGE_LINES.join("\n"))
}

/// One winner of a draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawWinner {
    pub player_id: PlayerId,
    pub tickets_held: u64,
    pub prize_code: String,
    pub message: String,
}

/// Result of a completed draw.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawOutcome {
    pub week_id: WeekId,
    pub min_points: u32,
    pub total_eligible: usize,
    pub winners: Vec<DrawWinner>,
}

#[derive(Debug, thiserror::Error)]
pub enum DrawError {
    #[error("No matches found for this week.")]
    NoMatches,
    #[error("All match scores must be set before drawing winners ({unresolved} still open).")]
    IncompleteWeek { unresolved: usize },
    #[error("No entries found for this week.")]
    NoEntries,
    #[error("No players reached the minimum of {min_points} points.")]
    NoEligiblePlayers { min_points: u32 },
    #[error("At least one prize code is required.")]
    NoPrizes,
    #[error("This week already has {existing} prize draw records.")]
    AlreadyDrawn { existing: usize },
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use crate::predictions::domain::EntryId;

    fn player(contact: &str) -> PlayerId {
        PlayerId::from_contact(contact).expect("valid contact")
    }

    fn tickets(contact: &str, tickets: u64) -> PlayerTickets {
        PlayerTickets {
            player_id: player(contact),
            tickets,
        }
    }

    fn entry(id: &str, contact: &str, points: u32) -> EntryRecord {
        EntryRecord {
            id: EntryId(id.to_string()),
            week_id: WeekId::parse("2026-W05").expect("week"),
            player_id: player(contact),
            submitted_at: Utc::now(),
            correct_picks: None,
            points,
            scored_at: None,
        }
    }

    fn codes(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn aggregate_sums_entries_per_normalized_player() {
        let entries = [
            entry("e1", "+27 82 555 0101", 10),
            entry("e2", "27825550101", 20),
            entry("e3", "27825550202", 1),
        ];

        let totals = aggregate_tickets(&entries);
        assert_eq!(
            totals,
            vec![tickets("27825550101", 30), tickets("27825550202", 1)]
        );
    }

    #[test]
    fn threshold_excludes_players_below_min_points() {
        let pool = vec![tickets("100", 10), tickets("200", 3), tickets("300", 0)];
        let eligible = eligible_players(pool, 5);
        assert_eq!(eligible, vec![tickets("100", 10)]);

        let mut rng = StdRng::seed_from_u64(7);
        let winners = assign_prizes(eligible, &codes(&["P1", "P2"]), &mut rng);
        assert_eq!(winners.len(), 1);
        assert_eq!(winners[0].player_id, player("100"));
        assert_eq!(winners[0].prize_code, "P1");
    }

    #[test]
    fn zero_threshold_still_requires_a_ticket() {
        let eligible = eligible_players(vec![tickets("1", 0), tickets("2", 1)], 0);
        assert_eq!(eligible, vec![tickets("2", 1)]);
    }

    #[test]
    fn winners_and_codes_are_distinct() {
        let pool: Vec<_> = (1..=6).map(|n| tickets(&n.to_string(), n * 10)).collect();
        let prize_codes = codes(&["A", "B", "C", "D"]);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let winners = assign_prizes(pool.clone(), &prize_codes, &mut rng);
            assert_eq!(winners.len(), 4);

            let players: BTreeSet<_> = winners.iter().map(|w| w.player_id.clone()).collect();
            let prizes: Vec<_> = winners.iter().map(|w| w.prize_code.as_str()).collect();
            assert_eq!(players.len(), 4);
            assert_eq!(prizes, vec!["A", "B", "C", "D"]);
        }
    }

    #[test]
    fn more_prizes_than_players_awards_everyone_once() {
        let pool = vec![tickets("1", 5), tickets("2", 1)];
        let mut rng = StdRng::seed_from_u64(3);
        let winners = assign_prizes(pool, &codes(&["A", "B", "C"]), &mut rng);
        assert_eq!(winners.len(), 2);
        assert_ne!(winners[0].player_id, winners[1].player_id);
        assert_eq!(winners[1].prize_code, "B");
    }

    #[test]
    fn selection_frequency_tracks_ticket_weight() {
        let pool = vec![tickets("1", 100), tickets("2", 1)];
        let prize = codes(&["ONLY"]);
        let mut rng = StdRng::seed_from_u64(2026);
        let mut heavy = 0u32;
        let mut light = 0u32;

        for _ in 0..100_000 {
            let winners = assign_prizes(pool.clone(), &prize, &mut rng);
            if winners[0].player_id == player("1") {
                heavy += 1;
            } else {
                light += 1;
            }
        }

        // Expected light share is 1/101 (~990 draws); allow generous slack.
        assert!((800..=1200).contains(&light), "light player won {light} times");
        let ratio = f64::from(heavy) / f64::from(light);
        assert!((80.0..=125.0).contains(&ratio), "ratio {ratio}");
    }

    #[test]
    fn request_normalizes_prize_codes_and_threshold() {
        let request = DrawRequest::new(codes(&[" A1 ", "", "B2", "A1", "  "])).with_min_points(0);
        assert_eq!(request.usable_prize_codes(), codes(&["A1", "B2"]));
        assert_eq!(request.effective_min_points(), 1);
    }

    #[test]
    fn prize_message_embeds_code_on_last_line() {
        let message = prize_message("SPAZA-42");
        assert_eq!(
            message,
            "Congratulations you've won on your picks this week.\nPlease go to your home spaza to claim your prize.\nSPAZA-42"
        );
    }
}
