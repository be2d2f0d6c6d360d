use std::cmp::Ordering;

use super::domain::Outcome;

/// Derive a match outcome from final scores. `None` while either score is missing.
pub fn outcome(home_score: Option<u32>, away_score: Option<u32>) -> Option<Outcome> {
    let (home, away) = (home_score?, away_score?);
    Some(match home.cmp(&away) {
        Ordering::Greater => Outcome::Home,
        Ordering::Less => Outcome::Away,
        Ordering::Equal => Outcome::Draw,
    })
}
