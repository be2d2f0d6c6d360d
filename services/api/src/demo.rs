use crate::infra::InMemoryPredictionRepository;
use chrono::{Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use clap::Args;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::sync::Arc;
use weekly_picks::config::{AppConfig, GameConfig};
use weekly_picks::error::AppError;
use weekly_picks::predictions::{
    MatchScoreUpdate, NewMatch, Outcome, PredictionRepository, PredictionService,
    PredictionServiceError, WeekId,
};

const DEMO_FIXTURES: [(&str, &str); 6] = [
    ("Kaizer Chiefs", "Orlando Pirates"),
    ("Mamelodi Sundowns", "Stellenbosch"),
    ("Cape Town City", "SuperSport United"),
    ("AmaZulu", "Golden Arrows"),
    ("Sekhukhune United", "TS Galaxy"),
    ("Polokwane City", "Richards Bay"),
];

const DEMO_PLAYERS: usize = 8;

#[derive(Args, Debug, Default)]
pub(crate) struct WeekArgs {
    /// Resolve the week for this date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Emit the result as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Seed for fixtures, picks, and the draw. Random when omitted.
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Number of prize codes to hand out.
    #[arg(long, default_value_t = 3)]
    pub(crate) prizes: usize,
    /// Week date (YYYY-MM-DD). Defaults to today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
struct WeekReport {
    week_id: WeekId,
    date: NaiveDate,
    overridden: bool,
}

pub(crate) fn run_week(args: WeekArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    let date = args.date.unwrap_or_else(|| Local::now().date_naive());
    let week_id = WeekId::current(date, config.game.current_week_override.as_deref());
    let overridden = week_id != WeekId::for_date(date);

    if !args.json {
        println!("{week_id}");
        return Ok(());
    }

    let report = WeekReport {
        week_id,
        date,
        overridden,
    };
    match serde_json::to_string_pretty(&report) {
        Ok(json) => println!("{json}"),
        Err(err) => println!("Week report unavailable: {err}"),
    }
    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AppConfig::load()?;
    play_demo(args, config.game)?;
    Ok(())
}

/// Runs the demo week under `game` and returns the week it played.
fn play_demo(args: DemoArgs, game: GameConfig) -> Result<WeekId, AppError> {
    let DemoArgs { seed, prizes, date } = args;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let repository = Arc::new(InMemoryPredictionRepository::default());
    let service = PredictionService::new(repository.clone(), game);
    let week_id = service.current_week(date);

    println!("Weekly picks demo for {week_id}");
    let matches = service.schedule_matches(&week_id, demo_fixtures(date))?;
    println!("- Scheduled {} fixtures", matches.len());

    for player in 0..DEMO_PLAYERS {
        let contact = format!("+27 82 555 01{player:02}");
        let picks = (0..matches.len()).map(|_| random_pick(&mut rng)).collect();
        service.submit_entry(&week_id, &contact, picks)?;
    }
    println!("- Accepted {DEMO_PLAYERS} entries");

    let updates: Vec<_> = matches
        .iter()
        .map(|fixture| MatchScoreUpdate {
            match_id: fixture.id.clone(),
            home_score: Some(rng.gen_range(0..=3)),
            away_score: Some(rng.gen_range(0..=3)),
        })
        .collect();
    let summary = service.record_match_scores(updates)?;
    println!("- Scored {} entries", summary.updated_count);

    println!("\nResults");
    let results = repository
        .matches_for_week(&week_id)
        .map_err(PredictionServiceError::from)?;
    for fixture in results {
        let outcome = fixture.outcome().map(Outcome::label).unwrap_or("Pending");
        println!(
            "  {} {} - {} {} ({})",
            fixture.home_team,
            fixture.home_score.unwrap_or_default(),
            fixture.away_score.unwrap_or_default(),
            fixture.away_team,
            outcome
        );
    }

    println!("\nStandings");
    let standings = service
        .standings(&week_id)
        .map_err(PredictionServiceError::from)?;
    for (rank, standing) in standings.iter().enumerate() {
        println!(
            "  {:>2}. {} {} pts",
            rank + 1,
            standing.player_id,
            standing.total_points
        );
    }

    let prize_codes = (1..=prizes).map(|index| format!("DEMO-{index:03}")).collect();
    let request = service.draw_request(prize_codes, None, None);
    println!("\nPrize draw");
    match service.run_draw_with_rng(&week_id, &request, &mut rng) {
        Ok(outcome) => {
            println!(
                "- {} eligible players at {} point minimum",
                outcome.total_eligible, outcome.min_points
            );
            for winner in &outcome.winners {
                println!(
                    "  - {} ({} tickets) -> {}",
                    winner.player_id, winner.tickets_held, winner.prize_code
                );
            }
        }
        Err(err) => println!("  Draw skipped: {err}"),
    }

    Ok(week_id)
}

fn demo_fixtures(date: NaiveDate) -> Vec<NewMatch> {
    let midnight = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));
    DEMO_FIXTURES
        .iter()
        .enumerate()
        .map(|(index, (home, away))| NewMatch {
            home_team: home.to_string(),
            away_team: away.to_string(),
            kickoff_at: midnight + Duration::hours(13 + 2 * index as i64),
        })
        .collect()
}

fn random_pick<R: Rng>(rng: &mut R) -> Outcome {
    match rng.gen_range(0..3) {
        0 => Outcome::Home,
        1 => Outcome::Draw,
        _ => Outcome::Away,
    }
}
