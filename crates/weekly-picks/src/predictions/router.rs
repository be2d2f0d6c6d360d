use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{MatchScoreUpdate, NewMatch, Outcome, WeekId};
use super::draw::DrawError;
use super::repository::{PredictionRepository, RepositoryError};
use super::scoring::ScoringError;
use super::service::{PredictionService, PredictionServiceError};

/// Router builder exposing admin scoring/draw actions and public week views.
pub fn prediction_router<R>(service: Arc<PredictionService<R>>) -> Router
where
    R: PredictionRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/admin/weeks/:week_id/matches",
            post(schedule_matches_handler::<R>),
        )
        .route(
            "/api/v1/admin/matches/scores",
            post(record_scores_handler::<R>),
        )
        .route(
            "/api/v1/admin/weeks/:week_id/score",
            post(score_week_handler::<R>),
        )
        .route(
            "/api/v1/admin/weeks/:week_id/draw",
            post(draw_handler::<R>),
        )
        .route(
            "/api/v1/weeks/:week_id/entries",
            post(submit_entry_handler::<R>),
        )
        .route(
            "/api/v1/weeks/:week_id/standings",
            get(standings_handler::<R>),
        )
        .route(
            "/api/v1/weeks/:week_id/matches",
            get(week_matches_handler::<R>),
        )
        .route(
            "/api/v1/weeks/:week_id/players/:contact/entries",
            get(player_entries_handler::<R>),
        )
        .route(
            "/api/v1/players/:contact/weeks",
            get(player_weeks_handler::<R>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ScheduleMatchesRequest {
    pub(crate) matches: Vec<NewMatch>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordScoresRequest {
    pub(crate) scores: Vec<MatchScoreUpdate>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DrawRequestBody {
    #[serde(default)]
    pub(crate) min_points: Option<u32>,
    #[serde(default)]
    pub(crate) prize_codes: Vec<String>,
    #[serde(default)]
    pub(crate) reject_if_drawn: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubmitEntryRequest {
    pub(crate) contact: String,
    pub(crate) picks: Vec<Outcome>,
}

pub(crate) fn repository_status(error: &RepositoryError) -> StatusCode {
    match error {
        RepositoryError::Conflict => StatusCode::CONFLICT,
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Unavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

pub(crate) fn scoring_status(error: &ScoringError) -> StatusCode {
    match error {
        ScoringError::AlignmentMismatch { .. } => StatusCode::BAD_REQUEST,
        ScoringError::Repository(inner) => repository_status(inner),
    }
}

pub(crate) fn draw_status(error: &DrawError) -> StatusCode {
    match error {
        DrawError::IncompleteWeek { .. } | DrawError::NoPrizes => StatusCode::BAD_REQUEST,
        DrawError::NoMatches | DrawError::NoEntries | DrawError::NoEligiblePlayers { .. } => {
            StatusCode::NOT_FOUND
        }
        DrawError::AlreadyDrawn { .. } => StatusCode::CONFLICT,
        DrawError::Repository(inner) => repository_status(inner),
    }
}

pub(crate) fn service_status(error: &PredictionServiceError) -> StatusCode {
    match error {
        PredictionServiceError::Scoring(inner) => scoring_status(inner),
        PredictionServiceError::Draw(inner) => draw_status(inner),
        PredictionServiceError::Repository(inner) => repository_status(inner),
        PredictionServiceError::NoFixtures(_) => StatusCode::NOT_FOUND,
        PredictionServiceError::WeekHasEntries(_) => StatusCode::CONFLICT,
        PredictionServiceError::Domain(_)
        | PredictionServiceError::EmptyScoreUpdate
        | PredictionServiceError::InvalidFixture(_)
        | PredictionServiceError::PickCountMismatch { .. } => StatusCode::BAD_REQUEST,
    }
}

fn error_response(status: StatusCode, message: String) -> Response {
    let payload = json!({
        "ok": false,
        "error": message,
    });
    (status, axum::Json(payload)).into_response()
}

fn parse_week(raw: &str) -> Result<WeekId, Response> {
    WeekId::parse(raw).map_err(|err| error_response(StatusCode::BAD_REQUEST, err.to_string()))
}

pub(crate) async fn schedule_matches_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
    axum::Json(request): axum::Json<ScheduleMatchesRequest>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.schedule_matches(&week_id, request.matches) {
        Ok(created) => {
            let payload = json!({
                "ok": true,
                "week_id": week_id,
                "created": created.len(),
                "matches": created,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(service_status(&error), error.to_string()),
    }
}

pub(crate) async fn record_scores_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    axum::Json(request): axum::Json<RecordScoresRequest>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let updated = request.scores.len();
    match service.record_match_scores(request.scores) {
        Ok(summary) => {
            let payload = json!({
                "ok": true,
                "updated": updated,
                "scoring": summary,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(service_status(&error), error.to_string()),
    }
}

pub(crate) async fn score_week_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.score_week(&week_id) {
        Ok(summary) => {
            let payload = json!({
                "ok": true,
                "scored_weeks": summary.scored_weeks,
                "pending_weeks": summary.pending_weeks,
                "updated_count": summary.updated_count,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(scoring_status(&error), error.to_string()),
    }
}

pub(crate) async fn draw_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
    axum::Json(body): axum::Json<DrawRequestBody>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    let request = service.draw_request(body.prize_codes, body.min_points, body.reject_if_drawn);
    match service.run_draw(&week_id, &request) {
        Ok(outcome) => {
            let payload = json!({
                "ok": true,
                "week_id": outcome.week_id,
                "min_points": outcome.min_points,
                "total_eligible": outcome.total_eligible,
                "winners": outcome.winners,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(draw_status(&error), error.to_string()),
    }
}

pub(crate) async fn submit_entry_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
    axum::Json(request): axum::Json<SubmitEntryRequest>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.submit_entry(&week_id, &request.contact, request.picks) {
        Ok(entry) => {
            let payload = json!({
                "ok": true,
                "entry_id": entry.id,
                "player_id": entry.player_id,
                "week_id": entry.week_id,
            });
            (StatusCode::CREATED, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(service_status(&error), error.to_string()),
    }
}

pub(crate) async fn standings_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.standings(&week_id) {
        Ok(standings) => {
            let payload = json!({
                "week_id": week_id,
                "standings": standings,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(repository_status(&error), error.to_string()),
    }
}

pub(crate) async fn week_matches_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(week_id): Path<String>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.week_matches(&week_id) {
        Ok(matches) => {
            let payload = json!({
                "week_id": week_id,
                "matches": matches,
            });
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(error) => error_response(repository_status(&error), error.to_string()),
    }
}

pub(crate) async fn player_entries_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path((week_id, contact)): Path<(String, String)>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    let week_id = match parse_week(&week_id) {
        Ok(week_id) => week_id,
        Err(response) => return response,
    };

    match service.player_entries(&week_id, &contact) {
        Ok(breakdown) => (StatusCode::OK, axum::Json(breakdown)).into_response(),
        Err(error) => error_response(service_status(&error), error.to_string()),
    }
}

pub(crate) async fn player_weeks_handler<R>(
    State(service): State<Arc<PredictionService<R>>>,
    Path(contact): Path<String>,
) -> Response
where
    R: PredictionRepository + 'static,
{
    match service.player_weeks(&contact) {
        Ok(history) => (StatusCode::OK, axum::Json(history)).into_response(),
        Err(error) => error_response(service_status(&error), error.to_string()),
    }
}
