use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryPredictionRepository};
use crate::routes::with_prediction_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use weekly_picks::config::AppConfig;
use weekly_picks::error::AppError;
use weekly_picks::predictions::PredictionService;
use weekly_picks::telemetry;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryPredictionRepository::default());
    let prediction_service = Arc::new(PredictionService::new(repository, config.game.clone()));

    let app = with_prediction_routes(prediction_service.clone())
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    let game = prediction_service.config();
    info!(
        ?config.environment,
        %addr,
        alignment = ?game.alignment,
        min_points = game.draw_min_points,
        week_override = game.current_week_override.as_deref(),
        "weekly picks service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
