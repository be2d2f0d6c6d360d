mod cli;
mod demo;
mod infra;
mod routes;
mod server;

use weekly_picks::error::AppError;

pub async fn run() -> Result<(), AppError> {
    cli::run().await
}
