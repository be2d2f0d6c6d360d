use crate::demo::{run_demo, run_week, DemoArgs, WeekArgs};
use crate::server;
use clap::{Args, Parser, Subcommand};
use weekly_picks::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "Weekly Picks",
    about = "Run the weekly prediction scoring and prize draw service from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Print the active week id
    Week(WeekArgs),
    /// Seed an in-memory week, score it, and draw winners
    Demo(DemoArgs),
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Week(args) => run_week(args),
        Command::Demo(args) => run_demo(args),
    }
}
