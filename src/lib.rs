pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod diet;
pub mod models;
pub mod phases;
pub mod schedule;
pub mod store;

#[cfg(test)]
mod test_utils;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, CliError};
use config::{AppConfig, DEFAULT_LOG_FILTER};
use db::AppState;

pub use schedule::{compute_progress, DietProgress, DietStatus, InvalidScheduleError, PhaseSchedule};

fn init_tracing() {
  // stderr keeps `--json` output on stdout clean
  tracing_subscriber::registry()
    .with(
      tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
    )
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .init();
}

pub fn run() -> Result<(), CliError> {
  // Load environment variables from .env file
  dotenvy::dotenv().ok();
  init_tracing();

  let cli = Cli::parse();
  let config = AppConfig::from_env()?;

  let runtime = tokio::runtime::Builder::new_multi_thread()
    .enable_all()
    .build()?;

  runtime.block_on(execute(cli, config))
}

async fn execute(cli: Cli, config: AppConfig) -> Result<(), CliError> {
  let schedule = phases::load_schedule(config.phases_file.as_deref())?;
  let pool = db::initialize_db(&config).await?;
  let state = AppState::new(pool, schedule);
  info!(phases = state.tracker.schedule().phase_count(), "Diet tracker ready");

  let mut stdout = std::io::stdout().lock();
  let result = cli::dispatch(&state, &cli, &mut stdout).await;
  state.db.close().await;
  result
}
