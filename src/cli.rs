//! Command-line surface over the diet commands

use std::io::Write;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use crate::commands::{self, DashboardSummary, DietPage};
use crate::config::ConfigError;
use crate::db::AppState;
use crate::diet::DietError;
use crate::models::{DietActionOutcome, Phase};
use crate::phases::PhaseTableError;
use crate::schedule::PhaseState;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    PhaseTable(#[from] PhaseTableError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Diet(#[from] DietError),

    #[error("Output failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Parser)]
#[command(name = "diet-tracker", version, about = "Track a pet's elimination diet")]
pub struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Args)]
pub struct PetArgs {
    /// Pet identifier the diet is stored under
    #[arg(long)]
    pub pet: String,

    /// Instant to act at or evaluate for (RFC 3339), defaults to now
    #[arg(long, value_parser = parse_instant)]
    pub at: Option<DateTime<Utc>>,
}

impl PetArgs {
    fn instant(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the diet (phase 1, day 1)
    Start(PetArgs),
    /// Restart the diet from the first phase
    Reset(PetArgs),
    /// Dashboard summary for one pet
    Status(PetArgs),
    /// Every phase card for one pet
    Page(PetArgs),
    /// List the configured phase table
    Phases,
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("expected an RFC 3339 timestamp: {}", e))
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch<W: Write>(state: &AppState, cli: &Cli, out: &mut W) -> Result<(), CliError> {
    match &cli.command {
        Command::Start(args) => {
            let outcome = commands::start_diet(state, &args.pet, args.instant()).await?;
            emit(out, cli.json, &outcome, render_outcome)
        }
        Command::Reset(args) => {
            let outcome = commands::reset_diet(state, &args.pet, args.instant()).await?;
            emit(out, cli.json, &outcome, render_outcome)
        }
        Command::Status(args) => {
            let summary = commands::get_dashboard_summary(state, &args.pet, args.instant()).await?;
            emit(out, cli.json, &summary, render_summary)
        }
        Command::Page(args) => {
            let page = commands::get_diet_page(state, &args.pet, args.instant()).await?;
            emit(out, cli.json, &page, render_page)
        }
        Command::Phases => {
            let phases = commands::list_phases(state);
            emit(out, cli.json, &phases, |out, phases| render_phases(out, phases))
        }
    }
}

fn emit<W, T, F>(out: &mut W, json: bool, value: &T, render: F) -> Result<(), CliError>
where
    W: Write,
    T: Serialize + ?Sized,
    F: FnOnce(&mut W, &T) -> std::io::Result<()>,
{
    if json {
        serde_json::to_writer_pretty(&mut *out, value)?;
        writeln!(out)?;
    } else {
        render(out, value)?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Text rendering
// ---------------------------------------------------------------------------

fn render_outcome<W: Write>(out: &mut W, outcome: &DietActionOutcome) -> std::io::Result<()> {
    writeln!(out, "{}", outcome.message)?;
    writeln!(out, "Pet: {}  Started: {}", outcome.pet_id, outcome.started_at.to_rfc3339())
}

fn render_summary<W: Write>(out: &mut W, summary: &DashboardSummary) -> std::io::Result<()> {
    writeln!(out, "{}", summary.headline)?;
    if summary.started_at.is_some() {
        writeln!(
            out,
            "Overall: {:.0}%  ({} days remaining)",
            summary.overall_percent, summary.days_remaining
        )?;
    }
    Ok(())
}

fn render_page<W: Write>(out: &mut W, page: &DietPage) -> std::io::Result<()> {
    writeln!(out, "Pet: {}  Status: {}", page.pet_id, page.status)?;
    writeln!(
        out,
        "Overall: {:.0}% of {} days  ({} remaining)",
        page.overall_percent, page.total_days, page.days_remaining
    )?;
    for card in &page.cards {
        let marker = match card.state {
            PhaseState::Completed => "[x]",
            PhaseState::Current => "[>]",
            PhaseState::Upcoming => "[ ]",
        };
        write!(
            out,
            "{} {}. {}  {}/{} days",
            marker, card.phase.id, card.phase.name, card.days_elapsed, card.phase.duration
        )?;
        if let (Some(starts), Some(ends)) = (card.starts_on, card.ends_on) {
            write!(out, "  ({} to {})", starts.date_naive(), ends.date_naive())?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn render_phases<W: Write>(out: &mut W, phases: &[Phase]) -> std::io::Result<()> {
    for phase in phases {
        writeln!(out, "{}. {} ({} days)", phase.id, phase.name, phase.duration)?;
        if !phase.description.is_empty() {
            writeln!(out, "   {}", phase.description)?;
        }
        for tip in &phase.tips {
            writeln!(out, "   - {}", tip)?;
        }
        if !phase.recommended_foods.is_empty() {
            writeln!(out, "   Foods: {}", phase.recommended_foods.join(", "))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{setup_test_state, teardown_test_db, utc};
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_status_with_instant() {
        let cli = Cli::try_parse_from([
            "diet-tracker",
            "status",
            "--pet",
            "rex",
            "--at",
            "2024-01-20T00:00:00Z",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Command::Status(args) => {
                assert_eq!(args.pet, "rex");
                assert_eq!(args.at, Some(utc(2024, 1, 20)));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_bad_instant() {
        let result = Cli::try_parse_from(["diet-tracker", "start", "--pet", "rex", "--at", "tomorrow"]);
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_dispatch_text_flow() {
        let state = setup_test_state().await;
        let mut out = Vec::new();

        let start = Cli::try_parse_from(["diet-tracker", "start", "--pet", "rex", "--at", "2024-01-01T00:00:00Z"]).unwrap();
        dispatch(&state, &start, &mut out).await.unwrap();

        let status = Cli::try_parse_from(["diet-tracker", "status", "--pet", "rex", "--at", "2024-01-20T00:00:00Z"]).unwrap();
        dispatch(&state, &status, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Elimination diet started!"));
        assert!(text.contains("Reintroduction - day 6 of 14"));

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    async fn test_dispatch_json_page() {
        let state = setup_test_state().await;
        let mut out = Vec::new();

        let page = Cli::try_parse_from(["diet-tracker", "page", "--pet", "rex", "--json"]).unwrap();
        dispatch(&state, &page, &mut out).await.unwrap();

        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["status"]["state"], "not_started");
        assert_eq!(value["cards"].as_array().unwrap().len(), 4);

        teardown_test_db(state.db).await;
    }

    #[tokio::test]
    async fn test_dispatch_phases_text() {
        let state = setup_test_state().await;
        let mut out = Vec::new();

        let phases = Cli::try_parse_from(["diet-tracker", "phases"]).unwrap();
        dispatch(&state, &phases, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("1. Elimination (14 days)"));
        assert!(text.contains("4. Maintenance (7 days)"));

        teardown_test_db(state.db).await;
    }
}
