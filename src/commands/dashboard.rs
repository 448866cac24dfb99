//! Dashboard summary card for the elimination diet

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::AppState;
use crate::diet::DietError;
use crate::schedule::{DietStatus, PhaseSchedule};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
  pub pet_id: String,
  pub state: String,
  pub started_at: Option<DateTime<Utc>>,
  /// 1-based, matches `Phase::id` ordering
  pub phase_number: Option<usize>,
  pub phase_count: usize,
  pub phase_name: Option<String>,
  /// Calendar day shown to the user, day 0 elapsed is "Day 1"
  pub display_day: Option<u32>,
  pub phase_duration: Option<u32>,
  /// Progress bar for the active phase
  pub phase_percent: f32,
  pub days_remaining_in_phase: Option<u32>,
  pub overall_percent: f32,
  pub days_remaining: u64,
  pub headline: String,
}

/// Build the card from an already evaluated status
pub fn summarize(schedule: &PhaseSchedule, pet_id: &str, status: &DietStatus) -> DashboardSummary {
  let mut summary = DashboardSummary {
    pet_id: pet_id.to_string(),
    state: status.to_string(),
    started_at: status.started_at(),
    phase_number: None,
    phase_count: schedule.phase_count(),
    phase_name: None,
    display_day: None,
    phase_duration: None,
    phase_percent: 0.0,
    days_remaining_in_phase: None,
    overall_percent: 0.0,
    days_remaining: schedule.total_days(),
    headline: "Start the elimination diet to track progress".to_string(),
  };

  let Some(progress) = status.progress() else {
    return summary;
  };
  let Some(phase) = schedule.current_phase(progress) else {
    return summary;
  };

  let display_day = progress
    .days_elapsed_in_current_phase
    .saturating_add(1)
    .min(phase.duration);

  summary.phase_number = Some(progress.current_phase_index + 1);
  summary.phase_name = Some(phase.name.clone());
  summary.display_day = Some(display_day);
  summary.phase_duration = Some(phase.duration);
  summary.phase_percent = schedule.phase_percent(progress);
  summary.days_remaining_in_phase = Some(schedule.days_remaining_in_phase(progress));
  summary.overall_percent = schedule.overall_percent(progress);
  summary.days_remaining = schedule.days_remaining_overall(progress);
  summary.headline = if progress.is_complete {
    "Elimination diet complete".to_string()
  } else {
    format!("{} - day {} of {}", phase.name, display_day, phase.duration)
  };

  summary
}

pub async fn get_dashboard_summary(
  state: &AppState,
  pet_id: &str,
  now: DateTime<Utc>,
) -> Result<DashboardSummary, DietError> {
  let status = state.tracker.status(pet_id, now).await?;
  Ok(summarize(state.tracker.schedule(), pet_id.trim(), &status))
}
