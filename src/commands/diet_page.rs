//! Full elimination-diet page: phase cards plus start/reset actions

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::AppState;
use crate::diet::DietError;
use crate::models::{DietActionOutcome, Phase};
use crate::schedule::{percent, DietStatus, PhaseSchedule, PhaseState};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseCard {
  pub phase: Phase,
  pub state: PhaseState,
  pub days_elapsed: u32,
  pub percent: f32,
  pub starts_on: Option<DateTime<Utc>>,
  pub ends_on: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DietPage {
  pub pet_id: String,
  pub status: DietStatus,
  pub total_days: u64,
  pub overall_percent: f32,
  pub days_remaining: u64,
  pub cards: Vec<PhaseCard>,
}

pub fn build_page(schedule: &PhaseSchedule, pet_id: &str, status: DietStatus) -> DietPage {
  let progress = status.progress().copied();
  let started_at = status.started_at();

  let cards = schedule
    .phases()
    .iter()
    .enumerate()
    .map(|(index, phase)| {
      let (state, days_elapsed) = match &progress {
        None => (PhaseState::Upcoming, 0),
        Some(progress) => match schedule.phase_state(index, progress) {
          PhaseState::Completed => (PhaseState::Completed, phase.duration),
          PhaseState::Current => (PhaseState::Current, progress.days_elapsed_in_current_phase),
          PhaseState::Upcoming => (PhaseState::Upcoming, 0),
        },
      };
      let window = started_at.and_then(|start| schedule.phase_window(index, start));

      PhaseCard {
        phase: phase.clone(),
        state,
        days_elapsed,
        percent: percent(u64::from(days_elapsed), u64::from(phase.duration)),
        starts_on: window.map(|(begins, _)| begins),
        ends_on: window.map(|(_, ends)| ends),
      }
    })
    .collect();

  let (overall_percent, days_remaining) = match &progress {
    Some(progress) => (
      schedule.overall_percent(progress),
      schedule.days_remaining_overall(progress),
    ),
    None => (0.0, schedule.total_days()),
  };

  DietPage {
    pet_id: pet_id.to_string(),
    status,
    total_days: schedule.total_days(),
    overall_percent,
    days_remaining,
    cards,
  }
}

pub async fn get_diet_page(
  state: &AppState,
  pet_id: &str,
  now: DateTime<Utc>,
) -> Result<DietPage, DietError> {
  let status = state.tracker.status(pet_id, now).await?;
  Ok(build_page(state.tracker.schedule(), pet_id.trim(), status))
}

pub async fn start_diet(
  state: &AppState,
  pet_id: &str,
  now: DateTime<Utc>,
) -> Result<DietActionOutcome, DietError> {
  state.tracker.start_diet(pet_id, now).await
}

pub async fn reset_diet(
  state: &AppState,
  pet_id: &str,
  now: DateTime<Utc>,
) -> Result<DietActionOutcome, DietError> {
  state.tracker.reset_diet(pet_id, now).await
}

pub fn list_phases(state: &AppState) -> Vec<Phase> {
  state.tracker.schedule().phases().to_vec()
}
