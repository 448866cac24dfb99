//! Elimination-Diet Phase Scheduler
//!
//! Maps a diet start instant onto an ordered table of phases and answers:
//! - how many whole days have passed since the start
//! - which phase is active, and how many days into it we are
//! - whether the whole schedule has run out
//!
//! Key rules:
//! - `now` is always passed in, never read from the system clock here
//! - Days are whole days, truncated (23h59m is still day 0)
//! - A phase boundary belongs to the following phase, at its day 0
//! - A start instant in the future clamps to phase 0, day 0
//! - Completion is reported explicitly, the last phase is shown as fully elapsed

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::Phase;

const MS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

// ---------------------------------------------------------------------------
/// Schedule validation
// ---------------------------------------------------------------------------

/// A phase table that breaks the scheduler's contract. Only ever a
/// programming or content error, never caused by the dates involved.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum InvalidScheduleError {
    #[error("Phase schedule is empty")]
    EmptySchedule,

    #[error("Phase {phase_id} ({name}) has a duration of zero days")]
    ZeroDuration { phase_id: u32, name: String },

    #[error("Phase {phase_id} ({name}) has a duration of {duration} days, expected 1 to 4294967295")]
    DurationOutOfRange {
        phase_id: u32,
        name: String,
        duration: i64,
    },
}

fn validate(phases: &[Phase]) -> Result<(), InvalidScheduleError> {
    if phases.is_empty() {
        return Err(InvalidScheduleError::EmptySchedule);
    }
    if let Some(phase) = phases.iter().find(|p| p.duration == 0) {
        return Err(InvalidScheduleError::ZeroDuration {
            phase_id: phase.id,
            name: phase.name.clone(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
/// Diet Progress: derived, never stored
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DietProgress {
    /// Whole days since the start, 0 when the start lies in the future
    pub total_days_elapsed: u64,
    /// Active phase, the last one once complete
    pub current_phase_index: usize,
    /// 0..=duration of the active phase (== duration only when complete)
    pub days_elapsed_in_current_phase: u32,
    pub is_complete: bool,
}

/// Where a single phase stands relative to the current progress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseState {
    Completed,
    Current,
    Upcoming,
}

/// Whole days between two instants, truncating toward zero
pub fn whole_days_between(start: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - start).num_milliseconds() / MS_PER_DAY
}

/// Compute progress against an unvalidated phase list.
///
/// Errors only when `phases` is empty or contains a zero-day phase; any
/// pair of instants is accepted.
pub fn compute_progress(
    phases: &[Phase],
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<DietProgress, InvalidScheduleError> {
    validate(phases)?;
    Ok(progress_for(phases, start, now))
}

// Assumes `phases` already passed `validate`.
fn progress_for(phases: &[Phase], start: DateTime<Utc>, now: DateTime<Utc>) -> DietProgress {
    let elapsed = whole_days_between(start, now);
    if elapsed < 0 {
        // Clock skew or a start entered ahead of time: hold at the very beginning
        return DietProgress::default();
    }
    let total_days_elapsed = elapsed as u64;

    let mut days_accumulated: u64 = 0;
    for (index, phase) in phases.iter().enumerate() {
        days_accumulated += u64::from(phase.duration);
        if total_days_elapsed < days_accumulated {
            let phase_start_day = days_accumulated - u64::from(phase.duration);
            return DietProgress {
                total_days_elapsed,
                current_phase_index: index,
                days_elapsed_in_current_phase: (total_days_elapsed - phase_start_day) as u32,
                is_complete: false,
            };
        }
    }

    DietProgress {
        total_days_elapsed,
        current_phase_index: phases.len().saturating_sub(1),
        days_elapsed_in_current_phase: phases.last().map_or(0, |p| p.duration),
        is_complete: true,
    }
}

// ---------------------------------------------------------------------------
/// Phase Schedule: a validated, ordered phase table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Phase>", into = "Vec<Phase>")]
pub struct PhaseSchedule {
    phases: Vec<Phase>,
    total_days: u64,
}

impl TryFrom<Vec<Phase>> for PhaseSchedule {
    type Error = InvalidScheduleError;

    fn try_from(phases: Vec<Phase>) -> Result<Self, Self::Error> {
        Self::new(phases)
    }
}

impl From<PhaseSchedule> for Vec<Phase> {
    fn from(schedule: PhaseSchedule) -> Self {
        schedule.phases
    }
}

impl PhaseSchedule {
    pub fn new(phases: Vec<Phase>) -> Result<Self, InvalidScheduleError> {
        validate(&phases)?;
        let total_days = phases.iter().map(|p| u64::from(p.duration)).sum();
        Ok(Self { phases, total_days })
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn phase(&self, index: usize) -> Option<&Phase> {
        self.phases.get(index)
    }

    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// Sum of all phase durations
    pub fn total_days(&self) -> u64 {
        self.total_days
    }

    pub fn compute_progress(&self, start: DateTime<Utc>, now: DateTime<Utc>) -> DietProgress {
        progress_for(&self.phases, start, now)
    }

    /// The phase the progress points at
    pub fn current_phase(&self, progress: &DietProgress) -> Option<&Phase> {
        self.phase(progress.current_phase_index)
    }

    /// Day offset (from the diet start) at which phase `index` begins
    pub fn phase_start_day(&self, index: usize) -> Option<u64> {
        if index >= self.phases.len() {
            return None;
        }
        Some(
            self.phases[..index]
                .iter()
                .map(|p| u64::from(p.duration))
                .sum(),
        )
    }

    /// Start and end instants of phase `index` for a diet started at `start`.
    /// The end instant is the start of the following phase. `None` when the
    /// index is out of range or the dates fall outside what chrono can hold.
    pub fn phase_window(
        &self,
        index: usize,
        start: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let first_day = self.phase_start_day(index)?;
        let duration = u64::from(self.phases[index].duration);
        let begins = add_days(start, first_day)?;
        let ends = add_days(start, first_day + duration)?;
        Some((begins, ends))
    }

    pub fn phase_state(&self, index: usize, progress: &DietProgress) -> PhaseState {
        if progress.is_complete || index < progress.current_phase_index {
            PhaseState::Completed
        } else if index == progress.current_phase_index {
            PhaseState::Current
        } else {
            PhaseState::Upcoming
        }
    }

    /// Overall progress bar, 0.0..=100.0
    pub fn overall_percent(&self, progress: &DietProgress) -> f32 {
        let done = progress.total_days_elapsed.min(self.total_days);
        percent(done, self.total_days)
    }

    /// Progress bar for the active phase, 0.0..=100.0
    pub fn phase_percent(&self, progress: &DietProgress) -> f32 {
        match self.current_phase(progress) {
            Some(phase) => percent(
                u64::from(progress.days_elapsed_in_current_phase),
                u64::from(phase.duration),
            ),
            None => 0.0,
        }
    }

    pub fn days_remaining_in_phase(&self, progress: &DietProgress) -> u32 {
        self.current_phase(progress)
            .map(|p| p.duration.saturating_sub(progress.days_elapsed_in_current_phase))
            .unwrap_or(0)
    }

    pub fn days_remaining_overall(&self, progress: &DietProgress) -> u64 {
        self.total_days.saturating_sub(progress.total_days_elapsed)
    }
}

fn add_days(start: DateTime<Utc>, days: u64) -> Option<DateTime<Utc>> {
    let days = i64::try_from(days).ok()?;
    start.checked_add_signed(TimeDelta::try_days(days)?)
}

/// `part / whole` as a progress-bar percentage, clamped to 0.0..=100.0
pub(crate) fn percent(part: u64, whole: u64) -> f32 {
    if whole == 0 {
        return 0.0;
    }
    ((part as f64 / whole as f64) * 100.0).clamp(0.0, 100.0) as f32
}

// ---------------------------------------------------------------------------
/// Diet Status: lifecycle as seen by the UI
// ---------------------------------------------------------------------------

/// `NotStarted` is distinct from day 0: no start instant has been stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum DietStatus {
    NotStarted,
    InProgress {
        started_at: DateTime<Utc>,
        progress: DietProgress,
    },
    Complete {
        started_at: DateTime<Utc>,
        progress: DietProgress,
    },
}

impl DietStatus {
    pub fn evaluate(
        schedule: &PhaseSchedule,
        started_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(started_at) = started_at else {
            return Self::NotStarted;
        };
        let progress = schedule.compute_progress(started_at, now);
        if progress.is_complete {
            Self::Complete { started_at, progress }
        } else {
            Self::InProgress { started_at, progress }
        }
    }

    pub fn progress(&self) -> Option<&DietProgress> {
        match self {
            Self::NotStarted => None,
            Self::InProgress { progress, .. } | Self::Complete { progress, .. } => Some(progress),
        }
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::NotStarted => None,
            Self::InProgress { started_at, .. } | Self::Complete { started_at, .. } => {
                Some(*started_at)
            }
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, Self::Complete { .. })
    }
}

impl std::fmt::Display for DietStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::InProgress { .. } => write!(f, "in_progress"),
            Self::Complete { .. } => write!(f, "complete"),
        }
    }
}

// ---------------------------------------------------------------------------
/// Tests
// ---------------------------------------------------------------------------
