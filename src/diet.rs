//! Diet lifecycle service
//!
//! The one stateful seam around the scheduler: writes the start instant on
//! start/reset and evaluates the stored instant against the phase table.
//! Start and reset persist the same way; the action only changes the log line
//! and the confirmation message.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{DietAction, DietActionOutcome};
use crate::schedule::{DietStatus, PhaseSchedule};
use crate::store::{StartInstantStore, StoreError};

#[derive(Debug, Error)]
pub enum DietError {
    #[error("Pet id must not be empty")]
    MissingPetId,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl Serialize for DietError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

fn check_pet_id(pet_id: &str) -> Result<&str, DietError> {
    let trimmed = pet_id.trim();
    if trimmed.is_empty() {
        Err(DietError::MissingPetId)
    } else {
        Ok(trimmed)
    }
}

pub struct DietTracker<S> {
    store: S,
    schedule: PhaseSchedule,
}

impl<S: StartInstantStore> DietTracker<S> {
    pub fn new(store: S, schedule: PhaseSchedule) -> Self {
        Self { store, schedule }
    }

    pub fn schedule(&self) -> &PhaseSchedule {
        &self.schedule
    }

    /// Begin the diet at `now` (phase 0, day 0)
    pub async fn start_diet(
        &self,
        pet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DietActionOutcome, DietError> {
        self.record(pet_id, DietAction::Start, now).await
    }

    /// Restart the diet at `now`, discarding the previous start
    pub async fn reset_diet(
        &self,
        pet_id: &str,
        now: DateTime<Utc>,
    ) -> Result<DietActionOutcome, DietError> {
        self.record(pet_id, DietAction::Reset, now).await
    }

    /// Overwrite the stored start instant. Both actions land here.
    pub async fn record(
        &self,
        pet_id: &str,
        action: DietAction,
        now: DateTime<Utc>,
    ) -> Result<DietActionOutcome, DietError> {
        let pet_id = check_pet_id(pet_id)?;

        self.store.save_start_instant(pet_id, now).await?;
        info!(pet_id, %action, started_at = %now, "Diet start instant written");

        Ok(DietActionOutcome {
            pet_id: pet_id.to_string(),
            action,
            started_at: now,
            message: action.confirmation().to_string(),
        })
    }

    pub async fn load_start_instant(&self, pet_id: &str) -> Result<Option<DateTime<Utc>>, DietError> {
        let pet_id = check_pet_id(pet_id)?;
        Ok(self.store.load_start_instant(pet_id).await?)
    }

    /// Where the pet's diet stands at `now`
    pub async fn status(&self, pet_id: &str, now: DateTime<Utc>) -> Result<DietStatus, DietError> {
        let started_at = self.load_start_instant(pet_id).await?;
        let status = DietStatus::evaluate(&self.schedule, started_at, now);
        debug!(pet_id, %status, "Evaluated diet status");
        Ok(status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStartInstantStore, SqliteStartInstantStore};
    use crate::test_utils::{make_phases, setup_test_db, teardown_test_db, utc};
    use chrono::Duration;

    fn memory_tracker() -> DietTracker<MemoryStartInstantStore> {
        let schedule = PhaseSchedule::new(make_phases(&[14, 14, 56, 7])).unwrap();
        DietTracker::new(MemoryStartInstantStore::new(), schedule)
    }

    #[tokio::test]
    async fn test_not_started_is_distinct_from_day_zero() {
        let tracker = memory_tracker();
        let now = utc(2024, 1, 1);

        let before = tracker.status("rex", now).await.unwrap();
        assert_eq!(before, DietStatus::NotStarted);

        tracker.start_diet("rex", now).await.unwrap();
        let after = tracker.status("rex", now).await.unwrap();
        assert!(matches!(after, DietStatus::InProgress { .. }));
        assert_eq!(after.progress().unwrap().total_days_elapsed, 0);
    }

    #[tokio::test]
    async fn test_start_then_reset_overwrites() {
        let tracker = memory_tracker();
        let t0 = utc(2024, 1, 1);
        let t1 = utc(2024, 2, 1);

        let started = tracker.start_diet("rex", t0).await.unwrap();
        assert_eq!(started.action, DietAction::Start);
        assert_eq!(tracker.load_start_instant("rex").await.unwrap(), Some(t0));

        let reset = tracker.reset_diet("rex", t1).await.unwrap();
        assert_eq!(reset.action, DietAction::Reset);
        assert_eq!(tracker.load_start_instant("rex").await.unwrap(), Some(t1));
        assert_ne!(started.message, reset.message);
    }

    #[tokio::test]
    async fn test_reset_after_completion_reenters_phase_zero() {
        let tracker = memory_tracker();
        let t0 = utc(2024, 1, 1);
        let later = t0 + Duration::days(120);

        tracker.start_diet("rex", t0).await.unwrap();
        assert!(tracker.status("rex", later).await.unwrap().is_complete());

        tracker.reset_diet("rex", later).await.unwrap();
        let status = tracker.status("rex", later).await.unwrap();
        let progress = status.progress().unwrap();
        assert!(!progress.is_complete);
        assert_eq!(progress.current_phase_index, 0);
        assert_eq!(progress.days_elapsed_in_current_phase, 0);
    }

    #[tokio::test]
    async fn test_time_passing_moves_through_phases() {
        let tracker = memory_tracker();
        let t0 = utc(2024, 1, 1);
        tracker.start_diet("rex", t0).await.unwrap();

        let day_19 = tracker.status("rex", utc(2024, 1, 20)).await.unwrap();
        let progress = day_19.progress().unwrap();
        assert_eq!(progress.current_phase_index, 1);
        assert_eq!(progress.days_elapsed_in_current_phase, 5);
    }

    #[tokio::test]
    async fn test_empty_pet_id_rejected() {
        let tracker = memory_tracker();

        let result = tracker.start_diet("  ", utc(2024, 1, 1)).await;
        assert!(matches!(result, Err(DietError::MissingPetId)));

        let result = tracker.status("", utc(2024, 1, 1)).await;
        assert!(matches!(result, Err(DietError::MissingPetId)));
    }

    #[tokio::test]
    async fn test_pet_id_is_trimmed() {
        let tracker = memory_tracker();
        tracker.start_diet(" rex ", utc(2024, 1, 1)).await.unwrap();

        assert_eq!(tracker.load_start_instant("rex").await.unwrap(), Some(utc(2024, 1, 1)));
    }

    #[tokio::test]
    async fn test_sqlite_backed_round_trip() {
        let pool = setup_test_db().await;
        let schedule = PhaseSchedule::new(make_phases(&[14, 14])).unwrap();
        let tracker = DietTracker::new(SqliteStartInstantStore::new(pool.clone()), schedule);

        tracker.start_diet("rex", utc(2024, 1, 1)).await.unwrap();
        tracker.reset_diet("rex", utc(2024, 1, 10)).await.unwrap();

        assert_eq!(
            tracker.load_start_instant("rex").await.unwrap(),
            Some(utc(2024, 1, 10))
        );

        teardown_test_db(pool).await;
    }

    #[test]
    fn test_error_serializes_as_message() {
        let json = serde_json::to_string(&DietError::MissingPetId).unwrap();
        assert_eq!(json, "\"Pet id must not be empty\"");
    }
}
