//! Test utilities shared across module tests
//!
//! - In-memory database setup/teardown
//! - Phase table factories
//! - Instant helpers

use chrono::{DateTime, TimeZone, Utc};
use sqlx::SqlitePool;

use crate::db::AppState;
use crate::models::Phase;
use crate::phases::standard_schedule;

/// ---------------------------------------------------------------------------
/// Database Test Utilities
/// ---------------------------------------------------------------------------

/// Create an in-memory SQLite database for testing
/// Runs all migrations and returns a ready-to-use pool
///
/// Uses max_connections(1) to prevent multiple pool connections from creating
/// isolated in-memory databases, which would cause intermittent test failures
pub async fn setup_test_db() -> SqlitePool {
  let pool = sqlx::sqlite::SqlitePoolOptions::new()
    .max_connections(1)
    .connect("sqlite::memory:")
    .await
    .expect("Failed to create in-memory database");

  sqlx::migrate!("./migrations")
    .run(&pool)
    .await
    .expect("Failed to run migrations");

  pool
}

/// Close a test database pool
pub async fn teardown_test_db(pool: SqlitePool) {
  pool.close().await;
}

/// App state over an in-memory database and the standard phase table
pub async fn setup_test_state() -> AppState {
  let pool = setup_test_db().await;
  AppState::new(pool, standard_schedule().expect("standard table is valid"))
}

/// ---------------------------------------------------------------------------
/// Fixtures
/// ---------------------------------------------------------------------------

/// Midnight UTC on the given date
pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
    .single()
    .expect("valid date")
}

/// Phases with the given durations, ids 1..=n
pub fn make_phases(durations: &[u32]) -> Vec<Phase> {
  durations
    .iter()
    .enumerate()
    .map(|(i, &duration)| Phase::new(i as u32 + 1, format!("Phase {}", i + 1), duration))
    .collect()
}
