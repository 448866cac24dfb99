use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::info;

use crate::config::AppConfig;
use crate::diet::DietTracker;
use crate::schedule::PhaseSchedule;
use crate::store::{SqliteStartInstantStore, StoreError};

pub type DbPool = SqlitePool;

/// Application state shared by the commands
pub struct AppState {
  pub db: DbPool,
  pub tracker: DietTracker<SqliteStartInstantStore>,
}

impl AppState {
  pub fn new(db: DbPool, schedule: PhaseSchedule) -> Self {
    let tracker = DietTracker::new(SqliteStartInstantStore::new(db.clone()), schedule);
    Self { db, tracker }
  }
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db(config: &AppConfig) -> Result<DbPool, StoreError> {
  info!(database_url = %config.database_url, "Initializing database");

  let pool = SqlitePoolOptions::new()
    .max_connections(config.max_connections)
    .connect(&config.database_url)
    .await?;

  sqlx::migrate!("./migrations").run(&pool).await?;

  info!("Database initialized successfully");

  Ok(pool)
}
