use std::env;
use std::path::PathBuf;

use thiserror::Error;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const DEFAULT_DATABASE_URL: &str = "sqlite://diet-tracker.db?mode=rwc";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
pub const DEFAULT_LOG_FILTER: &str = "diet_tracker=info,diet_tracker_lib=info";

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("Invalid configuration for {key}: {reason}")]
  Invalid { key: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
  pub database_url: String,
  pub max_connections: u32,
  /// JSON phase table replacing the standard one
  pub phases_file: Option<PathBuf>,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      database_url: DEFAULT_DATABASE_URL.to_string(),
      max_connections: DEFAULT_MAX_CONNECTIONS,
      phases_file: None,
    }
  }
}

impl AppConfig {
  /// Read `DIET_DATABASE_URL`, `DIET_MAX_CONNECTIONS` and `DIET_PHASES_FILE`.
  /// Call `dotenvy::dotenv()` first if a `.env` file should be honoured.
  pub fn from_env() -> Result<Self, ConfigError> {
    let defaults = Self::default();

    let database_url = non_empty_var("DIET_DATABASE_URL").unwrap_or(defaults.database_url);

    let max_connections = match non_empty_var("DIET_MAX_CONNECTIONS") {
      Some(raw) => parse_max_connections(&raw)?,
      None => defaults.max_connections,
    };

    let phases_file = non_empty_var("DIET_PHASES_FILE").map(PathBuf::from);

    Ok(Self {
      database_url,
      max_connections,
      phases_file,
    })
  }
}

fn non_empty_var(key: &str) -> Option<String> {
  env::var(key)
    .ok()
    .map(|v| v.trim().to_string())
    .filter(|v| !v.is_empty())
}

fn parse_max_connections(raw: &str) -> Result<u32, ConfigError> {
  let value: u32 = raw.parse().map_err(|e| ConfigError::Invalid {
    key: "DIET_MAX_CONNECTIONS",
    reason: format!("{} ({})", e, raw),
  })?;
  if value == 0 {
    return Err(ConfigError::Invalid {
      key: "DIET_MAX_CONNECTIONS",
      reason: "must be at least 1".to_string(),
    });
  }
  Ok(value)
}
