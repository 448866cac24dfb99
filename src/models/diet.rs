use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored diet start for one pet, as read back from `diet_starts`
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DietStartRow {
  pub pet_id: String,
  /// ISO-8601 instant, decoded by the store
  pub started_at: String,
  pub updated_at: Option<String>,
}

/// Why the start instant is being written. Persistence is identical for
/// both; only the log line and the confirmation message differ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DietAction {
  Start,
  Reset,
}

impl DietAction {
  pub fn confirmation(&self) -> &'static str {
    match self {
      Self::Start => "Elimination diet started! Day 1 begins today.",
      Self::Reset => "Diet progress reset. Starting again from the first phase.",
    }
  }
}

impl std::fmt::Display for DietAction {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Start => write!(f, "start"),
      Self::Reset => write!(f, "reset"),
    }
  }
}

/// Result of a start/reset, handed back to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DietActionOutcome {
  pub pet_id: String,
  pub action: DietAction,
  pub started_at: DateTime<Utc>,
  pub message: String,
}
