use serde::{Deserialize, Serialize};

/// One step of an elimination diet. Content only: the scheduler reads
/// `duration`, everything else is shown on the phase cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Phase {
  /// 1-based position in the schedule
  pub id: u32,
  pub name: String,
  #[serde(default)]
  pub description: String,
  /// Length of the phase in whole days, must be > 0. Unsigned, so negative
  /// lengths are ruled out by the type; phase table files are read through a
  /// signed entry first and reject them as schedule errors.
  pub duration: u32,
  #[serde(default)]
  pub tips: Vec<String>,
  #[serde(default)]
  pub recommended_foods: Vec<String>,
}

impl Phase {
  pub fn new(id: u32, name: impl Into<String>, duration: u32) -> Self {
    Self {
      id,
      name: name.into(),
      description: String::new(),
      duration,
      tips: Vec::new(),
      recommended_foods: Vec::new(),
    }
  }
}
