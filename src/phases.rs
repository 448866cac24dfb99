//! Phase tables
//!
//! The standard four-phase elimination diet, plus loading of alternative
//! tables from a JSON file (an array of phases in display order).

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Phase;
use crate::schedule::{InvalidScheduleError, PhaseSchedule};

#[derive(Debug, Error)]
pub enum PhaseTableError {
    #[error("Failed to read phase table {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse phase table {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid phase table: {0}")]
    Invalid(#[from] InvalidScheduleError),
}

/// A phase as written in a table file. The duration is read signed so that
/// zero or negative values are reported as schedule errors rather than as
/// JSON type errors.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PhaseEntry {
    id: u32,
    name: String,
    #[serde(default)]
    description: String,
    duration: i64,
    #[serde(default)]
    tips: Vec<String>,
    #[serde(default)]
    recommended_foods: Vec<String>,
}

impl TryFrom<PhaseEntry> for Phase {
    type Error = InvalidScheduleError;

    fn try_from(entry: PhaseEntry) -> Result<Self, Self::Error> {
        let duration = match entry.duration {
            0 => {
                return Err(InvalidScheduleError::ZeroDuration {
                    phase_id: entry.id,
                    name: entry.name,
                })
            }
            d => u32::try_from(d).map_err(|_| InvalidScheduleError::DurationOutOfRange {
                phase_id: entry.id,
                name: entry.name.clone(),
                duration: d,
            })?,
        };

        Ok(Phase {
            id: entry.id,
            name: entry.name,
            description: entry.description,
            duration,
            tips: entry.tips,
            recommended_foods: entry.recommended_foods,
        })
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Elimination 14d, Reintroduction 14d, Confirmation 56d, Maintenance 7d
pub fn standard_phases() -> Vec<Phase> {
    vec![
        Phase {
            id: 1,
            name: "Elimination".to_string(),
            description: "Feed only a novel or hydrolyzed protein diet so that symptoms \
                          caused by the current food can settle."
                .to_string(),
            duration: 14,
            tips: strings(&[
                "Remove all treats, chews and table scraps",
                "Check flavored medications and toothpaste for hidden proteins",
                "Log symptoms daily, even on good days",
            ]),
            recommended_foods: strings(&[
                "Hydrolyzed protein prescription diet",
                "Single novel protein (rabbit, venison or kangaroo)",
                "Single carbohydrate source (potato or sweet potato)",
            ]),
        },
        Phase {
            id: 2,
            name: "Reintroduction".to_string(),
            description: "Add back one former ingredient at a time and watch for a \
                          returning reaction."
                .to_string(),
            duration: 14,
            tips: strings(&[
                "Introduce only one ingredient per week",
                "Stop the ingredient at the first sign of itching or digestive upset",
                "Record the exact food and amount in the food diary",
            ]),
            recommended_foods: strings(&[
                "Plain cooked chicken",
                "Plain cooked beef",
                "Plain scrambled egg",
            ]),
        },
        Phase {
            id: 3,
            name: "Confirmation".to_string(),
            description: "Confirm suspected triggers by repeating the challenge after \
                          symptoms clear again."
                .to_string(),
            duration: 56,
            tips: strings(&[
                "Return to the elimination diet until symptoms resolve",
                "Re-challenge with each suspected trigger separately",
                "Share the symptom log with your veterinarian",
            ]),
            recommended_foods: strings(&["Elimination diet base", "One suspected trigger at a time"]),
        },
        Phase {
            id: 4,
            name: "Maintenance".to_string(),
            description: "Settle on a long-term diet that avoids every confirmed trigger."
                .to_string(),
            duration: 7,
            tips: strings(&[
                "Read ingredient labels on every new food and treat",
                "Keep logging symptoms for early warning of new sensitivities",
            ]),
            recommended_foods: strings(&[
                "Limited-ingredient diet free of confirmed triggers",
                "Treats made from the tolerated protein",
            ]),
        },
    ]
}

pub fn standard_schedule() -> Result<PhaseSchedule, InvalidScheduleError> {
    PhaseSchedule::new(standard_phases())
}

/// Parse a phase table from JSON, validating it as a schedule
pub fn parse_schedule(json: &str, path: &Path) -> Result<PhaseSchedule, PhaseTableError> {
    let entries: Vec<PhaseEntry> = serde_json::from_str(json).map_err(|e| PhaseTableError::Parse {
        path: path.to_path_buf(),
        source: e,
    })?;
    let phases = entries
        .into_iter()
        .map(Phase::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(PhaseSchedule::new(phases)?)
}

/// Load the phase table from `path`, or the standard table when no path is set
pub fn load_schedule(path: Option<&Path>) -> Result<PhaseSchedule, PhaseTableError> {
    let Some(path) = path else {
        debug!("Using standard phase table");
        return Ok(standard_schedule()?);
    };

    let json = fs::read_to_string(path).map_err(|e| PhaseTableError::Read {
        path: path.to_path_buf(),
        source: e,
    })?;
    let schedule = parse_schedule(&json, path)?;

    info!(
        path = %path.display(),
        phases = schedule.phase_count(),
        total_days = schedule.total_days(),
        "Loaded phase table"
    );
    Ok(schedule)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_standard_table_shape() {
        let schedule = standard_schedule().expect("standard table is valid");

        let names: Vec<&str> = schedule.phases().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Elimination", "Reintroduction", "Confirmation", "Maintenance"]);
        assert_eq!(schedule.total_days(), 91);

        // Ids are 1-based positions
        for (index, phase) in schedule.phases().iter().enumerate() {
            assert_eq!(phase.id as usize, index + 1);
            assert!(!phase.tips.is_empty());
            assert!(!phase.recommended_foods.is_empty());
        }
    }

    #[test]
    fn test_load_without_path_uses_standard() {
        let schedule = load_schedule(None).unwrap();
        assert_eq!(schedule.phase_count(), 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[
                {{"id": 1, "name": "Strict", "duration": 21}},
                {{"id": 2, "name": "Challenge", "duration": 7, "tips": ["one food only"]}}
            ]"#
        )
        .unwrap();

        let schedule = load_schedule(Some(file.path())).unwrap();

        assert_eq!(schedule.phase_count(), 2);
        assert_eq!(schedule.total_days(), 28);
        assert_eq!(schedule.phases()[1].tips, vec!["one food only"]);
    }

    #[test]
    fn test_load_rejects_empty_table() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "[]").unwrap();

        let result = load_schedule(Some(file.path()));

        assert!(matches!(
            result,
            Err(PhaseTableError::Invalid(InvalidScheduleError::EmptySchedule))
        ));
    }

    #[test]
    fn test_non_positive_durations_are_schedule_errors() {
        let path = Path::new("phases.json");

        let negative = parse_schedule(r#"[{"id": 1, "name": "Strict", "duration": -3}]"#, path);
        assert!(matches!(
            negative,
            Err(PhaseTableError::Invalid(InvalidScheduleError::DurationOutOfRange {
                phase_id: 1,
                duration: -3,
                ..
            }))
        ));

        let zero = parse_schedule(r#"[{"id": 1, "name": "Strict", "duration": 0}]"#, path);
        assert!(matches!(
            zero,
            Err(PhaseTableError::Invalid(InvalidScheduleError::ZeroDuration { phase_id: 1, .. }))
        ));

        let too_long = parse_schedule(r#"[{"id": 2, "name": "Forever", "duration": 5000000000}]"#, path);
        assert!(matches!(
            too_long,
            Err(PhaseTableError::Invalid(InvalidScheduleError::DurationOutOfRange { .. }))
        ));
    }

    #[test]
    fn test_load_reports_bad_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();

        let result = load_schedule(Some(file.path()));
        assert!(matches!(result, Err(PhaseTableError::Parse { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let result = load_schedule(Some(Path::new("/nonexistent/phases.json")));
        let err = result.unwrap_err();
        assert!(matches!(err, PhaseTableError::Read { .. }));
        assert!(err.to_string().contains("/nonexistent/phases.json"));
    }
}
