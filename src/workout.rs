//! Workout and exercise type data model.

use chrono::{DateTime, Utc};
use phf::phf_map;
use serde::{Deserialize, Serialize};

/// One row of the `workouts` table as returned by the REST endpoint.
///
/// All kind-specific columns are nullable on the wire. [`Workout::from_row`]
/// narrows a row into the typed representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WorkoutRow {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub exercise: Option<String>,
    pub muscle_group: Option<String>,
    pub sets: Option<u32>,
    pub reps: Option<u32>,
    pub weight: Option<f32>,
    pub distance: Option<f32>,
    pub pace: Option<String>,
    pub duration: Option<u32>,
    pub calories: Option<u32>,
    pub date: Option<DateTime<Utc>>,
}

/// Discriminates which optional columns of a row are meaningful.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WorkoutKind {
    Gym,
    Run,
}

impl WorkoutKind {
    pub fn label(self) -> &'static str {
        match self {
            WorkoutKind::Gym => "Gym",
            WorkoutKind::Run => "Run",
        }
    }
}

/// Kind-specific fields of a workout. Gym fields never appear on run records
/// and vice versa.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WorkoutDetails {
    Gym {
        exercise: String,
        muscle_group: Option<String>,
        sets: Option<u32>,
        reps: Option<u32>,
        weight_kg: Option<f32>,
    },
    Run {
        distance_km: Option<f32>,
        pace: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workout {
    pub id: String,
    pub owner: String,
    pub details: WorkoutDetails,
    pub duration_min: u32,
    pub calories: Option<u32>,
    pub occurred_at: DateTime<Utc>,
}

impl Workout {
    /// Narrow a wire row into the typed model.
    ///
    /// Rows missing the fields required for their kind yield `None` and are
    /// skipped by callers instead of failing the whole fetch.
    pub fn from_row(row: WorkoutRow) -> Option<Self> {
        let occurred_at = row.date?;
        let duration_min = row.duration?;
        let details = match row.kind.as_str() {
            "gym" => WorkoutDetails::Gym {
                exercise: row.exercise?,
                muscle_group: row.muscle_group,
                sets: row.sets,
                reps: row.reps,
                weight_kg: row.weight,
            },
            "run" => WorkoutDetails::Run {
                distance_km: row.distance,
                pace: row.pace,
            },
            _ => return None,
        };
        Some(Self {
            id: row.id,
            owner: row.user_id,
            details,
            duration_min,
            calories: row.calories,
            occurred_at,
        })
    }

    pub fn kind(&self) -> WorkoutKind {
        match self.details {
            WorkoutDetails::Gym { .. } => WorkoutKind::Gym,
            WorkoutDetails::Run { .. } => WorkoutKind::Run,
        }
    }

    /// Display title: the exercise name for gym records, a fixed label for
    /// runs.
    pub fn title(&self) -> &str {
        match &self.details {
            WorkoutDetails::Gym { exercise, .. } => exercise,
            WorkoutDetails::Run { .. } => "Run",
        }
    }
}

/// Payload for creating or replacing a workout record. The id is assigned by
/// the storage service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewWorkout {
    pub user_id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exercise: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub muscle_group: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sets: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reps: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pace: Option<String>,
    pub duration: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    pub date: DateTime<Utc>,
}

/// Per-owner exercise catalog entry powering autocomplete and muscle group
/// defaulting. Names are unique per owner, case-insensitively; the first
/// writer fixes the canonical casing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExerciseType {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub muscle_group: Option<String>,
}

/// What to do with the exercise catalog when a gym workout is submitted.
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseTypeAction {
    Create {
        name: String,
        muscle_group: Option<String>,
    },
    UpdateGroup {
        id: String,
        muscle_group: String,
    },
    Keep {
        id: String,
    },
}

/// Resolve the submitted exercise name against the stored catalog.
///
/// No case-insensitive match creates a new entry. A match whose stored group
/// differs from the submitted one is patched in place, last write wins.
/// Submitting no group never clears a stored one.
pub fn resolve_exercise_type(
    types: &[ExerciseType],
    name: &str,
    muscle_group: Option<&str>,
) -> ExerciseTypeAction {
    match types.iter().find(|t| t.name.eq_ignore_ascii_case(name)) {
        None => ExerciseTypeAction::Create {
            name: name.to_string(),
            muscle_group: muscle_group.map(str::to_string),
        },
        Some(existing) => match muscle_group {
            Some(group) if existing.muscle_group.as_deref() != Some(group) => {
                ExerciseTypeAction::UpdateGroup {
                    id: existing.id.clone(),
                    muscle_group: group.to_string(),
                }
            }
            _ => ExerciseTypeAction::Keep {
                id: existing.id.clone(),
            },
        },
    }
}

/// Muscle group enumeration used by the form selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MuscleGroup {
    Bicep,
    Tricep,
    Back,
    Abs,
    Legs,
    Calves,
}

pub const ALL_MUSCLE_GROUPS: [MuscleGroup; 6] = [
    MuscleGroup::Bicep,
    MuscleGroup::Tricep,
    MuscleGroup::Back,
    MuscleGroup::Abs,
    MuscleGroup::Legs,
    MuscleGroup::Calves,
];

impl MuscleGroup {
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "bicep" => Some(MuscleGroup::Bicep),
            "tricep" => Some(MuscleGroup::Tricep),
            "back" => Some(MuscleGroup::Back),
            "abs" => Some(MuscleGroup::Abs),
            "legs" => Some(MuscleGroup::Legs),
            "calves" => Some(MuscleGroup::Calves),
            _ => None,
        }
    }

    /// Wire value stored in the `muscle_group` column.
    pub fn as_str(self) -> &'static str {
        match self {
            MuscleGroup::Bicep => "bicep",
            MuscleGroup::Tricep => "tricep",
            MuscleGroup::Back => "back",
            MuscleGroup::Abs => "abs",
            MuscleGroup::Legs => "legs",
            MuscleGroup::Calves => "calves",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            MuscleGroup::Bicep => "Biceps",
            MuscleGroup::Tricep => "Triceps",
            MuscleGroup::Back => "Back",
            MuscleGroup::Abs => "Abs",
            MuscleGroup::Legs => "Legs",
            MuscleGroup::Calves => "Calves",
        }
    }
}

/// Display label for a raw muscle group value. Unknown values fall back to
/// the raw string instead of failing.
pub fn group_label(raw: &str) -> String {
    match MuscleGroup::parse(raw) {
        Some(group) => group.label().to_string(),
        None => raw.to_string(),
    }
}

/// Built-in fallback from common exercise names to a default muscle group,
/// used when the remote exercise catalog has no match for the typed name.
static DEFAULT_GROUPS: phf::Map<&'static str, &'static str> = phf_map! {
    "barbell curl" => "bicep",
    "hammer curl" => "bicep",
    "preacher curl" => "bicep",
    "tricep pushdown" => "tricep",
    "skullcrusher" => "tricep",
    "overhead extension" => "tricep",
    "deadlift" => "back",
    "barbell row" => "back",
    "lat pulldown" => "back",
    "pull up" => "back",
    "crunch" => "abs",
    "plank" => "abs",
    "leg raise" => "abs",
    "squat" => "legs",
    "leg press" => "legs",
    "lunge" => "legs",
    "leg extension" => "legs",
    "calf raise" => "calves",
    "seated calf raise" => "calves",
};

pub fn default_group_for(exercise: &str) -> Option<MuscleGroup> {
    DEFAULT_GROUPS
        .get(exercise.trim().to_lowercase().as_str())
        .and_then(|g| MuscleGroup::parse(g))
}
