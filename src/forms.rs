//! Add/edit workout dialog state and validation.

use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::workout::{ExerciseType, MuscleGroup, NewWorkout, Workout, WorkoutDetails};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormTab {
    Gym,
    Run,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DialogPhase {
    Editing,
    Submitting,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GymForm {
    pub exercise: String,
    pub muscle_group: Option<MuscleGroup>,
    pub sets: String,
    pub reps: String,
    pub weight: String,
    pub duration: String,
    pub calories: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunForm {
    pub distance: String,
    pub duration: String,
    pub pace: String,
    pub calories: String,
}

/// A field that failed validation. Submission is blocked until the user fixes
/// the input; nothing is sent over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    Required(&'static str),
    Invalid(&'static str),
}

impl std::fmt::Display for FormError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FormError::Required(field) => write!(f, "{field} is required"),
            FormError::Invalid(field) => write!(f, "{field} is not a valid positive number"),
        }
    }
}

impl std::error::Error for FormError {}

/// Strip a display suffix such as `" min"` or `" km"` from a formatted value,
/// returning the bare number for re-editing.
pub fn strip_unit(value: &str, suffix: &str) -> String {
    value
        .strip_suffix(suffix)
        .unwrap_or(value)
        .trim()
        .to_string()
}

fn require(value: &str, field: &'static str) -> Result<String, FormError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(FormError::Required(field))
    } else {
        Ok(trimmed.to_string())
    }
}

fn parse_positive(value: &str, field: &'static str) -> Result<u32, FormError> {
    let parsed: u32 = value
        .trim()
        .parse()
        .map_err(|_| FormError::Invalid(field))?;
    if parsed == 0 {
        return Err(FormError::Invalid(field));
    }
    Ok(parsed)
}

fn parse_decimal(value: &str, field: &'static str) -> Result<f32, FormError> {
    let parsed: f32 = value
        .trim()
        .parse()
        .map_err(|_| FormError::Invalid(field))?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(FormError::Invalid(field));
    }
    Ok(parsed)
}

/// Optional numeric field: empty input means absent, anything else must parse.
fn parse_optional(value: &str, field: &'static str) -> Result<Option<u32>, FormError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_positive(value, field).map(Some)
}

fn occurred_at(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN))
}

/// State of the add/edit workout window.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkoutDialog {
    pub tab: FormTab,
    pub gym: GymForm,
    pub run: RunForm,
    pub date: NaiveDate,
    /// Record id when editing an existing workout; `None` when adding.
    pub editing: Option<String>,
    pub phase: DialogPhase,
    pub error: Option<String>,
}

impl WorkoutDialog {
    pub fn add(tab: FormTab) -> Self {
        Self {
            tab,
            gym: GymForm::default(),
            run: RunForm::default(),
            date: Utc::now().date_naive(),
            editing: None,
            phase: DialogPhase::Editing,
            error: None,
        }
    }

    /// Open the dialog prefilled from an existing record. Display formatting
    /// is undone so the fields hold bare editable values.
    pub fn edit(workout: &Workout) -> Self {
        let mut dialog = Self::add(FormTab::Gym);
        dialog.editing = Some(workout.id.clone());
        dialog.date = workout.occurred_at.date_naive();
        let duration = strip_unit(&format!("{} min", workout.duration_min), " min");
        let calories = match workout.calories {
            Some(kcal) => strip_unit(&format!("{kcal} kcal"), " kcal"),
            None => String::new(),
        };
        match &workout.details {
            WorkoutDetails::Gym {
                exercise,
                muscle_group,
                sets,
                reps,
                weight_kg,
            } => {
                dialog.tab = FormTab::Gym;
                dialog.gym = GymForm {
                    exercise: exercise.clone(),
                    muscle_group: muscle_group.as_deref().and_then(MuscleGroup::parse),
                    sets: sets.map(|v| v.to_string()).unwrap_or_default(),
                    reps: reps.map(|v| v.to_string()).unwrap_or_default(),
                    weight: weight_kg.map(|v| v.to_string()).unwrap_or_default(),
                    duration,
                    calories,
                };
            }
            WorkoutDetails::Run { distance_km, pace } => {
                dialog.tab = FormTab::Run;
                dialog.run = RunForm {
                    distance: match distance_km {
                        Some(d) => strip_unit(&format!("{d:.1} km"), " km"),
                        None => String::new(),
                    },
                    duration,
                    pace: pace.clone().unwrap_or_default(),
                    calories,
                };
            }
        }
        dialog
    }

    pub fn is_submitting(&self) -> bool {
        self.phase == DialogPhase::Submitting
    }

    /// Validate the active tab and build the request payload.
    ///
    /// Every field of the active tab except calories must be filled in;
    /// numeric fields must parse. The first offending field is reported and
    /// nothing is sent.
    pub fn payload(&self, owner: &str) -> Result<NewWorkout, FormError> {
        match self.tab {
            FormTab::Gym => {
                let exercise = require(&self.gym.exercise, "Exercise")?;
                let sets = parse_positive(&require(&self.gym.sets, "Sets")?, "Sets")?;
                let reps = parse_positive(&require(&self.gym.reps, "Reps")?, "Reps")?;
                let weight = parse_decimal(&require(&self.gym.weight, "Weight")?, "Weight")?;
                Ok(NewWorkout {
                    user_id: owner.to_string(),
                    kind: "gym".into(),
                    exercise: Some(exercise),
                    muscle_group: self.gym.muscle_group.map(|g| g.as_str().to_string()),
                    sets: Some(sets),
                    reps: Some(reps),
                    weight: Some(weight),
                    distance: None,
                    pace: None,
                    duration: parse_positive(
                        &require(&self.gym.duration, "Duration")?,
                        "Duration",
                    )?,
                    calories: parse_optional(&self.gym.calories, "Calories")?,
                    date: occurred_at(self.date),
                })
            }
            FormTab::Run => {
                let distance = parse_decimal(&require(&self.run.distance, "Distance")?, "Distance")?;
                let pace = require(&self.run.pace, "Pace")?;
                Ok(NewWorkout {
                    user_id: owner.to_string(),
                    kind: "run".into(),
                    exercise: None,
                    muscle_group: None,
                    sets: None,
                    reps: None,
                    weight: None,
                    distance: Some(distance),
                    pace: Some(pace),
                    duration: parse_positive(
                        &require(&self.run.duration, "Duration")?,
                        "Duration",
                    )?,
                    calories: parse_optional(&self.run.calories, "Calories")?,
                    date: occurred_at(self.date),
                })
            }
        }
    }
}

/// Rank catalog names against the typed query for the autocomplete dropdown.
///
/// Prefix matches come first, then close fuzzy matches by Jaro-Winkler
/// similarity.
pub fn suggest_exercises<'a>(
    types: &'a [ExerciseType],
    query: &str,
    limit: usize,
) -> Vec<&'a str> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return Vec::new();
    }
    let mut scored: Vec<(f64, &str)> = types
        .iter()
        .filter_map(|t| {
            let name = t.name.to_lowercase();
            if name == query {
                return None;
            }
            let score = if name.starts_with(&query) {
                1.0
            } else {
                strsim::jaro_winkler(&name, &query)
            };
            (score > 0.7).then_some((score, t.name.as_str()))
        })
        .collect();
    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
    scored.into_iter().take(limit).map(|(_, name)| name).collect()
}
