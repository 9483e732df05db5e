use crate::aggregate;
use crate::workout::{NewWorkout, Workout, WorkoutDetails};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::Path;

/// Flat record shape shared by the JSON/CSV exports and the CSV importer.
/// Dates travel as RFC 3339 strings so the CSV stays round-trippable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct FlatRecord {
    pub id: String,
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
    pub date: String,
}

impl FlatRecord {
    pub fn from_workout(w: &Workout) -> Self {
        let mut record = FlatRecord {
            id: w.id.clone(),
            duration: Some(w.duration_min),
            calories: w.calories,
            date: w.occurred_at.to_rfc3339(),
            ..FlatRecord::default()
        };
        match &w.details {
            WorkoutDetails::Gym {
                exercise,
                muscle_group,
                sets,
                reps,
                weight_kg,
            } => {
                record.kind = "gym".into();
                record.exercise = Some(exercise.clone());
                record.muscle_group = muscle_group.clone();
                record.sets = *sets;
                record.reps = *reps;
                record.weight = *weight_kg;
            }
            WorkoutDetails::Run { distance_km, pace } => {
                record.kind = "run".into();
                record.distance = *distance_km;
                record.pace = pace.clone();
            }
        }
        record
    }
}

pub fn flatten(records: &[Workout]) -> Vec<FlatRecord> {
    records.iter().map(FlatRecord::from_workout).collect()
}

fn save_json<T: Serialize + ?Sized>(path: impl AsRef<Path>, value: &T) -> std::io::Result<()> {
    let file = std::fs::File::create(path)?;
    serde_json::to_writer_pretty(file, value).map_err(std::io::Error::other)
}

fn save_csv<T: Serialize>(path: impl AsRef<Path>, records: &[T]) -> csv::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for record in records {
        wtr.serialize(record)?;
    }
    wtr.flush().map_err(Into::into)
}

pub fn save_workouts_json<P: AsRef<Path>>(path: P, records: &[Workout]) -> std::io::Result<()> {
    save_json(path, &flatten(records))
}

pub fn save_workouts_csv<P: AsRef<Path>>(path: P, records: &[Workout]) -> csv::Result<()> {
    save_csv(path, &flatten(records))
}

/// Aggregate totals in export form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryExport {
    pub total_workouts: usize,
    pub total_distance_km: f32,
    pub total_calories: u32,
    pub muscle_groups: Vec<(String, usize)>,
}

impl SummaryExport {
    pub fn from_records(records: &[Workout]) -> Self {
        Self {
            total_workouts: aggregate::total_count(records),
            total_distance_km: aggregate::total_distance_km(records),
            total_calories: aggregate::total_calories(records),
            muscle_groups: aggregate::muscle_group_breakdown(records),
        }
    }
}

pub fn save_summary_json<P: AsRef<Path>>(path: P, records: &[Workout]) -> std::io::Result<()> {
    save_json(path, &SummaryExport::from_records(records))
}

/// Parse a workout CSV into create payloads for `owner`.
///
/// Rows that fail to deserialize, carry an unusable date/duration, or name an
/// unknown kind are skipped with a warning rather than aborting the import.
pub fn import_workouts_csv<R: Read>(reader: R, owner: &str) -> Result<Vec<NewWorkout>, csv::Error> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut payloads = Vec::new();
    for (line, result) in rdr.deserialize::<FlatRecord>().enumerate() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!("skipping unreadable csv row {}: {e}", line + 1);
                continue;
            }
        };
        let Ok(date) = DateTime::parse_from_rfc3339(&record.date) else {
            log::warn!("skipping csv row {} with bad date {:?}", line + 1, record.date);
            continue;
        };
        let Some(duration) = record.duration else {
            log::warn!("skipping csv row {} without a duration", line + 1);
            continue;
        };
        let payload = match record.kind.as_str() {
            "gym" => {
                let Some(exercise) = record.exercise else {
                    log::warn!("skipping gym csv row {} without an exercise", line + 1);
                    continue;
                };
                NewWorkout {
                    user_id: owner.to_string(),
                    kind: "gym".into(),
                    exercise: Some(exercise),
                    muscle_group: record.muscle_group,
                    sets: record.sets,
                    reps: record.reps,
                    weight: record.weight,
                    distance: None,
                    pace: None,
                    duration,
                    calories: record.calories,
                    date: date.with_timezone(&Utc),
                }
            }
            "run" => NewWorkout {
                user_id: owner.to_string(),
                kind: "run".into(),
                exercise: None,
                muscle_group: None,
                sets: None,
                reps: None,
                weight: None,
                distance: record.distance,
                pace: record.pace,
                duration,
                calories: record.calories,
                date: date.with_timezone(&Utc),
            },
            other => {
                log::warn!("skipping csv row {} with unknown kind {other:?}", line + 1);
                continue;
            }
        };
        payloads.push(payload);
    }
    Ok(payloads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_records() -> Vec<Workout> {
        vec![
            Workout {
                id: "w1".into(),
                owner: "u1".into(),
                details: WorkoutDetails::Gym {
                    exercise: "Squat".into(),
                    muscle_group: Some("legs".into()),
                    sets: Some(3),
                    reps: Some(10),
                    weight_kg: Some(100.0),
                },
                duration_min: 45,
                calories: Some(320),
                occurred_at: Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap(),
            },
            Workout {
                id: "w2".into(),
                owner: "u1".into(),
                details: WorkoutDetails::Run {
                    distance_km: Some(5.2),
                    pace: Some("5:30".into()),
                },
                duration_min: 30,
                calories: Some(280),
                occurred_at: Utc.with_ymd_and_hms(2024, 5, 5, 0, 0, 0).unwrap(),
            },
        ]
    }

    #[test]
    fn csv_export_round_trips_through_import() {
        let records = sample_records();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.csv");
        save_workouts_csv(&path, &records).unwrap();

        let file = std::fs::File::open(&path).unwrap();
        let payloads = import_workouts_csv(file, "u2").unwrap();
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].user_id, "u2");
        assert_eq!(payloads[0].kind, "gym");
        assert_eq!(payloads[0].exercise.as_deref(), Some("Squat"));
        assert_eq!(payloads[1].kind, "run");
        assert_eq!(payloads[1].distance, Some(5.2));
        assert_eq!(
            payloads[0].date,
            Utc.with_ymd_and_hms(2024, 5, 4, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn import_skips_bad_rows() {
        let csv_text = "\
id,type,exercise,muscle_group,sets,reps,weight,distance,pace,duration,calories,date
w1,gym,Squat,legs,3,10,100.0,,,45,320,2024-05-04T00:00:00+00:00
w2,gym,,legs,3,10,100.0,,,45,320,2024-05-04T00:00:00+00:00
w3,swim,,,,,,,,30,,2024-05-04T00:00:00+00:00
w4,run,,,,,,5.2,5:30,30,,not-a-date
w5,run,,,,,,5.2,5:30,,,2024-05-05T00:00:00+00:00
";
        let payloads = import_workouts_csv(csv_text.as_bytes(), "u1").unwrap();
        assert_eq!(payloads.len(), 1);
        assert_eq!(payloads[0].exercise.as_deref(), Some("Squat"));
    }

    #[test]
    fn json_export_writes_summary_totals() {
        let records = sample_records();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        save_summary_json(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let summary: SummaryExport = serde_json::from_str(&text).unwrap();
        assert_eq!(summary.total_workouts, 2);
        assert!((summary.total_distance_km - 5.2).abs() < 1e-6);
        assert_eq!(summary.total_calories, 600);
        assert_eq!(summary.muscle_groups, vec![("legs".to_string(), 1)]);
    }

    #[test]
    fn workouts_json_round_trips() {
        let records = sample_records();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("workouts.json");
        save_workouts_json(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let parsed: Vec<FlatRecord> = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, flatten(&records));
    }
}
