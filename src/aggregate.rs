// Module for deriving dashboard statistics from fetched workout records
use crate::workout::{group_label, Workout, WorkoutDetails, WorkoutKind};
use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub fn total_count(records: &[Workout]) -> usize {
    records.len()
}

/// Sum of run distances in kilometers.
///
/// Only `run` records contribute; a run without a recorded distance counts
/// as zero rather than failing.
pub fn total_distance_km(records: &[Workout]) -> f32 {
    records
        .iter()
        .map(|w| match &w.details {
            WorkoutDetails::Run { distance_km, .. } => distance_km.unwrap_or(0.0),
            WorkoutDetails::Gym { .. } => 0.0,
        })
        .sum()
}

/// Sum of the calorie field over all records; absent values contribute zero.
pub fn total_calories(records: &[Workout]) -> u32 {
    records.iter().map(|w| w.calories.unwrap_or(0)).sum()
}

/// Count gym records per muscle group.
///
/// Records without a muscle group are excluded, so no group ever appears
/// with a zero count. The order of the returned pairs is not significant.
pub fn muscle_group_breakdown(records: &[Workout]) -> Vec<(String, usize)> {
    let mut map: BTreeMap<String, usize> = BTreeMap::new();
    for w in records {
        if let WorkoutDetails::Gym {
            muscle_group: Some(group),
            ..
        } = &w.details
        {
            if !group.is_empty() {
                *map.entry(group.clone()).or_insert(0) += 1;
            }
        }
    }
    map.into_iter().collect()
}

/// One display row of the recent workout list.
#[derive(Debug, Clone, PartialEq)]
pub struct RecentRow {
    pub id: String,
    pub kind: WorkoutKind,
    pub title: String,
    pub group: Option<String>,
    pub date: String,
    pub duration: String,
    pub distance: Option<String>,
    pub calories: String,
}

/// Map the first `limit` records (already sorted by `occurred_at`
/// descending) into display rows.
pub fn recent_view(records: &[Workout], limit: usize) -> Vec<RecentRow> {
    records
        .iter()
        .take(limit)
        .map(|w| RecentRow {
            id: w.id.clone(),
            kind: w.kind(),
            title: w.title().to_string(),
            group: match &w.details {
                WorkoutDetails::Gym {
                    muscle_group: Some(group),
                    ..
                } => Some(group_label(group)),
                _ => None,
            },
            date: w.occurred_at.format("%d %b %Y, %H:%M").to_string(),
            duration: format!("{} min", w.duration_min),
            distance: match &w.details {
                WorkoutDetails::Run {
                    distance_km: Some(d),
                    ..
                } => Some(format!("{d:.1} km")),
                _ => None,
            },
            calories: format!("{} kcal", w.calories.unwrap_or(0)),
        })
        .collect()
}

/// Granularity selector for the activity chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Period {
    #[default]
    Weekly,
    Monthly,
    Yearly,
}

impl Period {
    pub fn label(self) -> &'static str {
        match self {
            Period::Weekly => "Weekly",
            Period::Monthly => "Monthly",
            Period::Yearly => "Yearly",
        }
    }
}

pub const ALL_PERIODS: [Period; 3] = [Period::Weekly, Period::Monthly, Period::Yearly];

const WEEKDAY_LABELS: [&str; 7] = ["Mon", "Tue", "Wed", "Thu", "Fri", "Sat", "Sun"];
const WEEK_LABELS: [&str; 4] = ["Week 1", "Week 2", "Week 3", "Week 4"];
const MONTH_LABELS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Bucket records into the fixed label set for `period`.
///
/// Assignment uses `occurred_at` truncated to the bucket granularity; days
/// 29-31 fold into the fourth week. Buckets with no matching record keep a
/// zero count.
pub fn select_series(period: Period, records: &[Workout]) -> Vec<(&'static str, usize)> {
    let labels: &[&'static str] = match period {
        Period::Weekly => &WEEKDAY_LABELS,
        Period::Monthly => &WEEK_LABELS,
        Period::Yearly => &MONTH_LABELS,
    };
    let mut counts = vec![0usize; labels.len()];
    for w in records {
        let idx = match period {
            Period::Weekly => w.occurred_at.weekday().num_days_from_monday() as usize,
            Period::Monthly => (((w.occurred_at.day() - 1) / 7) as usize).min(3),
            Period::Yearly => w.occurred_at.month0() as usize,
        };
        counts[idx] += 1;
    }
    labels.iter().copied().zip(counts).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn gym(id: &str, group: Option<&str>) -> Workout {
        Workout {
            id: id.into(),
            owner: "u1".into(),
            details: WorkoutDetails::Gym {
                exercise: "Squat".into(),
                muscle_group: group.map(str::to_string),
                sets: Some(3),
                reps: Some(10),
                weight_kg: Some(100.0),
            },
            duration_min: 45,
            calories: Some(320),
            occurred_at: Utc.with_ymd_and_hms(2024, 1, 1, 18, 30, 0).unwrap(),
        }
    }

    fn run(id: &str, distance_km: Option<f32>) -> Workout {
        Workout {
            id: id.into(),
            owner: "u1".into(),
            details: WorkoutDetails::Run {
                distance_km,
                pace: Some("5:30".into()),
            },
            duration_min: 30,
            calories: Some(280),
            occurred_at: Utc.with_ymd_and_hms(2024, 1, 2, 7, 0, 0).unwrap(),
        }
    }

    #[test]
    fn totals_over_mixed_list() {
        // Two leg days and one five kilometer run.
        let records = vec![gym("w1", Some("legs")), gym("w2", Some("legs")), run("w3", Some(5.0))];
        assert_eq!(total_count(&records), 3);
        assert!((total_distance_km(&records) - 5.0).abs() < 1e-6);
        assert_eq!(
            muscle_group_breakdown(&records),
            vec![("legs".to_string(), 2)]
        );
    }

    #[test]
    fn distance_counts_only_runs() {
        let records = vec![gym("w1", None), run("w2", Some(5.2)), run("w3", None)];
        assert!((total_distance_km(&records) - 5.2).abs() < 1e-6);
        assert!(total_distance_km(&records) >= 0.0);
    }

    #[test]
    fn calories_default_to_zero() {
        let mut no_calories = gym("w1", None);
        no_calories.calories = None;
        let records = vec![no_calories, run("w2", Some(3.0))];
        assert_eq!(total_calories(&records), 280);
    }

    #[test]
    fn breakdown_excludes_missing_groups_and_zero_counts() {
        let records = vec![
            gym("w1", Some("legs")),
            gym("w2", Some("back")),
            gym("w3", None),
            run("w4", Some(5.0)),
        ];
        let breakdown = muscle_group_breakdown(&records);
        assert!(breakdown.iter().all(|(_, count)| *count > 0));
        let gym_with_group = 2;
        assert_eq!(
            breakdown.iter().map(|(_, count)| count).sum::<usize>(),
            gym_with_group
        );
    }

    #[test]
    fn aggregates_are_idempotent() {
        let records = vec![gym("w1", Some("legs")), run("w2", Some(5.0))];
        assert_eq!(total_count(&records), total_count(&records));
        assert_eq!(total_distance_km(&records), total_distance_km(&records));
        assert_eq!(
            muscle_group_breakdown(&records),
            muscle_group_breakdown(&records)
        );
        assert_eq!(
            select_series(Period::Weekly, &records),
            select_series(Period::Weekly, &records)
        );
    }

    #[test]
    fn recent_view_limits_and_formats() {
        let records = vec![gym("w1", Some("legs")), run("w2", Some(5.2)), gym("w3", None)];
        let rows = recent_view(&records, 2);
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].title, "Squat");
        assert_eq!(rows[0].group.as_deref(), Some("Legs"));
        assert_eq!(rows[0].date, "01 Jan 2024, 18:30");
        assert_eq!(rows[0].duration, "45 min");
        assert_eq!(rows[0].calories, "320 kcal");
        assert_eq!(rows[1].title, "Run");
        assert_eq!(rows[1].distance.as_deref(), Some("5.2 km"));
    }

    #[test]
    fn weekly_series_buckets_by_weekday() {
        // 2024-01-01 was a Monday.
        let records = vec![gym("w1", None), gym("w2", None), run("w3", Some(5.0))];
        let series = select_series(Period::Weekly, &records);
        assert_eq!(series.len(), 7);
        assert_eq!(series[0], ("Mon", 2));
        assert_eq!(series[1], ("Tue", 1));
        assert!(series[2..].iter().all(|(_, count)| *count == 0));
    }

    #[test]
    fn monthly_series_folds_late_days_into_week_four() {
        let mut late = gym("w1", None);
        late.occurred_at = Utc.with_ymd_and_hms(2024, 1, 31, 9, 0, 0).unwrap();
        let mut mid = gym("w2", None);
        mid.occurred_at = Utc.with_ymd_and_hms(2024, 1, 9, 9, 0, 0).unwrap();
        let series = select_series(Period::Monthly, &[late, mid]);
        assert_eq!(series[1], ("Week 2", 1));
        assert_eq!(series[3], ("Week 4", 1));
    }

    #[test]
    fn yearly_series_buckets_by_month() {
        let mut march = gym("w1", None);
        march.occurred_at = Utc.with_ymd_and_hms(2024, 3, 15, 9, 0, 0).unwrap();
        let series = select_series(Period::Yearly, &[march, run("w2", None)]);
        assert_eq!(series.len(), 12);
        assert_eq!(series[0], ("Jan", 1));
        assert_eq!(series[2], ("Mar", 1));
        assert_eq!(series[11], ("Dec", 0));
    }
}
