//! Chart series construction for the dashboard plots.

use egui::Color32;
use egui_plot::{Bar, BarChart};

use crate::workout::{group_label, MuscleGroup};

/// Fill color for a muscle group bar. Unknown wire values fall back to gray.
pub fn group_color(raw: &str) -> Color32 {
    match MuscleGroup::parse(raw) {
        Some(MuscleGroup::Bicep) => Color32::from_rgb(66, 135, 245),
        Some(MuscleGroup::Tricep) => Color32::from_rgb(52, 168, 83),
        Some(MuscleGroup::Back) => Color32::from_rgb(234, 67, 53),
        Some(MuscleGroup::Abs) => Color32::from_rgb(251, 188, 5),
        Some(MuscleGroup::Legs) => Color32::from_rgb(155, 81, 224),
        Some(MuscleGroup::Calves) => Color32::from_rgb(0, 172, 193),
        None => Color32::GRAY,
    }
}

/// Bar chart of workout counts per period bucket, x positions matching the
/// bucket indices so the axis formatter can map them back to labels.
pub fn activity_bars(series: &[(&'static str, usize)]) -> BarChart {
    let bars: Vec<Bar> = series
        .iter()
        .enumerate()
        .map(|(idx, (_label, count))| Bar::new(idx as f64, *count as f64))
        .collect();
    BarChart::new(bars).name("Workouts")
}

/// One single-bar chart per muscle group so each gets its own color and
/// legend entry.
pub fn muscle_group_bars(breakdown: &[(String, usize)]) -> Vec<BarChart> {
    breakdown
        .iter()
        .enumerate()
        .map(|(idx, (group, count))| {
            let bar = Bar::new(idx as f64, *count as f64).fill(group_color(group));
            BarChart::new(vec![bar]).name(group_label(group))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_groups_have_distinct_colors() {
        let colors: Vec<Color32> = ["bicep", "tricep", "back", "abs", "legs", "calves"]
            .iter()
            .map(|g| group_color(g))
            .collect();
        for (i, a) in colors.iter().enumerate() {
            for b in &colors[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_group_falls_back_to_gray() {
        assert_eq!(group_color("chest"), Color32::GRAY);
        assert_eq!(group_color(""), Color32::GRAY);
        // Lookup is case-insensitive like the rest of the group handling.
        assert_eq!(group_color("LEGS"), group_color("legs"));
    }
}
