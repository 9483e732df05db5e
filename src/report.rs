use crate::aggregate::{self, Period, RecentRow};
use crate::export::SummaryExport;
use crate::workout::Workout;
use maud::{html, Markup};
use plotters::prelude::*;
use std::path::Path;

/// Write an HTML summary report next to a PNG of the activity chart.
///
/// A chart rendering failure is logged and the report falls back to a
/// placeholder instead of failing the export.
pub fn export_html_report<P: AsRef<Path>>(
    path: P,
    records: &[Workout],
    period: Period,
) -> std::io::Result<()> {
    let path = path.as_ref();
    let chart_path = path.with_extension("png");
    let chart_file = match draw_activity_chart(records, period, &chart_path) {
        Ok(_) => chart_path
            .file_name()
            .unwrap_or_else(|| std::ffi::OsStr::new("")),
        Err(e) => {
            log::error!("failed to render report chart: {e}");
            std::ffi::OsStr::new("")
        }
    };
    let summary = SummaryExport::from_records(records);
    let recent = aggregate::recent_view(records, 10);
    let markup = build_html(&summary, &recent, period, chart_file);
    std::fs::write(path, markup.into_string())
}

fn draw_activity_chart(
    records: &[Workout],
    period: Period,
    path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let series = aggregate::select_series(period, records);
    let root = BitMapBackend::new(path, (800, 400)).into_drawing_area();
    root.fill(&WHITE)?;
    let max = series.iter().map(|(_, count)| *count).max().unwrap_or(0);
    let mut chart = ChartBuilder::on(&root)
        .caption(format!("{} Activity", period.label()), ("sans-serif", 25))
        .margin(5)
        .x_label_area_size(30)
        .y_label_area_size(40)
        .build_cartesian_2d(0..series.len(), 0..max + 1)?;
    chart
        .configure_mesh()
        .disable_mesh()
        .y_desc("Workouts")
        .x_label_formatter(&|idx| {
            series
                .get(*idx)
                .map(|(label, _)| label.to_string())
                .unwrap_or_default()
        })
        .draw()?;
    chart.draw_series(
        series
            .iter()
            .enumerate()
            .map(|(i, (_, count))| Rectangle::new([(i, 0), (i + 1, *count)], BLUE.filled())),
    )?;
    root.present()?;
    Ok(())
}

fn build_html(
    summary: &SummaryExport,
    recent: &[RecentRow],
    period: Period,
    chart_file: &std::ffi::OsStr,
) -> Markup {
    html! {
        html {
            head { meta charset="utf-8"; title { "Fitness Report" } }
            body {
                h1 { "Summary" }
                table border="1" {
                    tr { th { "Total Workouts" } td { (summary.total_workouts) } }
                    tr { th { "Total Distance (km)" } td { (format!("{:.1}", summary.total_distance_km)) } }
                    tr { th { "Total Calories" } td { (summary.total_calories) } }
                }
                h1 { "Muscle Groups" }
                table border="1" {
                    tr { th { "Group" } th { "Workouts" } }
                    @for (group, count) in &summary.muscle_groups {
                        tr { td { (crate::workout::group_label(group)) } td { (count) } }
                    }
                }
                h1 { (period.label()) " Activity" }
                @if chart_file.is_empty() {
                    p { "Chart unavailable" }
                } @else {
                    img src=(chart_file.to_string_lossy());
                }
                h1 { "Recent Workouts" }
                table border="1" {
                    tr { th { "Workout" } th { "Date" } th { "Duration" } th { "Calories" } }
                    @for row in recent {
                        tr {
                            td { (row.title) }
                            td { (row.date) }
                            td { (row.duration) }
                            td { (row.calories) }
                        }
                    }
                }
            }
        }
    }
}
