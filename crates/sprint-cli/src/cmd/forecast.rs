use crate::cmd::load_state;
use crate::output::{hours, print_json, print_table, short_id};
use anyhow::Context;
use sprint_core::config::Config;
use sprint_core::forecast::{forecast_sprint, SegmentKind};
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let state = load_state(root)?;
    let forecast = forecast_sprint(&state.stories, &state.members);
    let hours_per_day = config.forecast.hours_per_day;
    let sprint_hours = state.settings.sprint_duration_days * hours_per_day;

    if json {
        return print_json(&serde_json::json!({
            "forecast": forecast,
            "horizon_days": days(forecast.horizon, hours_per_day),
            "sprint_hours": sprint_hours,
            "fits": forecast.horizon <= sprint_hours,
        }));
    }

    if forecast.segments.is_empty() {
        println!("Nothing to forecast: the sprint has no estimated work.");
        return Ok(());
    }

    let mut segments: Vec<_> = forecast.segments.iter().collect();
    segments.sort_by_key(|s| forecast.display_row(s));
    let rows = segments
        .iter()
        .map(|s| {
            vec![
                lane_label(s.kind, s.lane),
                short_id(&s.story_id),
                s.title.clone(),
                s.kind.label().to_string(),
                hours(s.start),
                hours(s.end()),
            ]
        })
        .collect();
    print_table(&["LANE", "STORY", "TITLE", "WORK", "START", "END"], rows);
    println!();

    let horizon_days = days(forecast.horizon, hours_per_day)
        .map(|d| format!(" ({d:.1} days)"))
        .unwrap_or_default();
    println!(
        "Delivery horizon: {}{horizon_days} with {} dev and {} qa lanes",
        hours(forecast.horizon),
        forecast.dev_lanes,
        forecast.qa_lanes
    );
    if forecast.horizon > sprint_hours {
        println!(
            "Warning: forecast runs past the {}-day sprint ({})",
            state.settings.sprint_duration_days,
            hours(sprint_hours)
        );
    }
    Ok(())
}

fn lane_label(kind: SegmentKind, lane: usize) -> String {
    format!("{kind} {}", lane + 1)
}

fn days(h: f64, hours_per_day: f64) -> Option<f64> {
    (hours_per_day > 0.0).then(|| h / hours_per_day)
}
