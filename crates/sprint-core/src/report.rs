//! Planning Report Generator: an HTML document for pasting into mail or a
//! wiki, and a tab-separated table for spreadsheets.

use crate::capacity::{utilization_percent, RoleBuckets};
use crate::forecast::Forecast;
use crate::settings::SprintSettings;
use crate::story::{in_sprint, Story};
use crate::types::StoryType;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;

pub const TSV_HEADER: &str = "Issue Type\tSummary\tDescription\tEstimate";

pub struct ReportInput<'a> {
    pub settings: &'a SprintSettings,
    pub capacity: RoleBuckets,
    pub stories: &'a [Story],
    pub forecast: Option<&'a Forecast>,
}

#[derive(Debug, Clone)]
pub struct ReportOptions {
    pub include_summary: bool,
    pub include_risks: bool,
    pub include_details: bool,
    pub generated_on: NaiveDate,
    /// Working hours per day, used to compare the forecast with the sprint.
    pub hours_per_day: f64,
}

impl ReportOptions {
    pub fn new(generated_on: NaiveDate) -> Self {
        Self {
            include_summary: true,
            include_risks: true,
            include_details: true,
            generated_on,
            hours_per_day: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapacitySummary {
    pub capacity: f64,
    pub committed: f64,
    /// `None` when capacity is zero.
    pub percent: Option<i64>,
    pub overloaded: bool,
}

/// Capacity vs committed work for the sprint. Capacity counts the Dev and QA
/// pools only; committed work is the sum of [`Story::committed_hours`], so
/// Task stories add nothing.
pub fn summarize(input: &ReportInput<'_>) -> CapacitySummary {
    let capacity = input.capacity.delivery();
    let committed: f64 = in_sprint(input.stories).map(Story::committed_hours).sum();
    CapacitySummary {
        capacity,
        committed,
        percent: utilization_percent(committed, capacity),
        overloaded: committed > capacity,
    }
}

/// Risk lines for the report; empty when the sprint fits.
pub fn risks(input: &ReportInput<'_>, hours_per_day: f64) -> Vec<String> {
    let summary = summarize(input);
    let mut out = Vec::new();
    if summary.overloaded {
        match summary.percent {
            Some(p) => out.push(format!("Team is overloaded ({p}% of capacity).")),
            None => out.push("Team is overloaded (no available capacity).".to_string()),
        }
    }
    if let Some(f) = input.forecast {
        let sprint_hours = input.settings.sprint_duration_days * hours_per_day;
        if f.horizon > sprint_hours {
            out.push(format!(
                "Forecast runs past the sprint ({}h of {}h).",
                f.horizon.round(),
                sprint_hours.round()
            ));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// HTML document
// ---------------------------------------------------------------------------

pub fn render_html(input: &ReportInput<'_>, opts: &ReportOptions) -> String {
    let mut html = String::new();
    html.push_str("<div style=\"font-family: Arial, sans-serif; color: #333; max-width: 800px;\">\n");
    html.push_str("<h2>Sprint Planning Report</h2>\n");
    let _ = writeln!(
        html,
        "<p><strong>Generated:</strong> {}<br/><strong>Sprint Duration:</strong> {} Days</p>",
        opts.generated_on.format("%Y-%m-%d"),
        input.settings.sprint_duration_days
    );

    if opts.include_summary {
        let s = summarize(input);
        let percent = s
            .percent
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "n/a".to_string());
        let color = if s.overloaded { "#dc2626" } else { "#16a34a" };
        html.push_str("<h3>Capacity Summary</h3>\n<table>\n");
        let _ = writeln!(
            html,
            "<tr><td>Total Capacity:</td><td><strong>{}h</strong></td></tr>",
            s.capacity.round()
        );
        let _ = writeln!(
            html,
            "<tr><td>Committed Work:</td><td style=\"color: {color};\"><strong>{}h ({percent})</strong></td></tr>",
            s.committed.round()
        );
        if let Some(f) = input.forecast {
            let _ = writeln!(
                html,
                "<tr><td>Forecast Delivery:</td><td><strong>{}h</strong></td></tr>",
                f.horizon
            );
        }
        html.push_str("</table>\n");
    }

    if opts.include_risks {
        let lines = risks(input, opts.hours_per_day);
        if !lines.is_empty() {
            html.push_str("<h3 style=\"color: #dc2626;\">Risks &amp; Alerts</h3>\n<ul>\n");
            for line in lines {
                let _ = writeln!(html, "<li>{}</li>", escape(&line));
            }
            html.push_str("</ul>\n");
        }
    }

    if opts.include_details {
        html.push_str("<h3>Committed Items</h3>\n<table>\n");
        html.push_str("<thead><tr><th>Type</th><th>Title</th><th>Est (h)</th></tr></thead>\n<tbody>\n");
        for story in in_sprint(input.stories) {
            let badge = match story.story_type {
                StoryType::Bug => "#fee2e2",
                _ => "#dbeafe",
            };
            let _ = write!(
                html,
                "<tr><td><span style=\"background-color: {badge};\">{}</span></td><td><strong>{}</strong>",
                story.story_type,
                escape(&story.title)
            );
            if !story.sub_tasks.is_empty() {
                html.push_str("<ul>");
                for t in &story.sub_tasks {
                    let _ = write!(html, "<li>{} ({}h)</li>", escape(&t.title), t.estimate);
                }
                html.push_str("</ul>");
            }
            let _ = writeln!(html, "</td><td>{}</td></tr>", story.committed_hours());
        }
        html.push_str("</tbody>\n</table>\n");
    }

    html.push_str("</div>\n");
    html
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Tab-separated export
// ---------------------------------------------------------------------------

/// One row per in-sprint story followed by one row per sub-task.
pub fn render_tsv(stories: &[Story]) -> String {
    let mut tsv = String::from(TSV_HEADER);
    tsv.push('\n');
    for story in in_sprint(stories) {
        let _ = writeln!(
            tsv,
            "{}\t{}\t\t{}",
            story.story_type,
            cell(&story.title),
            story.committed_hours()
        );
        for t in &story.sub_tasks {
            let _ = writeln!(
                tsv,
                "{}\t{}\t\t{}",
                t.category.export_label(),
                cell(&t.title),
                t.estimate
            );
        }
    }
    tsv
}

fn cell(s: &str) -> String {
    s.replace(['\t', '\n', '\r'], " ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forecast::{schedule, Job};
    use crate::types::TaskCategory;

    fn sprint_story(id: &str, dev: f64, qa: f64) -> Story {
        let mut s = Story::new(id, format!("Story {id}"), StoryType::UserStory)
            .with_sub_task("build", TaskCategory::Implementation, dev)
            .with_sub_task("verify", TaskCategory::Test, qa);
        s.in_sprint = true;
        s
    }

    fn opts() -> ReportOptions {
        ReportOptions::new(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())
    }

    #[test]
    fn overloaded_sprint_reports_percent_and_risk() {
        let settings = SprintSettings::default();
        let stories = vec![sprint_story("a", 80.0, 40.0)];
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets {
                dev: 60.0,
                qa: 40.0,
                other: 500.0,
            },
            stories: &stories,
            forecast: None,
        };
        let s = summarize(&input);
        assert_eq!(s.capacity, 100.0);
        assert_eq!(s.percent, Some(120));
        assert!(s.overloaded);

        let html = render_html(&input, &opts());
        assert!(html.contains("120h (120%)"));
        assert!(html.contains("Risks &amp; Alerts"));
        assert!(html.contains("overloaded (120% of capacity)"));
        assert!(html.contains("2026-03-02"));
    }

    #[test]
    fn zero_capacity_never_panics() {
        let settings = SprintSettings::default();
        let stories = vec![sprint_story("a", 1.0, 0.0)];
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets::default(),
            stories: &stories,
            forecast: None,
        };
        assert_eq!(summarize(&input).percent, None);
        let html = render_html(&input, &opts());
        assert!(html.contains("(n/a)"));
        assert!(html.contains("no available capacity"));
    }

    #[test]
    fn risks_section_omitted_when_fitting_or_disabled() {
        let settings = SprintSettings::default();
        let stories = vec![sprint_story("a", 10.0, 5.0)];
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets {
                dev: 100.0,
                qa: 50.0,
                other: 0.0,
            },
            stories: &stories,
            forecast: None,
        };
        assert!(!render_html(&input, &opts()).contains("Risks"));

        let over = vec![sprint_story("a", 500.0, 0.0)];
        let input = ReportInput {
            stories: &over,
            ..input
        };
        let mut o = opts();
        o.include_risks = false;
        assert!(!render_html(&input, &o).contains("Risks"));
    }

    #[test]
    fn forecast_past_sprint_is_a_risk() {
        let mut settings = SprintSettings::default();
        settings.sprint_duration_days = 1.0;
        let stories = vec![sprint_story("a", 6.0, 4.0)];
        let forecast = schedule(&[Job::from_story(&stories[0])], 1, 1);
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets {
                dev: 100.0,
                qa: 100.0,
                other: 0.0,
            },
            stories: &stories,
            forecast: Some(&forecast),
        };
        let lines = risks(&input, 8.0);
        assert_eq!(lines, vec!["Forecast runs past the sprint (10h of 8h).".to_string()]);
    }

    #[test]
    fn details_escape_titles_and_list_subtasks() {
        let settings = SprintSettings::default();
        let mut s = sprint_story("a", 3.0, 2.5);
        s.title = "<script>".to_string();
        let stories = vec![s];
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets::default(),
            stories: &stories,
            forecast: None,
        };
        let html = render_html(&input, &opts());
        assert!(html.contains("&lt;script&gt;"));
        assert!(html.contains("<li>verify (2.5h)</li>"));
        assert!(html.contains("<td>5.5</td>"));
    }

    #[test]
    fn task_stories_commit_zero_hours() {
        let settings = SprintSettings::default();
        let mut task = Story::new("t", "Orphan", StoryType::Task).with_sub_task(
            "chore",
            TaskCategory::Implementation,
            6.0,
        );
        task.in_sprint = true;
        let stories = vec![task, sprint_story("a", 2.0, 1.0)];
        let input = ReportInput {
            settings: &settings,
            capacity: RoleBuckets {
                dev: 10.0,
                qa: 10.0,
                other: 0.0,
            },
            stories: &stories,
            forecast: None,
        };
        assert_eq!(summarize(&input).committed, 3.0);

        let html = render_html(&input, &opts());
        assert!(html.contains("<li>chore (6h)</li></ul></td><td>0</td>"));

        let tsv = render_tsv(&stories);
        assert!(tsv.contains("Task\tOrphan\t\t0\n"));
        assert!(tsv.contains("Sub-Imp\tchore\t\t6\n"));
    }

    #[test]
    fn tsv_rows_for_stories_and_subtasks() {
        let mut stories = vec![sprint_story("a", 5.0, 3.0)];
        stories.push(Story::new("b", "Parked", StoryType::Bug));
        let tsv = render_tsv(&stories);
        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(
            lines,
            vec![
                TSV_HEADER,
                "User Story\tStory a\t\t8",
                "Sub-Imp\tbuild\t\t5",
                "Sub-Test\tverify\t\t3",
            ]
        );
    }
}
