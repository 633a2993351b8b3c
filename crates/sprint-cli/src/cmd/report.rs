use crate::cmd::load_state;
use crate::output::print_json;
use anyhow::Context;
use clap::{Args, ValueEnum};
use sprint_core::capacity::team_capacity_by_role;
use sprint_core::config::Config;
use sprint_core::forecast::forecast_sprint;
use sprint_core::report::{render_html, render_tsv, risks, summarize, ReportInput, ReportOptions};
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Formatted document for mail or a wiki
    Html,
    /// Tab-separated rows for a spreadsheet or issue import
    Tsv,
}

#[derive(Args)]
pub struct ReportArgs {
    #[arg(long, value_enum, default_value = "html")]
    format: ReportFormat,
    /// Leave out the capacity summary
    #[arg(long)]
    no_summary: bool,
    /// Leave out risks and alerts
    #[arg(long)]
    no_risks: bool,
    /// Leave out the committed items table
    #[arg(long)]
    no_details: bool,
    /// Write the report to a file instead of stdout
    #[arg(long, short = 'o')]
    out: Option<PathBuf>,
}

pub fn run(root: &Path, args: ReportArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let state = load_state(root)?;
    let forecast = forecast_sprint(&state.stories, &state.members);
    let input = ReportInput {
        settings: &state.settings,
        capacity: team_capacity_by_role(&state.members, &state.settings),
        stories: &state.stories,
        forecast: Some(&forecast),
    };

    let mut opts = ReportOptions::new(chrono::Local::now().date_naive());
    opts.include_summary = !args.no_summary;
    opts.include_risks = !args.no_risks;
    opts.include_details = !args.no_details;
    opts.hours_per_day = config.forecast.hours_per_day;

    let document = match args.format {
        ReportFormat::Html => render_html(&input, &opts),
        ReportFormat::Tsv => render_tsv(&state.stories),
    };

    if let Some(path) = &args.out {
        std::fs::write(path, &document)
            .with_context(|| format!("failed to write {}", path.display()))?;
    }

    if json {
        print_json(&serde_json::json!({
            "summary": summarize(&input),
            "risks": risks(&input, opts.hours_per_day),
            "document": document,
        }))?;
    } else if let Some(path) = &args.out {
        println!("Report written to {}", path.display());
    } else {
        print!("{document}");
    }
    Ok(())
}
