use crate::cmd::{load_state, mutate};
use crate::output::{hours, print_json, print_table};
use clap::Subcommand;
use sprint_core::settings::{SettingsPatch, SprintSettings};
use sprint_core::store::Mutation;
use std::path::Path;

#[derive(Subcommand)]
pub enum SettingsSubcommand {
    /// Show the sprint settings
    Show,
    /// Change one or more settings; ritual durations are hours per member
    Set {
        /// Sprint length in working days
        #[arg(long)]
        duration_days: Option<f64>,
        /// Daily scrum, hours per member per sprint
        #[arg(long)]
        daily_scrum: Option<f64>,
        #[arg(long)]
        planning: Option<f64>,
        #[arg(long)]
        review: Option<f64>,
        #[arg(long)]
        retro: Option<f64>,
        #[arg(long)]
        refinement: Option<f64>,
        #[arg(long)]
        other_rituals: Option<f64>,
    },
}

pub fn run(root: &Path, subcmd: SettingsSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SettingsSubcommand::Show => {
            let state = load_state(root)?;
            show(&state.settings, json)
        }
        SettingsSubcommand::Set {
            duration_days,
            daily_scrum,
            planning,
            review,
            retro,
            refinement,
            other_rituals,
        } => {
            let patch = SettingsPatch {
                sprint_duration_days: duration_days,
                daily_scrum_duration: daily_scrum,
                planning_duration: planning,
                review_duration: review,
                retro_duration: retro,
                refinement_duration: refinement,
                other_rituals_duration: other_rituals,
            };
            if patch.is_empty() {
                anyhow::bail!("nothing to change: pass at least one setting flag");
            }
            let state = mutate(root, Mutation::UpdateSettings(patch))?;
            show(&state.settings, json)
        }
    }
}

fn show(s: &SprintSettings, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(s);
    }
    let rows = vec![
        vec!["Sprint duration".into(), format!("{} days", s.sprint_duration_days)],
        vec!["Daily scrum".into(), hours(s.daily_scrum_duration)],
        vec!["Planning".into(), hours(s.planning_duration)],
        vec!["Review".into(), hours(s.review_duration)],
        vec!["Retro".into(), hours(s.retro_duration)],
        vec!["Refinement".into(), hours(s.refinement_duration)],
        vec!["Other rituals".into(), hours(s.other_rituals_duration)],
        vec!["Rituals per member".into(), hours(s.ritual_hours())],
    ];
    print_table(&["SETTING", "VALUE"], rows);
    Ok(())
}
