//! The local planning workspace under `.sprint/`.
//!
//! Roster, backlog and settings live in separate YAML files so a team can
//! keep them in version control and review changes as small diffs.

use crate::config::Config;
use crate::error::{PlanError, Result};
use crate::io::{read_yaml_list, write_if_missing, write_yaml};
use crate::paths;
use crate::settings::SprintSettings;
use crate::store::PlanningState;
use serde::Serialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize)]
pub struct InitReport {
    /// Workspace files created by this call, relative to the root.
    pub created: Vec<&'static str>,
}

impl InitReport {
    pub fn already_initialized(&self) -> bool {
        self.created.is_empty()
    }
}

/// Create the workspace. Existing files are left untouched.
pub fn init(root: &Path, team: &str) -> Result<InitReport> {
    std::fs::create_dir_all(paths::sprint_dir(root))?;
    let mut report = InitReport::default();

    let config = serde_yaml::to_string(&Config::new(team))?;
    let settings = serde_yaml::to_string(&SprintSettings::default())?;
    let files: [(&'static str, String); 4] = [
        (paths::CONFIG_FILE, config),
        (paths::SETTINGS_FILE, settings),
        (paths::ROSTER_FILE, "[]\n".to_string()),
        (paths::BACKLOG_FILE, "[]\n".to_string()),
    ];
    for (rel, data) in files {
        if write_if_missing(&root.join(rel), data.as_bytes())? {
            report.created.push(rel);
        }
    }
    tracing::debug!(created = report.created.len(), "workspace init");
    Ok(report)
}

pub fn is_initialized(root: &Path) -> bool {
    paths::config_path(root).exists()
}

impl PlanningState {
    pub fn load(root: &Path) -> Result<Self> {
        if !is_initialized(root) {
            return Err(PlanError::NotInitialized);
        }
        let mut state = PlanningState {
            members: read_yaml_list(&paths::roster_path(root))?,
            stories: read_yaml_list(&paths::backlog_path(root))?,
            settings: SprintSettings::load(root)?,
        };
        for m in &mut state.members {
            m.normalize();
        }
        for s in &mut state.stories {
            s.normalize();
        }
        Ok(state)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        write_yaml(&paths::roster_path(root), &self.members)?;
        write_yaml(&paths::backlog_path(root), &self.stories)?;
        self.settings.save(root)
    }
}
