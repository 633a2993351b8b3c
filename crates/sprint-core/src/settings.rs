use crate::error::{PlanError, Result};
use crate::paths;
use crate::types::sanitize_hours;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Active sprint configuration. Ritual durations are fixed hours per member
/// per sprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SprintSettings {
    #[serde(default = "default_duration_days")]
    pub sprint_duration_days: f64,
    #[serde(default = "default_daily_scrum")]
    pub daily_scrum_duration: f64,
    #[serde(default = "default_planning")]
    pub planning_duration: f64,
    #[serde(default = "default_two_hours")]
    pub review_duration: f64,
    #[serde(default = "default_two_hours")]
    pub retro_duration: f64,
    #[serde(default = "default_two_hours")]
    pub refinement_duration: f64,
    #[serde(default)]
    pub other_rituals_duration: f64,
}

fn default_duration_days() -> f64 {
    15.0
}

fn default_daily_scrum() -> f64 {
    0.25
}

fn default_planning() -> f64 {
    4.0
}

fn default_two_hours() -> f64 {
    2.0
}

impl Default for SprintSettings {
    fn default() -> Self {
        Self {
            sprint_duration_days: default_duration_days(),
            daily_scrum_duration: default_daily_scrum(),
            planning_duration: default_planning(),
            review_duration: default_two_hours(),
            retro_duration: default_two_hours(),
            refinement_duration: default_two_hours(),
            other_rituals_duration: 0.0,
        }
    }
}

impl SprintSettings {
    /// Sum of all six ritual durations.
    pub fn ritual_hours(&self) -> f64 {
        self.daily_scrum_duration
            + self.planning_duration
            + self.review_duration
            + self.retro_duration
            + self.refinement_duration
            + self.other_rituals_duration
    }

    /// Coerce every field to a finite, non-negative number of hours (or days).
    pub fn normalize(&mut self) {
        for field in [
            &mut self.sprint_duration_days,
            &mut self.daily_scrum_duration,
            &mut self.planning_duration,
            &mut self.review_duration,
            &mut self.retro_duration,
            &mut self.refinement_duration,
            &mut self.other_rituals_duration,
        ] {
            *field = sanitize_hours(*field);
        }
    }

    /// Read `.sprint/settings.yaml`; values are normalized on the way in.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        if !path.exists() {
            return Err(PlanError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let mut settings: SprintSettings = serde_yaml::from_str(&data)?;
        settings.normalize();
        Ok(settings)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::settings_path(root), data.as_bytes())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SettingsPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_duration_days: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_scrum_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub planning_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retro_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refinement_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_rituals_duration: Option<f64>,
}

impl SettingsPatch {
    /// Patch that overwrites every field with the values in `settings`.
    pub fn full(settings: &SprintSettings) -> Self {
        Self {
            sprint_duration_days: Some(settings.sprint_duration_days),
            daily_scrum_duration: Some(settings.daily_scrum_duration),
            planning_duration: Some(settings.planning_duration),
            review_duration: Some(settings.review_duration),
            retro_duration: Some(settings.retro_duration),
            refinement_duration: Some(settings.refinement_duration),
            other_rituals_duration: Some(settings.other_rituals_duration),
        }
    }

    pub fn apply_to(&self, settings: &mut SprintSettings) {
        let fields: [(&Option<f64>, &mut f64); 7] = [
            (&self.sprint_duration_days, &mut settings.sprint_duration_days),
            (&self.daily_scrum_duration, &mut settings.daily_scrum_duration),
            (&self.planning_duration, &mut settings.planning_duration),
            (&self.review_duration, &mut settings.review_duration),
            (&self.retro_duration, &mut settings.retro_duration),
            (&self.refinement_duration, &mut settings.refinement_duration),
            (&self.other_rituals_duration, &mut settings.other_rituals_duration),
        ];
        for (patch, field) in fields {
            if let Some(v) = patch {
                *field = sanitize_hours(*v);
            }
        }
    }

    /// The set fields of this patch, carrying the values `settings` ended up
    /// with after [`SettingsPatch::apply_to`].
    pub fn resolved(&self, settings: &SprintSettings) -> Self {
        let full = SettingsPatch::full(settings);
        let pick = |set: Option<f64>, v: Option<f64>| set.and(v);
        Self {
            sprint_duration_days: pick(self.sprint_duration_days, full.sprint_duration_days),
            daily_scrum_duration: pick(self.daily_scrum_duration, full.daily_scrum_duration),
            planning_duration: pick(self.planning_duration, full.planning_duration),
            review_duration: pick(self.review_duration, full.review_duration),
            retro_duration: pick(self.retro_duration, full.retro_duration),
            refinement_duration: pick(self.refinement_duration, full.refinement_duration),
            other_rituals_duration: pick(self.other_rituals_duration, full.other_rituals_duration),
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &SettingsPatch::default()
    }
}
