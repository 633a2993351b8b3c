//! Column-level shape of the remote tables and the mapping to domain types.

use crate::member::{TeamMember, DEFAULT_DAILY_HOURS};
use crate::settings::SprintSettings;
use crate::store::PlanningState;
use crate::story::{Story, SubTask};
use crate::types::{sanitize_hours, RoleType, StoryType, TaskCategory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The settings table holds a single row with this id.
pub const SETTINGS_ROW_ID: i64 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Table {
    Members,
    Settings,
    Stories,
    SubTasks,
}

impl Table {
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Members => "daily_members",
            Table::Settings => "planning_settings",
            Table::Stories => "planning_stories",
            Table::SubTasks => "planning_subtasks",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Members
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemberRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub role_type: Option<String>,
    #[serde(default)]
    pub allocation: Option<f64>,
    #[serde(default)]
    pub days_off: Option<f64>,
    #[serde(default)]
    pub daily_hours: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl MemberRow {
    /// Row for insertion; the server assigns the id.
    pub fn for_insert(m: &TeamMember) -> Self {
        Self {
            id: None,
            name: m.name.clone(),
            role: Some(m.role.clone()),
            role_type: Some(m.role_type.as_str().to_string()),
            allocation: Some(m.allocation),
            days_off: Some(m.days_off),
            daily_hours: Some(m.daily_hours),
            avatar: m.avatar.clone(),
        }
    }

    /// Null columns fall back to a full-time Dev with no absence.
    pub fn into_member(self) -> TeamMember {
        let mut m = TeamMember {
            id: self.id.unwrap_or_default(),
            name: self.name,
            role: self.role.unwrap_or_default(),
            role_type: self
                .role_type
                .as_deref()
                .map(RoleType::from_label)
                .unwrap_or(RoleType::Dev),
            allocation: self.allocation.unwrap_or(100.0),
            days_off: self.days_off.unwrap_or(0.0),
            daily_hours: self.daily_hours.unwrap_or(DEFAULT_DAILY_HOURS),
            avatar: self.avatar,
        };
        m.normalize();
        m
    }
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsRow {
    #[serde(default = "settings_row_id")]
    pub id: i64,
    #[serde(flatten)]
    pub settings: SprintSettings,
}

fn settings_row_id() -> i64 {
    SETTINGS_ROW_ID
}

// ---------------------------------------------------------------------------
// Stories and sub-tasks
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryRow {
    pub id: String,
    pub title: String,
    #[serde(rename = "type", default)]
    pub story_type: StoryType,
    #[serde(default)]
    pub points: Option<f64>,
    #[serde(default)]
    pub in_sprint: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl StoryRow {
    pub fn from_story(s: &Story) -> Self {
        Self {
            id: s.id.clone(),
            title: s.title.clone(),
            story_type: s.story_type,
            points: s.points,
            in_sprint: s.in_sprint,
            created_at: Some(s.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubTaskRow {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub story_id: String,
    pub title: String,
    #[serde(default)]
    pub estimate: Option<f64>,
    #[serde(default)]
    pub category: TaskCategory,
    #[serde(default)]
    pub completed: bool,
}

impl SubTaskRow {
    pub fn from_sub_task(t: &SubTask, with_id: bool) -> Self {
        Self {
            id: with_id.then(|| t.id.clone()),
            story_id: t.story_id.clone(),
            title: t.title.clone(),
            estimate: Some(t.estimate),
            category: t.category,
            completed: t.completed,
        }
    }

    pub fn into_sub_task(self) -> SubTask {
        SubTask {
            id: self.id.unwrap_or_default(),
            story_id: self.story_id,
            title: self.title,
            estimate: sanitize_hours(self.estimate.unwrap_or(0.0)),
            category: self.category,
            completed: self.completed,
        }
    }
}

/// Assemble a full planning state from fetched rows.
///
/// Members are ordered by name and stories by creation time, matching the
/// order the remote is queried in. A missing settings row yields defaults.
pub fn assemble_state(
    members: Vec<MemberRow>,
    settings: Option<SettingsRow>,
    stories: Vec<StoryRow>,
    sub_tasks: Vec<SubTaskRow>,
) -> PlanningState {
    let mut members: Vec<TeamMember> = members.into_iter().map(MemberRow::into_member).collect();
    members.sort_by(|a, b| a.name.cmp(&b.name));

    let mut by_story: HashMap<String, Vec<SubTask>> = HashMap::new();
    for row in sub_tasks {
        let t = row.into_sub_task();
        by_story.entry(t.story_id.clone()).or_default().push(t);
    }

    let mut stories: Vec<Story> = stories
        .into_iter()
        .map(|r| Story {
            sub_tasks: by_story.remove(&r.id).unwrap_or_default(),
            id: r.id,
            title: r.title,
            story_type: r.story_type,
            points: r.points,
            in_sprint: r.in_sprint,
            created_at: r.created_at.unwrap_or_else(Utc::now),
        })
        .collect();
    stories.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    let mut settings = settings.map(|s| s.settings).unwrap_or_default();
    settings.normalize();

    PlanningState {
        members,
        stories,
        settings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_member_columns_use_defaults() {
        let row: MemberRow = serde_json::from_value(json!({
            "id": "m1", "name": "Ana", "role": null, "role_type": null,
            "allocation": null, "days_off": null, "daily_hours": null
        }))
        .unwrap();
        let m = row.into_member();
        assert_eq!(m.role_type, RoleType::Dev);
        assert_eq!(m.allocation, 100.0);
        assert_eq!(m.daily_hours, 8.0);
    }

    #[test]
    fn insert_row_omits_id() {
        let m = TeamMember::new("tmp-1", "Ana", RoleType::QA);
        let v = serde_json::to_value(MemberRow::for_insert(&m)).unwrap();
        assert!(v.get("id").is_none());
        assert_eq!(v["role_type"], "QA");
    }

    #[test]
    fn settings_row_flattens() {
        let row: SettingsRow = serde_json::from_value(json!({
            "id": 1, "sprint_duration_days": 10.0, "daily_scrum_duration": 0.25,
            "planning_duration": 4, "review_duration": 2, "retro_duration": 2,
            "refinement_duration": 2, "other_rituals_duration": 0
        }))
        .unwrap();
        assert_eq!(row.settings.sprint_duration_days, 10.0);
        assert_eq!(row.settings.ritual_hours(), 10.25);
    }

    #[test]
    fn assemble_groups_sub_tasks_and_orders() {
        let t0 = "2026-01-01T00:00:00Z".parse().unwrap();
        let t1 = "2026-01-02T00:00:00Z".parse().unwrap();
        let stories = vec![
            StoryRow {
                id: "late".into(),
                title: "Late".into(),
                story_type: StoryType::Bug,
                points: None,
                in_sprint: true,
                created_at: Some(t1),
            },
            StoryRow {
                id: "early".into(),
                title: "Early".into(),
                story_type: StoryType::UserStory,
                points: Some(3.0),
                in_sprint: false,
                created_at: Some(t0),
            },
        ];
        let subs = vec![SubTaskRow {
            id: Some("t1".into()),
            story_id: "late".into(),
            title: "fix".into(),
            estimate: Some(2.0),
            category: TaskCategory::Test,
            completed: false,
        }];
        let members = vec![
            MemberRow::for_insert(&TeamMember::new("", "Zoe", RoleType::Dev)),
            MemberRow::for_insert(&TeamMember::new("", "Ana", RoleType::Dev)),
        ];
        let state = assemble_state(members, None, stories, subs);
        assert_eq!(state.members[0].name, "Ana");
        assert_eq!(state.stories[0].id, "early");
        assert_eq!(state.stories[1].sub_tasks.len(), 1);
        assert_eq!(state.settings, SprintSettings::default());
    }
}
