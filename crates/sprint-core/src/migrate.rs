//! One-shot upload of a locally held plan into the remote.

use crate::error::Result;
use crate::member::TeamMember;
use crate::remote::{Filter, Remote, RemoteOp};
use crate::rows::{MemberRow, StoryRow, SubTaskRow, Table, SETTINGS_ROW_ID};
use crate::settings::{SettingsPatch, SprintSettings};
use crate::store::PlanningState;
use crate::story::Story;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A plan exported from a local store. The sprint bucket may be given as a
/// separate id list, in which case it overrides each story's own flag.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocalSnapshot {
    #[serde(default)]
    pub members: Vec<TeamMember>,
    #[serde(default)]
    pub stories: Vec<Story>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings: Option<SprintSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sprint_bucket_story_ids: Option<Vec<String>>,
}

impl LocalSnapshot {
    pub fn from_state(state: &PlanningState) -> Self {
        Self {
            members: state.members.clone(),
            stories: state.stories.clone(),
            settings: Some(state.settings.clone()),
            sprint_bucket_story_ids: None,
        }
    }

    /// Read a snapshot file; `.json` is parsed as JSON, anything else as YAML.
    pub fn load(path: &Path) -> Result<Self> {
        crate::io::read_data_file(path)
    }

    fn in_sprint(&self, story: &Story) -> bool {
        match &self.sprint_bucket_story_ids {
            Some(ids) => ids.iter().any(|id| *id == story.id),
            None => story.in_sprint,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MigrationSummary {
    pub members_added: usize,
    pub members_skipped: usize,
    pub settings_updated: bool,
    pub stories_upserted: usize,
    pub sub_tasks_upserted: usize,
}

/// Push `snapshot` into `remote` and return the refreshed remote state.
///
/// Members are matched by name and never duplicated. Stories and sub-tasks
/// are upserted by id, so running the migration twice changes nothing. The
/// first failing operation aborts the pass.
pub fn migrate_from_local<R: Remote>(
    remote: &mut R,
    snapshot: &LocalSnapshot,
) -> Result<(PlanningState, MigrationSummary)> {
    let existing = remote.fetch()?;
    let mut summary = MigrationSummary::default();

    for member in &snapshot.members {
        if existing.members.iter().any(|m| m.name == member.name) {
            summary.members_skipped += 1;
            continue;
        }
        let mut m = member.clone();
        m.normalize();
        remote.execute(&RemoteOp::Insert {
            table: Table::Members,
            row: serde_json::to_value(MemberRow::for_insert(&m))?,
            temp_id: None,
        })?;
        summary.members_added += 1;
    }

    if let Some(settings) = &snapshot.settings {
        let mut settings = settings.clone();
        settings.normalize();
        remote.execute(&RemoteOp::Update {
            table: Table::Settings,
            filter: Filter::eq("id", SETTINGS_ROW_ID),
            patch: serde_json::to_value(SettingsPatch::full(&settings))?,
        })?;
        summary.settings_updated = true;
    }

    for story in &snapshot.stories {
        let mut story = story.clone();
        story.normalize();
        let mut row = StoryRow::from_story(&story);
        row.in_sprint = snapshot.in_sprint(&story);
        remote.execute(&RemoteOp::Upsert {
            table: Table::Stories,
            row: serde_json::to_value(row)?,
        })?;
        summary.stories_upserted += 1;

        for task in &story.sub_tasks {
            let mut row = SubTaskRow::from_sub_task(task, true);
            row.story_id = story.id.clone();
            remote.execute(&RemoteOp::Upsert {
                table: Table::SubTasks,
                row: serde_json::to_value(row)?,
            })?;
            summary.sub_tasks_upserted += 1;
        }
    }

    let state = remote.fetch()?;
    tracing::info!(
        members_added = summary.members_added,
        stories = summary.stories_upserted,
        sub_tasks = summary.sub_tasks_upserted,
        "migration complete"
    );
    Ok((state, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::MemoryRemote;
    use crate::types::{RoleType, StoryType, TaskCategory};
    use tempfile::TempDir;

    fn snapshot() -> LocalSnapshot {
        let s1 = Story::new("s1", "Login", StoryType::UserStory)
            .with_sub_task("api", TaskCategory::Implementation, 5.0)
            .with_sub_task("e2e", TaskCategory::Test, 2.0);
        let s2 = Story::new("s2", "Export", StoryType::Task);
        let mut settings = SprintSettings::default();
        settings.sprint_duration_days = 10.0;
        LocalSnapshot {
            members: vec![
                TeamMember::new("m1", "Ana", RoleType::Dev),
                TeamMember::new("m2", "Bo", RoleType::QA),
            ],
            stories: vec![s1, s2],
            settings: Some(settings),
            sprint_bucket_story_ids: Some(vec!["s2".into()]),
        }
    }

    #[test]
    fn migrates_everything_once() {
        let mut remote = MemoryRemote::new();
        let (state, summary) = migrate_from_local(&mut remote, &snapshot()).unwrap();
        assert_eq!(summary.members_added, 2);
        assert!(summary.settings_updated);
        assert_eq!(summary.sub_tasks_upserted, 2);
        assert_eq!(state.members.len(), 2);
        assert_eq!(state.settings.sprint_duration_days, 10.0);

        let s1 = state.stories.iter().find(|s| s.id == "s1").unwrap();
        let s2 = state.stories.iter().find(|s| s.id == "s2").unwrap();
        assert!(!s1.in_sprint);
        assert!(s2.in_sprint);
        assert_eq!(s1.sub_tasks.len(), 2);
    }

    #[test]
    fn second_run_is_a_no_op() {
        let snap = snapshot();
        let mut remote = MemoryRemote::new();
        let (first, _) = migrate_from_local(&mut remote, &snap).unwrap();
        let (second, summary) = migrate_from_local(&mut remote, &snap).unwrap();
        assert_eq!(summary.members_added, 0);
        assert_eq!(summary.members_skipped, 2);
        assert_eq!(first, second);
    }

    #[test]
    fn failure_stops_the_pass() {
        let mut remote = MemoryRemote::new();
        remote.fail_on(Table::Stories);
        assert!(migrate_from_local(&mut remote, &snapshot()).is_err());
        assert!(remote.rows(Table::SubTasks).is_empty());
    }

    #[test]
    fn loads_camel_case_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plan.json");
        std::fs::write(
            &path,
            r#"{"members":[],"stories":[{"id":"s1","title":"A","type":"Bug"}],"sprintBucketStoryIds":["s1"]}"#,
        )
        .unwrap();
        let snap = LocalSnapshot::load(&path).unwrap();
        assert!(snap.in_sprint(&snap.stories[0]));
        assert!(snap.settings.is_none());
    }
}
