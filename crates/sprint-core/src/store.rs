//! In-memory planning state and its optimistic reducer.
//!
//! A mutation moves through `Applied -> {Confirmed | RolledBack}`.
//! [`PlanningState::apply`] performs the local change at once and returns a
//! [`Pending`] carrying the remote operations to issue plus the pre-mutation
//! snapshot. The effect executor (see `reconcile`) runs those operations and
//! feeds an [`Outcome`] back through [`PlanningState::settle`], which either
//! adopts server-assigned ids or restores the snapshot.
//!
//! Concurrent mutations of the same entity are last-write-wins.

use crate::error::{PlanError, Result};
use crate::member::{MemberPatch, TeamMember};
use crate::remote::{Filter, RemoteOp};
use crate::rows::{MemberRow, StoryRow, SubTaskRow, Table, SETTINGS_ROW_ID};
use crate::settings::{SettingsPatch, SprintSettings};
use crate::story::{Story, StoryPatch, SubTask, SubTaskPatch};
use serde::{Deserialize, Serialize};
use serde_json::json;

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlanningState {
    pub members: Vec<TeamMember>,
    pub stories: Vec<Story>,
    pub settings: SprintSettings,
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Every mutating action the planner supports. Entities passed with an empty
/// id receive a temporary local id on apply.
#[derive(Debug, Clone, PartialEq)]
pub enum Mutation {
    AddMember(TeamMember),
    UpdateMember { id: String, patch: MemberPatch },
    RemoveMember { id: String },

    AddStory(Story),
    UpdateStory { id: String, patch: StoryPatch },
    RemoveStory { id: String },
    CloneStory { id: String },
    /// Bulk import. A story whose id already exists only has its title and
    /// type updated; any other story is inserted outside the sprint.
    ImportStories(Vec<Story>),
    /// Remove every story that is not in the sprint.
    ClearBacklog,

    AddSubTask { story_id: String, task: SubTask },
    UpdateSubTask {
        story_id: String,
        task_id: String,
        patch: SubTaskPatch,
    },
    RemoveSubTask { story_id: String, task_id: String },
    CloneSubTask { story_id: String, task_id: String },

    AddToSprint { story_id: String },
    RemoveFromSprint { story_id: String },
    /// Move every story out of the sprint.
    ClearSprintBucket,

    UpdateSettings(SettingsPatch),
}

impl Mutation {
    pub fn label(&self) -> &'static str {
        match self {
            Mutation::AddMember(_) => "add member",
            Mutation::UpdateMember { .. } => "update member",
            Mutation::RemoveMember { .. } => "remove member",
            Mutation::AddStory(_) => "add story",
            Mutation::UpdateStory { .. } => "update story",
            Mutation::RemoveStory { .. } => "remove story",
            Mutation::CloneStory { .. } => "clone story",
            Mutation::ImportStories(_) => "import stories",
            Mutation::ClearBacklog => "clear backlog",
            Mutation::AddSubTask { .. } => "add sub-task",
            Mutation::UpdateSubTask { .. } => "update sub-task",
            Mutation::RemoveSubTask { .. } => "remove sub-task",
            Mutation::CloneSubTask { .. } => "clone sub-task",
            Mutation::AddToSprint { .. } => "add to sprint",
            Mutation::RemoveFromSprint { .. } => "remove from sprint",
            Mutation::ClearSprintBucket => "clear sprint",
            Mutation::UpdateSettings(_) => "update settings",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationPhase {
    Applied,
    Confirmed,
    RolledBack,
}

/// A mutation that has been applied locally and awaits the remote.
#[derive(Debug, Clone)]
pub struct Pending {
    pub label: &'static str,
    pub ops: Vec<RemoteOp>,
    pub phase: MutationPhase,
    snapshot: PlanningState,
}

/// Server id replacing a temporary local id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdAssignment {
    pub table: Table,
    pub temp_id: String,
    pub id: String,
}

/// Follow-up produced by the effect executor.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Confirm(Vec<IdAssignment>),
    Rollback { op: String, message: String },
}

pub fn temp_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn eq(column: &'static str, value: impl Into<serde_json::Value>) -> Filter {
    Filter::eq(column, value)
}

// ---------------------------------------------------------------------------
// Reducer
// ---------------------------------------------------------------------------

impl PlanningState {
    /// Apply `mutation` optimistically. On error the state is unchanged.
    pub fn apply(&mut self, mutation: Mutation) -> Result<Pending> {
        let label = mutation.label();
        let snapshot = self.clone();
        let ops = match self.transition(mutation) {
            Ok(ops) => ops,
            Err(e) => {
                *self = snapshot;
                return Err(e);
            }
        };
        tracing::debug!(mutation = label, ops = ops.len(), "applied optimistically");
        Ok(Pending {
            label,
            ops,
            phase: MutationPhase::Applied,
            snapshot,
        })
    }

    /// Resolve a pending mutation: adopt assigned ids, or restore the
    /// pre-mutation snapshot.
    pub fn settle(&mut self, mut pending: Pending, outcome: Outcome) -> Pending {
        match outcome {
            Outcome::Confirm(assigned) => {
                for a in &assigned {
                    self.adopt_id(a);
                }
                pending.phase = MutationPhase::Confirmed;
            }
            Outcome::Rollback { op, message } => {
                tracing::warn!(mutation = pending.label, %op, %message, "remote rejected mutation, rolling back");
                *self = pending.snapshot.clone();
                pending.phase = MutationPhase::RolledBack;
            }
        }
        pending
    }

    fn transition(&mut self, mutation: Mutation) -> Result<Vec<RemoteOp>> {
        let ops = match mutation {
            Mutation::AddMember(mut member) => {
                if member.id.is_empty() {
                    member.id = temp_id();
                }
                member.normalize();
                let op = RemoteOp::insert(
                    Table::Members,
                    serde_json::to_value(MemberRow::for_insert(&member))?,
                    &member.id,
                );
                self.members.push(member);
                vec![op]
            }
            Mutation::UpdateMember { id, patch } => {
                let member = self.member_mut(&id)?;
                patch.apply_to(member);
                if patch.is_empty() {
                    return Ok(Vec::new());
                }
                let sent = patch.resolved(member);
                vec![RemoteOp::Update {
                    table: Table::Members,
                    filter: eq("id", id),
                    patch: serde_json::to_value(&sent)?,
                }]
            }
            Mutation::RemoveMember { id } => {
                let before = self.members.len();
                self.members.retain(|m| m.id != id);
                if self.members.len() == before {
                    return Err(PlanError::MemberNotFound(id));
                }
                vec![RemoteOp::Delete {
                    table: Table::Members,
                    filter: eq("id", id),
                }]
            }

            Mutation::AddStory(mut story) => {
                if story.id.is_empty() {
                    story.id = temp_id();
                }
                story.normalize();
                for t in &mut story.sub_tasks {
                    if t.id.is_empty() {
                        t.id = temp_id();
                    }
                    t.story_id = story.id.clone();
                }
                let ops = story_insert_ops(&story)?;
                self.stories.push(story);
                ops
            }
            Mutation::UpdateStory { id, patch } => {
                let story = self.story_mut(&id)?;
                patch.apply_to(story);
                if patch == StoryPatch::default() {
                    return Ok(Vec::new());
                }
                let sent = patch.resolved(story);
                vec![RemoteOp::Update {
                    table: Table::Stories,
                    filter: eq("id", id),
                    patch: serde_json::to_value(&sent)?,
                }]
            }
            Mutation::RemoveStory { id } => {
                let before = self.stories.len();
                self.stories.retain(|s| s.id != id);
                if self.stories.len() == before {
                    return Err(PlanError::StoryNotFound(id));
                }
                vec![
                    RemoteOp::Delete {
                        table: Table::SubTasks,
                        filter: eq("story_id", id.clone()),
                    },
                    RemoteOp::Delete {
                        table: Table::Stories,
                        filter: eq("id", id),
                    },
                ]
            }
            Mutation::CloneStory { id } => {
                let source = self.story(&id)?;
                let new_id = temp_id();
                let mut copy = Story::new(
                    new_id.clone(),
                    format!("{} (Copy)", source.title),
                    source.story_type,
                );
                copy.points = source.points;
                copy.in_sprint = source.in_sprint;
                copy.sub_tasks = source
                    .sub_tasks
                    .iter()
                    .map(|t| SubTask {
                        id: temp_id(),
                        story_id: new_id.clone(),
                        ..t.clone()
                    })
                    .collect();
                let ops = story_insert_ops(&copy)?;
                self.stories.push(copy);
                ops
            }
            Mutation::ImportStories(stories) => {
                let mut ops = Vec::new();
                for mut story in stories {
                    let existing = if story.id.is_empty() {
                        None
                    } else {
                        self.stories.iter().position(|s| s.id == story.id)
                    };
                    match existing {
                        Some(i) => {
                            let current = &mut self.stories[i];
                            current.title = story.title;
                            current.story_type = story.story_type;
                            ops.push(RemoteOp::Update {
                                table: Table::Stories,
                                filter: eq("id", current.id.clone()),
                                patch: json!({
                                    "title": current.title,
                                    "type": current.story_type,
                                }),
                            });
                        }
                        None => {
                            if story.id.is_empty() {
                                story.id = temp_id();
                            }
                            story.in_sprint = false;
                            story.normalize();
                            for t in &mut story.sub_tasks {
                                if t.id.is_empty() {
                                    t.id = temp_id();
                                }
                                t.story_id = story.id.clone();
                            }
                            ops.extend(story_insert_ops(&story)?);
                            self.stories.push(story);
                        }
                    }
                }
                ops
            }
            Mutation::ClearBacklog => {
                let mut ops: Vec<RemoteOp> = self
                    .stories
                    .iter()
                    .filter(|s| !s.in_sprint)
                    .map(|s| RemoteOp::Delete {
                        table: Table::SubTasks,
                        filter: eq("story_id", s.id.clone()),
                    })
                    .collect();
                self.stories.retain(|s| s.in_sprint);
                ops.push(RemoteOp::Delete {
                    table: Table::Stories,
                    filter: eq("in_sprint", false),
                });
                ops
            }

            Mutation::AddSubTask { story_id, mut task } => {
                let story = self.story_mut(&story_id)?;
                if task.id.is_empty() {
                    task.id = temp_id();
                }
                task.story_id = story_id;
                task.estimate = crate::types::sanitize_hours(task.estimate);
                let op = RemoteOp::insert(
                    Table::SubTasks,
                    serde_json::to_value(SubTaskRow::from_sub_task(&task, false))?,
                    &task.id,
                );
                story.sub_tasks.push(task);
                vec![op]
            }
            Mutation::UpdateSubTask {
                story_id,
                task_id,
                patch,
            } => {
                let task = self.sub_task_mut(&story_id, &task_id)?;
                patch.apply_to(task);
                if patch == SubTaskPatch::default() {
                    return Ok(Vec::new());
                }
                let sent = patch.resolved(task);
                vec![RemoteOp::Update {
                    table: Table::SubTasks,
                    filter: eq("id", task_id),
                    patch: serde_json::to_value(&sent)?,
                }]
            }
            Mutation::RemoveSubTask { story_id, task_id } => {
                let story = self.story_mut(&story_id)?;
                let before = story.sub_tasks.len();
                story.sub_tasks.retain(|t| t.id != task_id);
                if story.sub_tasks.len() == before {
                    return Err(PlanError::SubTaskNotFound(task_id));
                }
                vec![RemoteOp::Delete {
                    table: Table::SubTasks,
                    filter: eq("id", task_id),
                }]
            }
            Mutation::CloneSubTask { story_id, task_id } => {
                let source = self.sub_task_mut(&story_id, &task_id)?.clone();
                let copy = SubTask {
                    id: temp_id(),
                    title: format!("{} (Copy)", source.title),
                    ..source
                };
                let op = RemoteOp::insert(
                    Table::SubTasks,
                    serde_json::to_value(SubTaskRow::from_sub_task(&copy, false))?,
                    &copy.id,
                );
                self.story_mut(&story_id)?.sub_tasks.push(copy);
                vec![op]
            }

            Mutation::AddToSprint { story_id } => self.set_in_sprint(story_id, true)?,
            Mutation::RemoveFromSprint { story_id } => self.set_in_sprint(story_id, false)?,
            Mutation::ClearSprintBucket => {
                for s in &mut self.stories {
                    s.in_sprint = false;
                }
                vec![RemoteOp::Update {
                    table: Table::Stories,
                    filter: eq("in_sprint", true),
                    patch: json!({ "in_sprint": false }),
                }]
            }

            Mutation::UpdateSettings(patch) => {
                patch.apply_to(&mut self.settings);
                if patch.is_empty() {
                    return Ok(Vec::new());
                }
                vec![RemoteOp::Update {
                    table: Table::Settings,
                    filter: eq("id", SETTINGS_ROW_ID),
                    patch: serde_json::to_value(patch.resolved(&self.settings))?,
                }]
            }
        };
        Ok(ops)
    }

    fn set_in_sprint(&mut self, story_id: String, in_sprint: bool) -> Result<Vec<RemoteOp>> {
        self.story_mut(&story_id)?.in_sprint = in_sprint;
        Ok(vec![RemoteOp::Update {
            table: Table::Stories,
            filter: eq("id", story_id),
            patch: json!({ "in_sprint": in_sprint }),
        }])
    }

    fn adopt_id(&mut self, a: &IdAssignment) {
        if a.temp_id == a.id {
            return;
        }
        match a.table {
            Table::Members => {
                for m in self.members.iter_mut().filter(|m| m.id == a.temp_id) {
                    m.id = a.id.clone();
                }
            }
            Table::Stories => {
                for s in self.stories.iter_mut().filter(|s| s.id == a.temp_id) {
                    s.id = a.id.clone();
                    for t in &mut s.sub_tasks {
                        t.story_id = a.id.clone();
                    }
                }
            }
            Table::SubTasks => {
                for t in self
                    .stories
                    .iter_mut()
                    .flat_map(|s| s.sub_tasks.iter_mut())
                    .filter(|t| t.id == a.temp_id)
                {
                    t.id = a.id.clone();
                }
            }
            Table::Settings => {}
        }
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    pub fn member(&self, id: &str) -> Result<&TeamMember> {
        self.members
            .iter()
            .find(|m| m.id == id)
            .ok_or_else(|| PlanError::MemberNotFound(id.to_string()))
    }

    fn member_mut(&mut self, id: &str) -> Result<&mut TeamMember> {
        self.members
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| PlanError::MemberNotFound(id.to_string()))
    }

    pub fn story(&self, id: &str) -> Result<&Story> {
        self.stories
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| PlanError::StoryNotFound(id.to_string()))
    }

    fn story_mut(&mut self, id: &str) -> Result<&mut Story> {
        self.stories
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| PlanError::StoryNotFound(id.to_string()))
    }

    fn sub_task_mut(&mut self, story_id: &str, task_id: &str) -> Result<&mut SubTask> {
        self.story_mut(story_id)?
            .sub_tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| PlanError::SubTaskNotFound(task_id.to_string()))
    }

    /// Full member id for an exact id or a unique prefix.
    pub fn resolve_member_id(&self, prefix: &str) -> Result<String> {
        resolve(self.members.iter().map(|m| m.id.as_str()), prefix)
            .map_err(|e| e.unwrap_or_else(|| PlanError::MemberNotFound(prefix.to_string())))
    }

    pub fn resolve_story_id(&self, prefix: &str) -> Result<String> {
        resolve(self.stories.iter().map(|s| s.id.as_str()), prefix)
            .map_err(|e| e.unwrap_or_else(|| PlanError::StoryNotFound(prefix.to_string())))
    }

    /// Resolve a sub-task id within a story.
    pub fn resolve_sub_task_id(&self, story_id: &str, prefix: &str) -> Result<String> {
        let story = self.story(story_id)?;
        resolve(story.sub_tasks.iter().map(|t| t.id.as_str()), prefix)
            .map_err(|e| e.unwrap_or_else(|| PlanError::SubTaskNotFound(prefix.to_string())))
    }
}

fn story_insert_ops(story: &Story) -> Result<Vec<RemoteOp>> {
    let mut ops = vec![RemoteOp::insert(
        Table::Stories,
        serde_json::to_value(StoryRow::from_story(story))?,
        &story.id,
    )];
    for t in &story.sub_tasks {
        ops.push(RemoteOp::insert(
            Table::SubTasks,
            serde_json::to_value(SubTaskRow::from_sub_task(t, false))?,
            &t.id,
        ));
    }
    Ok(ops)
}

/// `Err(None)` means no match; `Err(Some(_))` an ambiguous prefix.
fn resolve<'a>(
    ids: impl Iterator<Item = &'a str>,
    prefix: &str,
) -> std::result::Result<String, Option<PlanError>> {
    let mut matches = Vec::new();
    for id in ids {
        if id == prefix {
            return Ok(id.to_string());
        }
        if !prefix.is_empty() && id.starts_with(prefix) {
            matches.push(id);
        }
    }
    match matches.as_slice() {
        [] => Err(None),
        [one] => Ok(one.to_string()),
        many => Err(Some(PlanError::AmbiguousId {
            prefix: prefix.to_string(),
            matches: many.join(", "),
        })),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RoleType, StoryType, TaskCategory};

    fn state() -> PlanningState {
        let mut s = Story::new("s1", "Login", StoryType::UserStory)
            .with_sub_task("api", TaskCategory::Implementation, 5.0)
            .with_sub_task("e2e", TaskCategory::Test, 3.0);
        s.in_sprint = true;
        let parked = Story::new("s2", "Export", StoryType::Bug).with_sub_task(
            "csv",
            TaskCategory::Implementation,
            2.0,
        );
        PlanningState {
            members: vec![TeamMember::new("m1", "Ana", RoleType::Dev)],
            stories: vec![s, parked],
            settings: SprintSettings::default(),
        }
    }

    #[test]
    fn add_member_assigns_temp_id_and_insert_op() {
        let mut st = state();
        let p = st
            .apply(Mutation::AddMember(TeamMember::new("", "Bo", RoleType::QA)))
            .unwrap();
        assert_eq!(p.phase, MutationPhase::Applied);
        assert_eq!(st.members.len(), 2);
        let temp = st.members[1].id.clone();
        assert!(!temp.is_empty());
        assert!(matches!(&p.ops[0], RemoteOp::Insert { temp_id: Some(t), .. } if *t == temp));
    }

    #[test]
    fn confirm_adopts_server_id() {
        let mut st = state();
        let p = st
            .apply(Mutation::AddSubTask {
                story_id: "s1".into(),
                task: SubTask::new("", "", "docs", TaskCategory::Implementation, 1.0),
            })
            .unwrap();
        let temp = st.stories[0].sub_tasks[2].id.clone();
        let p = st.settle(
            p,
            Outcome::Confirm(vec![IdAssignment {
                table: Table::SubTasks,
                temp_id: temp,
                id: "srv-7".into(),
            }]),
        );
        assert_eq!(p.phase, MutationPhase::Confirmed);
        assert_eq!(st.stories[0].sub_tasks[2].id, "srv-7");
        assert_eq!(st.stories[0].sub_tasks[2].story_id, "s1");
    }

    #[test]
    fn rollback_restores_snapshot() {
        let mut st = state();
        let before = st.clone();
        let p = st.apply(Mutation::ClearBacklog).unwrap();
        assert_eq!(st.stories.len(), 1);
        let p = st.settle(
            p,
            Outcome::Rollback {
                op: "delete planning_stories".into(),
                message: "offline".into(),
            },
        );
        assert_eq!(p.phase, MutationPhase::RolledBack);
        assert_eq!(st, before);
    }

    #[test]
    fn unknown_entity_leaves_state_untouched() {
        let mut st = state();
        let before = st.clone();
        assert!(matches!(
            st.apply(Mutation::RemoveStory { id: "nope".into() }),
            Err(PlanError::StoryNotFound(_))
        ));
        assert!(st
            .apply(Mutation::RemoveSubTask {
                story_id: "s1".into(),
                task_id: "nope".into()
            })
            .is_err());
        assert_eq!(st, before);
    }

    #[test]
    fn sprint_toggle_and_clear() {
        let mut st = state();
        st.apply(Mutation::AddToSprint {
            story_id: "s2".into(),
        })
        .unwrap();
        assert!(st.stories.iter().all(|s| s.in_sprint));
        let p = st.apply(Mutation::ClearSprintBucket).unwrap();
        assert!(st.stories.iter().all(|s| !s.in_sprint));
        assert_eq!(p.ops.len(), 1);
    }

    #[test]
    fn clone_story_copies_sub_tasks_with_fresh_ids() {
        let mut st = state();
        let p = st.apply(Mutation::CloneStory { id: "s1".into() }).unwrap();
        let copy = st.stories.last().unwrap();
        assert_eq!(copy.title, "Login (Copy)");
        assert!(copy.in_sprint);
        assert_eq!(copy.sub_tasks.len(), 2);
        assert!(copy.sub_tasks.iter().all(|t| t.story_id == copy.id));
        assert_ne!(copy.sub_tasks[0].id, st.stories[0].sub_tasks[0].id);
        assert_eq!(p.ops.len(), 3);
    }

    #[test]
    fn clone_sub_task_appends_copy() {
        let mut st = state();
        st.apply(Mutation::CloneSubTask {
            story_id: "s1".into(),
            task_id: "s1-2".into(),
        })
        .unwrap();
        let tasks = &st.stories[0].sub_tasks;
        assert_eq!(tasks.len(), 3);
        assert_eq!(tasks[2].title, "e2e (Copy)");
        assert_eq!(tasks[2].category, TaskCategory::Test);
    }

    #[test]
    fn empty_patch_issues_no_ops() {
        let mut st = state();
        let p = st
            .apply(Mutation::UpdateMember {
                id: "m1".into(),
                patch: MemberPatch::default(),
            })
            .unwrap();
        assert!(p.ops.is_empty());
    }

    #[test]
    fn settings_patch_targets_singleton_row() {
        let mut st = state();
        let p = st
            .apply(Mutation::UpdateSettings(SettingsPatch {
                sprint_duration_days: Some(10.0),
                ..Default::default()
            }))
            .unwrap();
        assert_eq!(st.settings.sprint_duration_days, 10.0);
        match &p.ops[0] {
            RemoteOp::Update { table, filter, patch } => {
                assert_eq!(*table, Table::Settings);
                assert_eq!(filter.value, json!(1));
                assert_eq!(patch, &json!({ "sprint_duration_days": 10.0 }));
            }
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn import_updates_title_and_type_of_known_ids() {
        let mut st = state();
        let mut incoming = Story::new("s1", "Login v2", StoryType::Bug);
        incoming.in_sprint = false;
        incoming.points = Some(13.0);
        let p = st.apply(Mutation::ImportStories(vec![incoming])).unwrap();

        let s1 = st.story("s1").unwrap();
        assert_eq!(s1.title, "Login v2");
        assert_eq!(s1.story_type, StoryType::Bug);
        assert!(s1.in_sprint);
        assert_eq!(s1.points, None);
        assert_eq!(s1.sub_tasks.len(), 2);
        assert_eq!(st.stories.len(), 2);
        match &p.ops[..] {
            [RemoteOp::Update { table, filter, patch }] => {
                assert_eq!(*table, Table::Stories);
                assert_eq!(filter.value, json!("s1"));
                assert_eq!(patch, &json!({ "title": "Login v2", "type": "Bug" }));
            }
            other => panic!("unexpected ops {other:?}"),
        }
    }

    #[test]
    fn import_inserts_new_stories_outside_the_sprint() {
        let mut st = state();
        let mut fresh = Story::new("", "Search", StoryType::UserStory).with_sub_task(
            "index",
            TaskCategory::Implementation,
            -4.0,
        );
        fresh.in_sprint = true;
        fresh.sub_tasks[0].id.clear();
        let p = st.apply(Mutation::ImportStories(vec![fresh])).unwrap();

        assert_eq!(st.stories.len(), 3);
        let added = &st.stories[2];
        assert!(!added.id.is_empty());
        assert!(!added.in_sprint);
        assert_eq!(added.sub_tasks[0].story_id, added.id);
        assert!(!added.sub_tasks[0].id.is_empty());
        assert_eq!(added.sub_tasks[0].estimate, 0.0);
        assert_eq!(p.ops.len(), 2);
        assert!(matches!(&p.ops[0], RemoteOp::Insert { table: Table::Stories, row, .. } if row["in_sprint"] == json!(false)));
    }

    #[test]
    fn remote_patch_carries_clamped_values() {
        let mut st = state();
        let p = st
            .apply(Mutation::UpdateSubTask {
                story_id: "s1".into(),
                task_id: "s1-1".into(),
                patch: SubTaskPatch::estimate(f64::NAN),
            })
            .unwrap();
        match &p.ops[0] {
            RemoteOp::Update { patch, .. } => assert_eq!(patch, &json!({ "estimate": 0.0 })),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn prefix_resolution() {
        let mut st = state();
        st.stories[1].id = "s1b".into();
        assert_eq!(st.resolve_story_id("s1").unwrap(), "s1");
        assert!(matches!(
            st.resolve_story_id("s"),
            Err(PlanError::AmbiguousId { .. })
        ));
        assert!(matches!(
            st.resolve_story_id("zz"),
            Err(PlanError::StoryNotFound(_))
        ));
        assert_eq!(st.resolve_sub_task_id("s1", "s1-2").unwrap(), "s1-2");
    }
}
