//! Effect executor: drives a [`Pending`] mutation against a [`Remote`] and
//! settles the local state with the result.

use crate::error::{PlanError, Result};
use crate::remote::{Remote, RemoteOp};
use crate::store::{IdAssignment, MutationPhase, Mutation, Outcome, Pending, PlanningState};

pub struct Reconciler<R: Remote> {
    remote: R,
}

impl<R: Remote> Reconciler<R> {
    pub fn new(remote: R) -> Self {
        Self { remote }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn remote_mut(&mut self) -> &mut R {
        &mut self.remote
    }

    /// Apply `mutation` locally, issue its operations, and confirm or roll
    /// back. A rejected operation is returned as the error after the state
    /// has been restored.
    pub fn dispatch(&mut self, state: &mut PlanningState, mutation: Mutation) -> Result<()> {
        let pending = state.apply(mutation)?;
        let label = pending.label;
        let outcome = self.execute(&pending);
        let failure = match &outcome {
            Outcome::Rollback { op, message } => Some(PlanError::remote(op.clone(), message.clone())),
            Outcome::Confirm(_) => None,
        };
        let settled = state.settle(pending, outcome);
        debug_assert_ne!(settled.phase, MutationPhase::Applied);
        match failure {
            Some(e) => Err(e),
            None => {
                tracing::debug!(mutation = label, "confirmed");
                Ok(())
            }
        }
    }

    /// Run each operation in order, stopping at the first failure. Earlier
    /// operations of the same mutation are not undone remotely.
    pub fn execute(&mut self, pending: &Pending) -> Outcome {
        let mut assigned = Vec::new();
        for op in &pending.ops {
            tracing::debug!(mutation = pending.label, op = %op.describe(), "executing");
            match self.remote.execute(op) {
                Ok(id) => {
                    if let (RemoteOp::Insert { table, temp_id: Some(temp), .. }, Some(id)) = (op, id) {
                        if *temp != id {
                            assigned.push(IdAssignment {
                                table: *table,
                                temp_id: temp.clone(),
                                id,
                            });
                        }
                    }
                }
                Err(e) => {
                    let message = match e {
                        PlanError::Remote { message, .. } => message,
                        other => other.to_string(),
                    };
                    return Outcome::Rollback {
                        op: op.describe(),
                        message,
                    };
                }
            }
        }
        Outcome::Confirm(assigned)
    }

    /// Replace local state with the remote's.
    pub fn refresh(&mut self, state: &mut PlanningState) -> Result<()> {
        *state = self.remote.fetch()?;
        tracing::info!(
            members = state.members.len(),
            stories = state.stories.len(),
            "refreshed from remote"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::member::{MemberPatch, TeamMember};
    use crate::remote::{MemoryRemote, Offline};
    use crate::rows::Table;
    use crate::story::{Story, SubTask, SubTaskPatch};
    use crate::types::{RoleType, StoryType, TaskCategory};
    use serde_json::json;

    #[test]
    fn offline_keeps_local_ids() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(Offline);
        r.dispatch(
            &mut state,
            Mutation::AddMember(TeamMember::new("", "Ana", RoleType::Dev)),
        )
        .unwrap();
        assert_eq!(state.members.len(), 1);
        assert_eq!(state.members[0].id.len(), 36);
    }

    #[test]
    fn insert_adopts_server_ids() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(MemoryRemote::new());
        r.dispatch(
            &mut state,
            Mutation::AddStory(Story::new("s1", "Login", StoryType::UserStory)),
        )
        .unwrap();
        r.dispatch(
            &mut state,
            Mutation::AddSubTask {
                story_id: "s1".into(),
                task: SubTask::new("", "", "api", TaskCategory::Implementation, 5.0),
            },
        )
        .unwrap();
        assert_eq!(state.stories[0].sub_tasks[0].id, "srv-1");

        r.dispatch(
            &mut state,
            Mutation::UpdateSubTask {
                story_id: "s1".into(),
                task_id: "srv-1".into(),
                patch: SubTaskPatch::estimate(8.0),
            },
        )
        .unwrap();
        let mut remote_view = PlanningState::default();
        r.refresh(&mut remote_view).unwrap();
        assert_eq!(remote_view.stories[0].dev_hours(), 8.0);
    }

    #[test]
    fn remote_rows_match_clamped_local_values() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(MemoryRemote::new());
        let mut ana = TeamMember::new("", "Ana", RoleType::Dev);
        ana.allocation = 40.0;
        r.dispatch(&mut state, Mutation::AddMember(ana)).unwrap();
        r.dispatch(
            &mut state,
            Mutation::AddStory(Story::new("s1", "Login", StoryType::UserStory)),
        )
        .unwrap();
        r.dispatch(
            &mut state,
            Mutation::AddSubTask {
                story_id: "s1".into(),
                task: SubTask::new("", "", "api", TaskCategory::Implementation, 5.0),
            },
        )
        .unwrap();

        let id = state.members[0].id.clone();
        r.dispatch(
            &mut state,
            Mutation::UpdateMember {
                id,
                patch: MemberPatch {
                    allocation: Some(150.0),
                    ..Default::default()
                },
            },
        )
        .unwrap();
        let task_id = state.stories[0].sub_tasks[0].id.clone();
        r.dispatch(
            &mut state,
            Mutation::UpdateSubTask {
                story_id: "s1".into(),
                task_id,
                patch: SubTaskPatch::estimate(-5.0),
            },
        )
        .unwrap();

        assert_eq!(state.members[0].allocation, 100.0);
        assert_eq!(r.remote().rows(Table::Members)[0]["allocation"], json!(100.0));
        assert_eq!(state.stories[0].sub_tasks[0].estimate, 0.0);
        assert_eq!(r.remote().rows(Table::SubTasks)[0]["estimate"], json!(0.0));

        let mut remote_view = PlanningState::default();
        r.refresh(&mut remote_view).unwrap();
        assert_eq!(remote_view, state);
    }

    #[test]
    fn failure_rolls_back_and_reports_op() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(MemoryRemote::new());
        r.dispatch(
            &mut state,
            Mutation::AddMember(TeamMember::new("", "Ana", RoleType::Dev)),
        )
        .unwrap();
        let before = state.clone();

        r.remote_mut().fail_on(Table::Members);
        let err = r
            .dispatch(
                &mut state,
                Mutation::AddMember(TeamMember::new("", "Bo", RoleType::QA)),
            )
            .unwrap_err();
        assert_eq!(state, before);
        assert!(matches!(err, PlanError::Remote { ref op, .. } if op == "insert daily_members"));
    }

    #[test]
    fn missing_entity_fails_without_remote_calls() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(MemoryRemote::new());
        assert!(r
            .dispatch(&mut state, Mutation::RemoveStory { id: "x".into() })
            .is_err());
        assert!(r.remote().log().is_empty());
    }

    #[test]
    fn remove_story_deletes_sub_tasks_first() {
        let mut state = PlanningState::default();
        let mut r = Reconciler::new(MemoryRemote::new());
        r.dispatch(
            &mut state,
            Mutation::AddStory(
                Story::new("s1", "Login", StoryType::UserStory).with_sub_task(
                    "api",
                    TaskCategory::Implementation,
                    2.0,
                ),
            ),
        )
        .unwrap();
        r.dispatch(&mut state, Mutation::RemoveStory { id: "s1".into() })
            .unwrap();
        assert!(state.stories.is_empty());
        assert!(r.remote().rows(Table::SubTasks).is_empty());
        let log = r.remote().log();
        assert_eq!(
            &log[log.len() - 2..],
            ["delete planning_subtasks", "delete planning_stories"]
        );
    }
}
