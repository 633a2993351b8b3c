pub mod bucket;
pub mod capacity;
pub mod config;
pub mod forecast;
pub mod init;
pub mod member;
pub mod report;
pub mod settings;
pub mod story;
pub mod subtask;
pub mod sync;

use anyhow::Context;
use sprint_core::config::Config;
use sprint_core::reconcile::Reconciler;
use sprint_core::remote::{Offline, Remote};
use sprint_core::rest::RestRemote;
use sprint_core::store::{Mutation, PlanningState};
use std::path::Path;

pub fn load_state(root: &Path) -> anyhow::Result<PlanningState> {
    PlanningState::load(root).context("failed to load planning workspace")
}

/// Apply one mutation through the configured remote and persist the result.
/// Nothing is written when the remote rejects the mutation.
pub fn mutate(root: &Path, mutation: Mutation) -> anyhow::Result<PlanningState> {
    let config = Config::load(root).context("failed to load config")?;
    let mut state = load_state(root)?;
    let label = mutation.label();

    let result = match &config.remote {
        Some(remote) => {
            let rest = RestRemote::from_config(remote).context("failed to connect to remote")?;
            dispatch(Reconciler::new(rest), &mut state, mutation)
        }
        None => dispatch(Reconciler::new(Offline), &mut state, mutation),
    };
    result.with_context(|| format!("{label} failed"))?;

    state.save(root).context("failed to save planning workspace")?;
    Ok(state)
}

fn dispatch<R: Remote>(
    mut reconciler: Reconciler<R>,
    state: &mut PlanningState,
    mutation: Mutation,
) -> sprint_core::Result<()> {
    reconciler.dispatch(state, mutation)
}

/// Fallible lookups with consistent context messages.
pub fn story_id(state: &PlanningState, prefix: &str) -> anyhow::Result<String> {
    state
        .resolve_story_id(prefix)
        .with_context(|| format!("story '{prefix}' not found"))
}

pub fn member_id(state: &PlanningState, prefix: &str) -> anyhow::Result<String> {
    state
        .resolve_member_id(prefix)
        .with_context(|| format!("member '{prefix}' not found"))
}
