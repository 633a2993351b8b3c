use crate::cmd::load_state;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use sprint_core::config::Config;
use sprint_core::migrate::{migrate_from_local, LocalSnapshot};
use sprint_core::reconcile::Reconciler;
use sprint_core::rest::RestRemote;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Upload the local plan (or a snapshot file) into the remote
    Push {
        /// JSON or YAML snapshot to upload instead of the workspace
        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
    /// Replace the local plan with the remote's
    Pull,
}

pub fn run(root: &Path, subcmd: SyncSubcommand, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let remote_cfg = config
        .remote
        .as_ref()
        .ok_or(sprint_core::PlanError::RemoteNotConfigured)?;
    let remote = RestRemote::from_config(remote_cfg).context("failed to connect to remote")?;

    match subcmd {
        SyncSubcommand::Push { snapshot } => push(root, remote, snapshot.as_deref(), json),
        SyncSubcommand::Pull => pull(root, remote, json),
    }
}

fn push(
    root: &Path,
    mut remote: RestRemote,
    snapshot: Option<&Path>,
    json: bool,
) -> anyhow::Result<()> {
    let snapshot = match snapshot {
        Some(path) => LocalSnapshot::load(path)
            .with_context(|| format!("failed to read snapshot {}", path.display()))?,
        None => LocalSnapshot::from_state(&load_state(root)?),
    };
    let (state, summary) =
        migrate_from_local(&mut remote, &snapshot).context("migration to remote failed")?;
    state.save(root).context("failed to save planning workspace")?;

    if json {
        print_json(&summary)?;
    } else {
        println!(
            "Pushed {} stories and {} sub-tasks; {} members added, {} already present",
            summary.stories_upserted,
            summary.sub_tasks_upserted,
            summary.members_added,
            summary.members_skipped
        );
    }
    Ok(())
}

fn pull(root: &Path, remote: RestRemote, json: bool) -> anyhow::Result<()> {
    let mut state = load_state(root)?;
    Reconciler::new(remote)
        .refresh(&mut state)
        .context("failed to fetch from remote")?;
    state.save(root).context("failed to save planning workspace")?;

    if json {
        print_json(&serde_json::json!({
            "members": state.members.len(),
            "stories": state.stories.len(),
        }))?;
    } else {
        println!(
            "Pulled {} members and {} stories",
            state.members.len(),
            state.stories.len()
        );
    }
    Ok(())
}
