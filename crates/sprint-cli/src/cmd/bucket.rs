use crate::cmd::{load_state, mutate, story_id};
use crate::output::{hours, print_json, print_table, short_id};
use clap::Subcommand;
use sprint_core::capacity::sprint_load_by_role;
use sprint_core::story::in_sprint;
use sprint_core::store::Mutation;
use std::path::Path;

#[derive(Subcommand)]
pub enum BucketSubcommand {
    /// Put a story into the sprint
    Add { id: String },
    /// Move a story back to the backlog
    Remove { id: String },
    /// Move every story back to the backlog
    Clear,
    /// Show the sprint's stories and committed hours per pool
    List,
}

pub fn run(root: &Path, subcmd: BucketSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        BucketSubcommand::Add { id } => toggle(root, &id, true, json),
        BucketSubcommand::Remove { id } => toggle(root, &id, false, json),
        BucketSubcommand::Clear => clear(root, json),
        BucketSubcommand::List => list(root, json),
    }
}

fn toggle(root: &Path, prefix: &str, into_sprint: bool, json: bool) -> anyhow::Result<()> {
    let story_id = story_id(&load_state(root)?, prefix)?;
    let mutation = if into_sprint {
        Mutation::AddToSprint {
            story_id: story_id.clone(),
        }
    } else {
        Mutation::RemoveFromSprint {
            story_id: story_id.clone(),
        }
    };
    let state = mutate(root, mutation)?;
    let load = sprint_load_by_role(&state.stories);

    if json {
        print_json(&serde_json::json!({
            "id": story_id,
            "in_sprint": into_sprint,
            "load": load,
        }))?;
    } else {
        let verb = if into_sprint { "Added" } else { "Removed" };
        let dir = if into_sprint { "to" } else { "from" };
        println!(
            "{verb} [{}] {dir} the sprint (committed: {} dev, {} qa)",
            short_id(&story_id),
            hours(load.dev),
            hours(load.qa)
        );
    }
    Ok(())
}

fn clear(root: &Path, json: bool) -> anyhow::Result<()> {
    let moved = in_sprint(&load_state(root)?.stories).count();
    mutate(root, Mutation::ClearSprintBucket)?;

    if json {
        print_json(&serde_json::json!({ "moved_to_backlog": moved }))?;
    } else {
        println!("Moved {moved} stories back to the backlog");
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = load_state(root)?;
    let load = sprint_load_by_role(&state.stories);
    let stories: Vec<_> = in_sprint(&state.stories).collect();

    if json {
        return print_json(&serde_json::json!({ "stories": stories, "load": load }));
    }

    if stories.is_empty() {
        println!("The sprint is empty. Add stories with: sprint bucket add <story>");
        return Ok(());
    }
    let rows = stories
        .iter()
        .map(|s| {
            vec![
                short_id(&s.id),
                s.title.clone(),
                hours(s.dev_hours()),
                hours(s.qa_hours()),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "DEV", "QA"], rows);
    println!();
    println!(
        "Committed: {} dev + {} qa = {}",
        hours(load.dev),
        hours(load.qa),
        hours(load.total())
    );
    Ok(())
}
