use crate::cmd::{load_state, mutate, story_id};
use crate::output::{hours, print_json, print_table, short_id};
use anyhow::Context;
use clap::Subcommand;
use sprint_core::story::{summarize, Story, StoryPatch};
use sprint_core::store::Mutation;
use sprint_core::types::StoryType;
use std::path::{Path, PathBuf};

#[derive(Subcommand)]
pub enum StorySubcommand {
    /// Add a story to the backlog
    Add {
        #[arg(required = true)]
        title: Vec<String>,
        /// story, bug or task
        #[arg(long = "type", default_value = "story")]
        story_type: String,
        #[arg(long)]
        points: Option<f64>,
        /// Put the story straight into the sprint
        #[arg(long)]
        sprint: bool,
    },
    /// List stories in backlog order
    List {
        /// Only stories in the sprint
        #[arg(long, conflicts_with = "backlog")]
        sprint: bool,
        /// Only stories outside the sprint
        #[arg(long)]
        backlog: bool,
    },
    /// Change story fields
    Edit {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long = "type")]
        story_type: Option<String>,
        #[arg(long)]
        points: Option<f64>,
    },
    /// Remove a story and its sub-tasks
    Remove { id: String },
    /// Duplicate a story with all of its sub-tasks
    Clone { id: String },
    /// Remove every story that is not in the sprint
    ClearBacklog,
    /// Import stories from a YAML or JSON list; known ids get their title and
    /// type updated, the rest land in the backlog
    Import { file: PathBuf },
}

pub fn run(root: &Path, subcmd: StorySubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        StorySubcommand::Add {
            title,
            story_type,
            points,
            sprint,
        } => {
            let mut story = Story::new("", title.join(" "), story_type.parse()?);
            story.points = points;
            story.in_sprint = sprint;
            add(root, story, json)
        }
        StorySubcommand::List { sprint, backlog } => {
            let filter = match (sprint, backlog) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            list(root, filter, json)
        }
        StorySubcommand::Edit {
            id,
            title,
            story_type,
            points,
        } => {
            let patch = StoryPatch {
                title,
                story_type: story_type.map(|t| t.parse::<StoryType>()).transpose()?,
                points,
            };
            edit(root, &id, patch, json)
        }
        StorySubcommand::Remove { id } => remove(root, &id, json),
        StorySubcommand::Clone { id } => clone(root, &id, json),
        StorySubcommand::ClearBacklog => clear_backlog(root, json),
        StorySubcommand::Import { file } => import(root, &file, json),
    }
}

fn add(root: &Path, story: Story, json: bool) -> anyhow::Result<()> {
    let state = mutate(root, Mutation::AddStory(story))?;
    let Some(added) = state.stories.last() else {
        anyhow::bail!("story was not added");
    };

    if json {
        print_json(added)?;
    } else {
        println!(
            "Added {} [{}]: {}",
            added.story_type,
            short_id(&added.id),
            added.title
        );
    }
    Ok(())
}

/// `in_sprint`: `Some(flag)` keeps only stories whose flag matches.
fn list(root: &Path, in_sprint: Option<bool>, json: bool) -> anyhow::Result<()> {
    let state = load_state(root)?;
    let stories: Vec<&Story> = state
        .stories
        .iter()
        .filter(|s| in_sprint.map_or(true, |f| s.in_sprint == f))
        .collect();

    if json {
        return print_json(&stories);
    }

    if stories.is_empty() {
        println!("No stories.");
        return Ok(());
    }
    let rows = stories
        .iter()
        .map(|s| {
            vec![
                short_id(&s.id),
                s.story_type.to_string(),
                s.title.clone(),
                s.points.map(|p| p.to_string()).unwrap_or_else(|| "-".into()),
                hours(s.dev_hours()),
                hours(s.qa_hours()),
                if s.in_sprint { "yes" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(
        &["ID", "TYPE", "TITLE", "PTS", "DEV", "QA", "SPRINT"],
        rows,
    );
    println!();
    println!("{}", summarize(&state.stories));
    Ok(())
}

fn edit(root: &Path, prefix: &str, patch: StoryPatch, json: bool) -> anyhow::Result<()> {
    let id = story_id(&load_state(root)?, prefix)?;
    let state = mutate(
        root,
        Mutation::UpdateStory {
            id: id.clone(),
            patch,
        },
    )?;
    let story = state.story(&id)?;

    if json {
        print_json(story)?;
    } else {
        println!("Updated story [{}]: {}", short_id(&id), story.title);
    }
    Ok(())
}

fn remove(root: &Path, prefix: &str, json: bool) -> anyhow::Result<()> {
    let id = story_id(&load_state(root)?, prefix)?;
    mutate(root, Mutation::RemoveStory { id: id.clone() })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "removed": true }))?;
    } else {
        println!("Removed story [{}]", short_id(&id));
    }
    Ok(())
}

fn clone(root: &Path, prefix: &str, json: bool) -> anyhow::Result<()> {
    let id = story_id(&load_state(root)?, prefix)?;
    let state = mutate(root, Mutation::CloneStory { id })?;
    let Some(copy) = state.stories.last() else {
        anyhow::bail!("story was not cloned");
    };

    if json {
        print_json(copy)?;
    } else {
        println!(
            "Cloned story [{}]: {} ({} sub-tasks)",
            short_id(&copy.id),
            copy.title,
            copy.sub_tasks.len()
        );
    }
    Ok(())
}

fn clear_backlog(root: &Path, json: bool) -> anyhow::Result<()> {
    let before = load_state(root)?.stories.len();
    let state = mutate(root, Mutation::ClearBacklog)?;
    let removed = before.saturating_sub(state.stories.len());

    if json {
        print_json(&serde_json::json!({ "removed": removed }))?;
    } else {
        println!("Removed {removed} backlog stories");
    }
    Ok(())
}

fn import(root: &Path, file: &Path, json: bool) -> anyhow::Result<()> {
    let stories: Vec<Story> = sprint_core::io::read_data_file(file)
        .with_context(|| format!("failed to read stories from {}", file.display()))?;
    let before = load_state(root)?;
    let updated = stories
        .iter()
        .filter(|s| !s.id.is_empty() && before.stories.iter().any(|b| b.id == s.id))
        .count();
    let added = stories.len() - updated;
    mutate(root, Mutation::ImportStories(stories))?;

    if json {
        print_json(&serde_json::json!({ "added": added, "updated": updated }))?;
    } else {
        println!("Imported {added} new stories, updated {updated}");
    }
    Ok(())
}
