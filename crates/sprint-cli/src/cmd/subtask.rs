use crate::cmd::{load_state, mutate, story_id};
use crate::output::{hours, print_json, print_table, short_id};
use anyhow::Context;
use clap::Subcommand;
use sprint_core::poker::consensus;
use sprint_core::store::{Mutation, PlanningState};
use sprint_core::story::{SubTask, SubTaskPatch};
use sprint_core::types::{parse_hours, TaskCategory};
use std::path::Path;

#[derive(Subcommand)]
pub enum SubtaskSubcommand {
    /// Add a sub-task to a story
    Add {
        story: String,
        #[arg(required = true)]
        title: Vec<String>,
        /// implementation or test
        #[arg(long, default_value = "implementation")]
        category: String,
        /// Estimate in hours; anything that is not a number counts as 0
        #[arg(long, default_value = "0")]
        estimate: String,
    },
    /// List a story's sub-tasks
    List { story: String },
    /// Change sub-task fields
    Edit {
        story: String,
        task: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        estimate: Option<String>,
    },
    /// Set a sub-task's estimate in hours
    Estimate {
        story: String,
        task: String,
        hours: String,
    },
    /// Mark a sub-task as done
    Done {
        story: String,
        task: String,
        /// Mark as not done instead
        #[arg(long)]
        undo: bool,
    },
    /// Remove a sub-task
    Remove { story: String, task: String },
    /// Duplicate a sub-task within its story
    Clone { story: String, task: String },
    /// Estimate a sub-task by planning poker
    Poker {
        story: String,
        task: String,
        /// One vote in hours; repeat per voter
        #[arg(long = "vote", required = true)]
        votes: Vec<String>,
        /// Show the consensus without applying it
        #[arg(long)]
        dry_run: bool,
    },
}

pub fn run(root: &Path, subcmd: SubtaskSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        SubtaskSubcommand::Add {
            story,
            title,
            category,
            estimate,
        } => {
            let task = SubTask::new(
                "",
                "",
                title.join(" "),
                category.parse()?,
                parse_hours(&estimate),
            );
            add(root, &story, task, json)
        }
        SubtaskSubcommand::List { story } => list(root, &story, json),
        SubtaskSubcommand::Edit {
            story,
            task,
            title,
            category,
            estimate,
        } => {
            let patch = SubTaskPatch {
                title,
                category: category.map(|c| c.parse::<TaskCategory>()).transpose()?,
                estimate: estimate.as_deref().map(parse_hours),
                completed: None,
            };
            update(root, &story, &task, patch, json)
        }
        SubtaskSubcommand::Estimate { story, task, hours } => update(
            root,
            &story,
            &task,
            SubTaskPatch::estimate(parse_hours(&hours)),
            json,
        ),
        SubtaskSubcommand::Done { story, task, undo } => {
            let patch = SubTaskPatch {
                completed: Some(!undo),
                ..Default::default()
            };
            update(root, &story, &task, patch, json)
        }
        SubtaskSubcommand::Remove { story, task } => remove(root, &story, &task, json),
        SubtaskSubcommand::Clone { story, task } => clone(root, &story, &task, json),
        SubtaskSubcommand::Poker {
            story,
            task,
            votes,
            dry_run,
        } => poker(root, &story, &task, &votes, dry_run, json),
    }
}

/// Resolve `(story id, sub-task id)` from user-supplied prefixes.
fn resolve(state: &PlanningState, story: &str, task: &str) -> anyhow::Result<(String, String)> {
    let story_id = story_id(state, story)?;
    let task_id = state
        .resolve_sub_task_id(&story_id, task)
        .with_context(|| format!("sub-task '{task}' not found in story '{story}'"))?;
    Ok((story_id, task_id))
}

fn find<'a>(state: &'a PlanningState, story_id: &str, task_id: &str) -> anyhow::Result<&'a SubTask> {
    state
        .story(story_id)?
        .sub_task(task_id)
        .with_context(|| format!("sub-task '{task_id}' not found"))
}

fn add(root: &Path, story: &str, task: SubTask, json: bool) -> anyhow::Result<()> {
    let story_id = story_id(&load_state(root)?, story)?;
    let state = mutate(
        root,
        Mutation::AddSubTask {
            story_id: story_id.clone(),
            task,
        },
    )?;
    let Some(added) = state.story(&story_id)?.sub_tasks.last() else {
        anyhow::bail!("sub-task was not added");
    };

    if json {
        print_json(added)?;
    } else {
        println!(
            "Added sub-task [{}]: {} ({}, {})",
            short_id(&added.id),
            added.title,
            added.category,
            hours(added.estimate)
        );
    }
    Ok(())
}

fn list(root: &Path, story: &str, json: bool) -> anyhow::Result<()> {
    let state = load_state(root)?;
    let story = state.story(&story_id(&state, story)?)?;

    if json {
        return print_json(&story.sub_tasks);
    }

    println!("{} [{}]: {}", story.story_type, short_id(&story.id), story.title);
    if story.sub_tasks.is_empty() {
        println!("No sub-tasks.");
        return Ok(());
    }
    let rows = story
        .sub_tasks
        .iter()
        .map(|t| {
            vec![
                short_id(&t.id),
                t.title.clone(),
                t.category.to_string(),
                hours(t.estimate),
                if t.completed { "done" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "TITLE", "CATEGORY", "EST", "STATUS"], rows);
    Ok(())
}

fn update(
    root: &Path,
    story: &str,
    task: &str,
    patch: SubTaskPatch,
    json: bool,
) -> anyhow::Result<()> {
    let (story_id, task_id) = resolve(&load_state(root)?, story, task)?;
    let state = mutate(
        root,
        Mutation::UpdateSubTask {
            story_id: story_id.clone(),
            task_id: task_id.clone(),
            patch,
        },
    )?;
    let t = find(&state, &story_id, &task_id)?;

    if json {
        print_json(t)?;
    } else {
        let status = if t.completed { ", done" } else { "" };
        println!(
            "Updated sub-task [{}]: {} ({}{status})",
            short_id(&t.id),
            t.title,
            hours(t.estimate)
        );
    }
    Ok(())
}

fn remove(root: &Path, story: &str, task: &str, json: bool) -> anyhow::Result<()> {
    let (story_id, task_id) = resolve(&load_state(root)?, story, task)?;
    mutate(
        root,
        Mutation::RemoveSubTask {
            story_id,
            task_id: task_id.clone(),
        },
    )?;

    if json {
        print_json(&serde_json::json!({ "id": task_id, "removed": true }))?;
    } else {
        println!("Removed sub-task [{}]", short_id(&task_id));
    }
    Ok(())
}

fn clone(root: &Path, story: &str, task: &str, json: bool) -> anyhow::Result<()> {
    let (story_id, task_id) = resolve(&load_state(root)?, story, task)?;
    let state = mutate(
        root,
        Mutation::CloneSubTask {
            story_id: story_id.clone(),
            task_id,
        },
    )?;
    let Some(copy) = state.story(&story_id)?.sub_tasks.last() else {
        anyhow::bail!("sub-task was not cloned");
    };

    if json {
        print_json(copy)?;
    } else {
        println!("Cloned sub-task [{}]: {}", short_id(&copy.id), copy.title);
    }
    Ok(())
}

fn poker(
    root: &Path,
    story: &str,
    task: &str,
    votes: &[String],
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let (story_id, task_id) = resolve(&load_state(root)?, story, task)?;
    let result = consensus(votes);
    if result.votes_counted == 0 {
        anyhow::bail!("no numeric votes to average");
    }

    if !dry_run {
        mutate(
            root,
            Mutation::UpdateSubTask {
                story_id,
                task_id: task_id.clone(),
                patch: SubTaskPatch::estimate(result.estimate),
            },
        )?;
    }

    if json {
        print_json(&serde_json::json!({
            "id": task_id,
            "consensus": result,
            "applied": !dry_run,
        }))?;
    } else {
        println!(
            "{} votes, average {:.2}h: estimate {}",
            result.votes_counted,
            result.average,
            hours(result.estimate)
        );
        if dry_run {
            println!("(dry run, estimate not applied)");
        }
    }
    Ok(())
}
