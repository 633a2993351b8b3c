use crate::cmd::{load_state, member_id, mutate};
use crate::output::{hours, print_json, print_table, short_id};
use clap::Subcommand;
use sprint_core::capacity::member_capacity;
use sprint_core::member::{MemberPatch, TeamMember};
use sprint_core::store::Mutation;
use sprint_core::types::RoleType;
use std::path::Path;

#[derive(Subcommand)]
pub enum MemberSubcommand {
    /// Add a team member
    Add {
        #[arg(required = true)]
        name: Vec<String>,
        /// Capacity pool: dev, qa or other
        #[arg(long = "type", default_value = "dev")]
        role_type: String,
        /// Free-text role label (e.g. "Backend")
        #[arg(long, default_value = "")]
        role: String,
        /// Percentage of time on the sprint (0-100)
        #[arg(long)]
        allocation: Option<f64>,
        /// Planned absence in hours
        #[arg(long)]
        days_off: Option<f64>,
        /// Working hours per day
        #[arg(long)]
        daily_hours: Option<f64>,
    },
    /// List the roster with each member's available capacity
    List,
    /// Change member fields
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long = "type")]
        role_type: Option<String>,
        #[arg(long)]
        role: Option<String>,
        #[arg(long)]
        allocation: Option<f64>,
        #[arg(long)]
        days_off: Option<f64>,
        #[arg(long)]
        daily_hours: Option<f64>,
    },
    /// Remove a member from the roster
    Remove { id: String },
}

pub fn run(root: &Path, subcmd: MemberSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        MemberSubcommand::Add {
            name,
            role_type,
            role,
            allocation,
            days_off,
            daily_hours,
        } => {
            let mut member = TeamMember::new("", name.join(" "), role_type.parse()?);
            member.role = role;
            if let Some(a) = allocation {
                member.allocation = a;
            }
            if let Some(d) = days_off {
                member.days_off = d;
            }
            if let Some(h) = daily_hours {
                member.daily_hours = h;
            }
            add(root, member, json)
        }
        MemberSubcommand::List => list(root, json),
        MemberSubcommand::Update {
            id,
            name,
            role_type,
            role,
            allocation,
            days_off,
            daily_hours,
        } => {
            let patch = MemberPatch {
                name,
                role,
                role_type: role_type.map(|r| r.parse::<RoleType>()).transpose()?,
                allocation,
                days_off,
                daily_hours,
            };
            update(root, &id, patch, json)
        }
        MemberSubcommand::Remove { id } => remove(root, &id, json),
    }
}

fn add(root: &Path, member: TeamMember, json: bool) -> anyhow::Result<()> {
    let state = mutate(root, Mutation::AddMember(member))?;
    let Some(added) = state.members.last() else {
        anyhow::bail!("member was not added");
    };

    if json {
        print_json(added)?;
    } else {
        println!(
            "Added member [{}]: {} ({})",
            short_id(&added.id),
            added.name,
            added.role_type
        );
    }
    Ok(())
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = load_state(root)?;

    if json {
        let rows: Vec<_> = state
            .members
            .iter()
            .map(|m| {
                serde_json::json!({
                    "member": m,
                    "capacity": member_capacity(m, &state.settings),
                })
            })
            .collect();
        return print_json(&rows);
    }

    if state.members.is_empty() {
        println!("No team members. Add one with: sprint member add <name>");
        return Ok(());
    }
    let rows = state
        .members
        .iter()
        .map(|m| {
            let cap = member_capacity(m, &state.settings);
            vec![
                short_id(&m.id),
                m.name.clone(),
                m.role_type.to_string(),
                m.role.clone(),
                format!("{}%", m.allocation),
                hours(m.days_off),
                hours(cap.available_capacity),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "TYPE", "ROLE", "ALLOC", "OFF", "AVAILABLE"],
        rows,
    );
    Ok(())
}

fn update(root: &Path, prefix: &str, patch: MemberPatch, json: bool) -> anyhow::Result<()> {
    let id = member_id(&load_state(root)?, prefix)?;
    let state = mutate(
        root,
        Mutation::UpdateMember {
            id: id.clone(),
            patch,
        },
    )?;
    let member = state.member(&id)?;

    if json {
        print_json(member)?;
    } else {
        println!("Updated member [{}]: {}", short_id(&id), member.name);
    }
    Ok(())
}

fn remove(root: &Path, prefix: &str, json: bool) -> anyhow::Result<()> {
    let id = member_id(&load_state(root)?, prefix)?;
    mutate(root, Mutation::RemoveMember { id: id.clone() })?;

    if json {
        print_json(&serde_json::json!({ "id": id, "removed": true }))?;
    } else {
        println!("Removed member [{}]", short_id(&id));
    }
    Ok(())
}
