use crate::cmd::load_state;
use crate::output::{hours, print_json, print_table, short_id};
use sprint_core::capacity::{
    member_capacity, sprint_load_by_role, team_capacity_by_role, utilization_percent,
};
use sprint_core::types::RoleType;
use std::path::Path;

pub fn run(root: &Path, json: bool) -> anyhow::Result<()> {
    let state = load_state(root)?;
    let buckets = team_capacity_by_role(&state.members, &state.settings);
    let load = sprint_load_by_role(&state.stories);

    let percent = |committed: f64, capacity: f64| {
        utilization_percent(committed, capacity)
            .map(|p| format!("{p}%"))
            .unwrap_or_else(|| "n/a".to_string())
    };

    if json {
        let members: Vec<_> = state
            .members
            .iter()
            .map(|m| {
                serde_json::json!({
                    "id": m.id,
                    "name": m.name,
                    "role_type": m.role_type,
                    "capacity": member_capacity(m, &state.settings),
                })
            })
            .collect();
        return print_json(&serde_json::json!({
            "members": members,
            "by_role": buckets,
            "load": load,
            "utilization": {
                "dev": utilization_percent(load.dev, buckets.dev),
                "qa": utilization_percent(load.qa, buckets.qa),
                "total": utilization_percent(load.total(), buckets.delivery()),
            },
        }));
    }

    let rows = state
        .members
        .iter()
        .map(|m| {
            let c = member_capacity(m, &state.settings);
            vec![
                short_id(&m.id),
                m.name.clone(),
                m.role_type.to_string(),
                hours(c.total_capacity),
                hours(c.rituals_deduction),
                hours(c.available_capacity),
            ]
        })
        .collect();
    print_table(
        &["ID", "NAME", "TYPE", "TOTAL", "RITUALS", "AVAILABLE"],
        rows,
    );
    println!();

    let committed = |role: RoleType| match role {
        RoleType::Dev => load.dev,
        RoleType::QA => load.qa,
        RoleType::Other => 0.0,
    };
    let rows = RoleType::all()
        .iter()
        .map(|&role| {
            let cap = buckets.get(role);
            let used = committed(role);
            let delivery = role != RoleType::Other;
            vec![
                role.to_string(),
                hours(cap),
                hours(used),
                if delivery { percent(used, cap) } else { "-".to_string() },
                if delivery && used > cap { "OVERLOADED" } else { "" }.to_string(),
            ]
        })
        .collect();
    print_table(&["POOL", "CAPACITY", "COMMITTED", "USED", ""], rows);
    Ok(())
}
