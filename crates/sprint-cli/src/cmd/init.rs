use crate::output::print_json;
use anyhow::Context;
use sprint_core::workspace;
use std::path::Path;

pub fn run(root: &Path, team: &str, json: bool) -> anyhow::Result<()> {
    let report = workspace::init(root, team)
        .with_context(|| format!("failed to initialize workspace in {}", root.display()))?;

    if json {
        print_json(&serde_json::json!({
            "root": root.display().to_string(),
            "created": report.created,
        }))?;
    } else if report.already_initialized() {
        println!("Workspace already initialized at {}", root.display());
    } else {
        println!("Initialized sprint workspace at {}", root.display());
        for file in &report.created {
            println!("  created {file}");
        }
    }
    Ok(())
}
