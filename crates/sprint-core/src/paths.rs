use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const SPRINT_DIR: &str = ".sprint";

pub const CONFIG_FILE: &str = ".sprint/config.yaml";
pub const SETTINGS_FILE: &str = ".sprint/settings.yaml";
pub const ROSTER_FILE: &str = ".sprint/roster.yaml";
pub const BACKLOG_FILE: &str = ".sprint/backlog.yaml";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn sprint_dir(root: &Path) -> PathBuf {
    root.join(SPRINT_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn roster_path(root: &Path) -> PathBuf {
    root.join(ROSTER_FILE)
}

pub fn backlog_path(root: &Path) -> PathBuf {
    root.join(BACKLOG_FILE)
}
