use std::path::{Path, PathBuf};

/// Resolve the planning workspace root.
///
/// Priority:
/// 1. `--root` flag / `SPRINT_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.sprint/`
/// 3. Walk upward from `cwd` looking for `.git/`
/// 4. Fall back to `cwd`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_upward(&cwd, sprint_core::paths::SPRINT_DIR)
        .or_else(|| find_upward(&cwd, ".git"))
        .unwrap_or(cwd)
}

/// Nearest ancestor of `start` (inclusive) containing a `marker` directory.
fn find_upward(start: &Path, marker: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(marker).is_dir())
        .map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        assert_eq!(resolve_root(Some(dir.path())), dir.path());
    }

    #[test]
    fn finds_workspace_from_nested_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join(".sprint")).unwrap();
        let nested = dir.path().join("docs/notes");
        std::fs::create_dir_all(&nested).unwrap();
        assert_eq!(find_upward(&nested, ".sprint").unwrap(), dir.path());
        assert!(find_upward(&nested, ".no-such-marker").is_none());
    }
}
