//! Config discovery for jlv.
//!
//! Walks parent directories to find `jlv.yaml`, then falls back to
//! `<config_dir>/jlv/config.yaml`. The closest file wins completely.

use std::path::{Path, PathBuf};

/// Project config filename to search for in parent directories.
pub const PROJECT_CONFIG_NAME: &str = "jlv.yaml";

/// Global config filename within the jlv config directory.
pub const GLOBAL_CONFIG_NAME: &str = "config.yaml";

fn is_file(path: &Path) -> bool {
    path.try_exists().unwrap_or(false) && path.is_file()
}

/// Find the config file to load.
///
/// An explicit path is returned as-is, even if missing, so that loading it
/// reports the error.
pub fn discover(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let cwd = std::env::current_dir().ok()?;
    let cwd = cwd.canonicalize().unwrap_or(cwd);
    discover_from(&cwd, dirs::config_dir().as_deref())
}

/// Discovery rooted at `start`, with `config_dir` as the global fallback.
pub fn discover_from(start: &Path, config_dir: Option<&Path>) -> Option<PathBuf> {
    for ancestor in start.ancestors() {
        let candidate = ancestor.join(PROJECT_CONFIG_NAME);
        if is_file(&candidate) {
            return Some(candidate);
        }
    }

    let global = config_dir?.join("jlv").join(GLOBAL_CONFIG_NAME);
    is_file(&global).then_some(global)
}
