//! Per-user locations for RaidAssist files.

use std::path::PathBuf;

use directories::ProjectDirs;
use raidassist_domain::constants::{APP_NAME, SESSION_FILE_NAME};

/// Used when the platform reports no home directory.
const FALLBACK_DIR: &str = ".raidassist";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("net", APP_NAME, APP_NAME)
}

/// Per-user data directory, e.g. `~/.local/share/raidassist` on Linux.
#[must_use]
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(|| PathBuf::from(FALLBACK_DIR), |dirs| dirs.data_local_dir().to_path_buf())
}

/// Default location of the session file.
#[must_use]
pub fn default_session_path() -> PathBuf {
    data_dir().join(SESSION_FILE_NAME)
}

/// Directory the CLI writes `oauth.log` into.
#[must_use]
pub fn default_log_dir() -> PathBuf {
    project_dirs()
        .and_then(|dirs| dirs.state_dir().map(std::path::Path::to_path_buf))
        .unwrap_or_else(data_dir)
}

/// Per-user config directory probed for `raidassist.toml`.
pub(crate) fn config_dir() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().to_path_buf())
}
