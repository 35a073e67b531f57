// src/infra/paths.rs — Config and data locations
//
// All paths respect the CHRONOS_HOME environment variable for isolation.
// When CHRONOS_HOME is set, config and data live under that directory.
// When unset, config uses ~/.chronos/ and data uses XDG_DATA_HOME/chronos.

use directories::{BaseDirs, ProjectDirs};
use std::path::PathBuf;

/// Returns the CHRONOS_HOME override, if set.
fn chronos_home() -> Option<PathBuf> {
    std::env::var_os("CHRONOS_HOME").map(PathBuf::from)
}

/// Home directory, falling back to the working directory on exotic systems.
pub fn dirs_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.home_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Configuration directory: $CHRONOS_HOME/ or ~/.chronos/
pub fn config_dir() -> PathBuf {
    if let Some(home) = chronos_home() {
        return home;
    }
    dirs_home().join(".chronos")
}

/// Data directory: $CHRONOS_HOME/data/ or ~/.local/share/chronos/
pub fn data_dir() -> PathBuf {
    if let Some(home) = chronos_home() {
        return home.join("data");
    }
    match ProjectDirs::from("", "", "chronos") {
        Some(dirs) => dirs.data_local_dir().to_path_buf(),
        None => config_dir().join("data"),
    }
}

/// Session database path
pub fn db_path() -> PathBuf {
    data_dir().join("chronos.db")
}

/// Config file path
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.toml")
}

/// Ensure the directories Chronos writes into exist
pub fn ensure_dirs() -> std::io::Result<()> {
    for dir in [config_dir(), data_dir()] {
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}
