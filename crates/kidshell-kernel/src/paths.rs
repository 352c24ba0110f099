//! Where kidshell keeps its files.
//!
//! | Purpose | Default | With `KIDSHELL_HOME=/k` |
//! |---------|---------|-------------------------|
//! | Config | `$XDG_CONFIG_HOME/kidshell` | `/k` |
//! | Data (session, history) | `$XDG_DATA_HOME/kidshell` | `/k` |
//! | Custom data files | `<config>/data`, then `./data` | `/k/data`, then `./data` |

use std::path::PathBuf;

use directories::BaseDirs;

/// Environment variable that puts every kidshell file under one root.
pub const HOME_ENV: &str = "KIDSHELL_HOME";

pub const SESSION_STATE_FILENAME: &str = "session_state.json";
pub const HISTORY_FILENAME: &str = "history.txt";
pub const CONFIG_FILENAME: &str = "config.toml";

/// Returns `$HOME` or falls back to `/tmp` if not set.
pub fn home_dir() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/tmp"))
}

pub fn xdg_data_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".local").join("share"))
}

pub fn xdg_config_home() -> PathBuf {
    BaseDirs::new()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| home_dir().join(".config"))
}

/// `KIDSHELL_HOME`, when set to something non-empty.
pub fn home_override() -> Option<PathBuf> {
    std::env::var_os(HOME_ENV)
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
}

pub fn config_dir() -> PathBuf {
    home_override().unwrap_or_else(|| xdg_config_home().join("kidshell"))
}

pub fn data_dir() -> PathBuf {
    home_override().unwrap_or_else(|| xdg_data_home().join("kidshell"))
}

pub fn config_path() -> PathBuf {
    config_dir().join(CONFIG_FILENAME)
}

pub fn session_state_path() -> PathBuf {
    data_dir().join(SESSION_STATE_FILENAME)
}

pub fn history_path() -> PathBuf {
    data_dir().join(HISTORY_FILENAME)
}

/// Custom-data directories searched when the config names none.
pub fn default_data_dirs() -> Vec<PathBuf> {
    vec![config_dir().join("data"), PathBuf::from("data")]
}
