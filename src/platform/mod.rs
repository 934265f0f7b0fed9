// Shelfmark platform paths
// Config holds settings.json; data holds the local fallback database.
//
// `SHELFMARK_DATA_DIR` overrides both, which keeps test runs and portable
// installs out of the user's home directory.

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "shelfmark";

/// Environment variable that relocates all Shelfmark files.
pub const DATA_DIR_ENV: &str = "SHELFMARK_DATA_DIR";

fn override_dir() -> Option<PathBuf> {
    env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn home() -> PathBuf {
    env::var_os("HOME")
        .or_else(|| env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(env::temp_dir)
}

/// Directory holding `settings.json`.
///
/// - **Linux**: `$XDG_CONFIG_HOME/shelfmark` or `~/.config/shelfmark`
/// - **macOS**: `~/Library/Application Support/shelfmark`
/// - **Windows**: `%APPDATA%/shelfmark`
pub fn get_config_dir() -> PathBuf {
    if let Some(dir) = override_dir() {
        return dir;
    }
    if cfg!(target_os = "macos") {
        home().join("Library").join("Application Support").join(APP_DIR)
    } else if cfg!(target_os = "windows") {
        env::var_os("APPDATA")
            .map(PathBuf::from)
            .unwrap_or_else(home)
            .join(APP_DIR)
    } else {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home().join(".config"))
            .join(APP_DIR)
    }
}

/// Directory holding the local store database.
///
/// - **Linux**: `$XDG_DATA_HOME/shelfmark` or `~/.local/share/shelfmark`
/// - **macOS** and **Windows**: same as the config directory
pub fn get_data_dir() -> PathBuf {
    if let Some(dir) = override_dir() {
        return dir;
    }
    if cfg!(any(target_os = "macos", target_os = "windows")) {
        get_config_dir()
    } else {
        env::var_os("XDG_DATA_HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|| home().join(".local").join("share"))
            .join(APP_DIR)
    }
}
