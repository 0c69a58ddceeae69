// Credvault platform paths
// Where the settings file, the gate list, the database and the master key live by default.

use std::env;
use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Overrides the settings file location when set.
pub const CONFIG_ENV: &str = "CREDVAULT_CONFIG";

/// Returns the configuration directory for credvault.
///
/// - **Linux**: `$XDG_CONFIG_HOME/credvault` or `~/.config/credvault`
/// - **macOS**: `~/Library/Application Support/credvault`
/// - **Windows**: `%APPDATA%/credvault`
pub fn get_config_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_config_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_config_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_config_dir()
    }
}

/// Returns the data directory holding the vault database and master key.
///
/// - **Linux**: `$XDG_DATA_HOME/credvault` or `~/.local/share/credvault`
/// - **macOS**: `~/Library/Application Support/credvault/data`
/// - **Windows**: `%LOCALAPPDATA%/credvault`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
}

/// Path of the settings file: `$CREDVAULT_CONFIG` if set, else `settings.json` in the config dir.
pub fn settings_path() -> PathBuf {
    match env::var_os(CONFIG_ENV) {
        Some(path) if !path.is_empty() => PathBuf::from(path),
        _ => get_config_dir().join("settings.json"),
    }
}
