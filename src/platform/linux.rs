// Config: $XDG_CONFIG_HOME/credvault, else ~/.config/credvault
// Data:   $XDG_DATA_HOME/credvault, else ~/.local/share/credvault

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "credvault";

fn xdg_dir(var: &str, fallback: &[&str]) -> PathBuf {
    resolve(env::var(var).ok(), env::var("HOME").ok(), fallback)
}

fn resolve(xdg: Option<String>, home: Option<String>, fallback: &[&str]) -> PathBuf {
    match xdg.filter(|v| !v.is_empty()) {
        Some(base) => PathBuf::from(base).join(APP_DIR),
        None => {
            let mut path = PathBuf::from(home.unwrap_or_else(|| String::from("/tmp")));
            path.extend(fallback);
            path.join(APP_DIR)
        }
    }
}

pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"])
}

pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}
