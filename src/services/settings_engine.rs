// Credvault Settings Engine
// Loads, saves, updates and resets the vault settings, kept as a JSON file.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::VaultSettings;

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<VaultSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &VaultSettings;
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

pub struct SettingsEngine {
    config_path: PathBuf,
    settings: VaultSettings,
}

impl SettingsEngine {
    /// Creates an engine for `path_override`, or for [`platform::settings_path`] when `None`.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        Self {
            config_path: path_override.unwrap_or_else(platform::settings_path),
            settings: VaultSettings::default(),
        }
    }

    /// Rejects values that deserialize but cannot be used.
    fn validate(settings: &VaultSettings) -> Result<(), SettingsError> {
        let ratio = settings.analysis.weak_threshold_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(SettingsError::InvalidValue(format!(
                "analysis.weak_threshold_ratio must be within 0..=1, got {}",
                ratio
            )));
        }
        if settings.analysis.key_timeout_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "analysis.key_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the config file. A missing file yields defaults; a malformed one
    /// is an error.
    fn load(&mut self) -> Result<VaultSettings, SettingsError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no settings file, using defaults");
            self.settings = VaultSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: VaultSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;
        Self::validate(&settings)?;

        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Writes the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;
        debug!(path = %self.config_path.display(), "settings saved");
        Ok(())
    }

    fn get_settings(&self) -> &VaultSettings {
        &self.settings
    }

    /// Updates one setting by dotted key (`"analysis.key_timeout_ms"`) and saves.
    ///
    /// The value is applied on the JSON form of the settings and deserialized back, so type
    /// mismatches are rejected without touching the current settings.
    fn set_value(&mut self, key: &str, value: serde_json::Value) -> Result<(), SettingsError> {
        let parts: Vec<&str> = key.split('.').collect();
        if key.is_empty() || parts.iter().any(|p| p.is_empty()) {
            return Err(SettingsError::InvalidKey(format!("Malformed key '{}'", key)));
        }

        let mut json_value = serde_json::to_value(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        let (last, parents) = parts
            .split_last()
            .ok_or_else(|| SettingsError::InvalidKey(format!("Malformed key '{}'", key)))?;
        let mut current = &mut json_value;
        for part in parents {
            current = current.get_mut(*part).ok_or_else(|| {
                SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))
            })?;
        }
        match current {
            serde_json::Value::Object(map) if map.contains_key(*last) => {
                map.insert(last.to_string(), value);
            }
            _ => {
                return Err(SettingsError::InvalidKey(format!(
                    "Key '{}' not found in settings",
                    key
                )))
            }
        }

        let new_settings: VaultSettings = serde_json::from_value(json_value).map_err(|e| {
            SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e))
        })?;
        Self::validate(&new_settings)?;

        self.settings = new_settings;
        self.save()?;
        info!(key, "setting updated");
        Ok(())
    }

    /// Restores factory defaults and saves them.
    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = VaultSettings::default();
        self.save()?;
        info!("settings reset to defaults");
        Ok(())
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
