use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::platform;

/// Top-level vault settings container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct VaultSettings {
    pub storage: StorageSettings,
    pub gates: GateSettings,
    pub analysis: AnalysisSettings,
    pub logging: LoggingSettings,
}

/// Where the encrypted store and the master key live.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageSettings {
    pub database_path: String,
    pub key_path: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        let data_dir = platform::get_data_dir();
        Self {
            database_path: data_dir.join("vault.db").to_string_lossy().to_string(),
            key_path: data_dir.join("master.key").to_string_lossy().to_string(),
        }
    }
}

/// Where the quality gate settings are kept.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GateSettings {
    pub path: String,
}

impl Default for GateSettings {
    fn default() -> Self {
        Self {
            path: platform::get_config_dir()
                .join("quality_gates.csv")
                .to_string_lossy()
                .to_string(),
        }
    }
}

/// Password analysis tuning.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisSettings {
    /// Share of the enabled gates a password must exceed to not be weak.
    pub weak_threshold_ratio: f64,
    /// Upper bound for a single decryption, key store call included.
    pub key_timeout_ms: u64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            weak_threshold_ratio: 0.5,
            key_timeout_ms: 5_000,
        }
    }
}

impl AnalysisSettings {
    pub fn key_timeout(&self) -> Duration {
        Duration::from_millis(self.key_timeout_ms)
    }
}

/// Logging configuration, an `EnvFilter` directive string.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub filter: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            filter: "credvault=info,warn".to_string(),
        }
    }
}
