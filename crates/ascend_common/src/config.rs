//! Ascend Configuration (0.3.0)
//!
//! User configuration for storage location, remote sync and first-run
//! preferences.
//! Config file: $ASCEND_CONFIG or ~/.config/ascend/config.toml

use crate::i18n::{Language, Theme};
use crate::persistence::Preferences;
use crate::store::{LocalStore, DEFAULT_STORAGE_KEY};
use crate::sync::DEFAULT_DEBOUNCE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "ASCEND_CONFIG";

/// Where local data lives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding `<storage_key>.json`
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Versioned key; bump when the blob schema changes incompatibly
    #[serde(default = "default_storage_key")]
    pub storage_key: String,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ascend")
}

fn default_storage_key() -> String {
    DEFAULT_STORAGE_KEY.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            storage_key: default_storage_key(),
        }
    }
}

/// Remote sync settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default)]
    pub enabled: bool,

    /// Quiescence window before a remote write
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,

    /// Directory acting as the remote store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_dir: Option<PathBuf>,

    /// Signed-in user; absent means local only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

fn default_debounce_ms() -> u64 {
    DEFAULT_DEBOUNCE.as_millis() as u64
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            debounce_ms: default_debounce_ms(),
            remote_dir: None,
            user_id: None,
        }
    }
}

/// Preferences used when the save has none
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default)]
    pub language: Language,

    #[serde(default)]
    pub theme: Theme,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AscendConfig {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub sync: SyncConfig,

    #[serde(default)]
    pub defaults: DefaultsConfig,
}

impl AscendConfig {
    /// User config path: ~/.config/ascend/config.toml
    pub fn user_config_path() -> Result<PathBuf> {
        let dir = dirs::config_dir().context("Cannot determine config directory")?;
        Ok(dir.join("ascend").join("config.toml"))
    }

    /// Load configuration
    ///
    /// Priority:
    /// 1. $ASCEND_CONFIG
    /// 2. User config (~/.config/ascend/config.toml)
    /// 3. Defaults
    pub fn load() -> Result<Self> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            return Self::load_from(Path::new(&path));
        }

        if let Ok(user_path) = Self::user_config_path() {
            if user_path.exists() {
                return Self::load_from(&user_path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Save to $ASCEND_CONFIG, or the user config file
    pub fn save(&self) -> Result<()> {
        match std::env::var(CONFIG_ENV) {
            Ok(path) => self.save_to(Path::new(&path)),
            Err(_) => self.save_to(&Self::user_config_path()?),
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml_string).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }

    pub fn set_language(&mut self, value: &str) -> Result<()> {
        self.defaults.language = match Language::parse(value) {
            Some(lang) => lang,
            None => anyhow::bail!("Invalid language: '{}'. Valid values: en, es", value),
        };
        Ok(())
    }

    pub fn set_theme(&mut self, value: &str) -> Result<()> {
        self.defaults.theme = match Theme::parse(value) {
            Some(theme) => theme,
            None => anyhow::bail!("Invalid theme: '{}'. Valid values: light, dark", value),
        };
        Ok(())
    }

    pub fn preferences(&self) -> Preferences {
        Preferences {
            language: self.defaults.language,
            theme: self.defaults.theme,
        }
    }

    pub fn local_store(&self) -> LocalStore {
        LocalStore::new(&self.storage.data_dir, &self.storage.storage_key)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.sync.debounce_ms)
    }

    /// User id and remote directory, when sync is fully configured
    pub fn remote_target(&self) -> Option<(&str, &Path)> {
        if !self.sync.enabled {
            return None;
        }
        let user = self.sync.user_id.as_deref()?;
        let dir = self.sync.remote_dir.as_deref()?;
        Some((user, dir))
    }
}
