// Shelfmark settings engine
// Loads, saves and edits AppSettings stored as settings.json in the config directory.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::AppSettings;

const SETTINGS_FILE: &str = "settings.json";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<AppSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &AppSettings;
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError>;
    fn reset(&mut self) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &Path;
}

/// JSON-file backed settings.
pub struct SettingsEngine {
    config_path: PathBuf,
    settings: AppSettings,
}

impl SettingsEngine {
    /// Uses `path_override` when given, else `settings.json` in the platform config dir.
    pub fn new(path_override: Option<PathBuf>) -> Self {
        let config_path =
            path_override.unwrap_or_else(|| platform::get_config_dir().join(SETTINGS_FILE));
        Self {
            config_path,
            settings: AppSettings::default(),
        }
    }
}

/// Walks `key` (dot separated) inside `root` and replaces the leaf.
/// Only keys that already exist can be set.
fn set_path(root: &mut Value, key: &str, value: Value) -> Result<(), SettingsError> {
    let (parents, leaf) = match key.rsplit_once('.') {
        Some((parents, leaf)) => (Some(parents), leaf),
        None => (None, key),
    };
    let mut node = root;
    for part in parents.into_iter().flat_map(|p| p.split('.')) {
        node = node
            .get_mut(part)
            .ok_or_else(|| SettingsError::InvalidKey(format!("Key '{}' not found in settings", key)))?;
    }
    match node {
        Value::Object(map) if map.contains_key(leaf) => {
            map.insert(leaf.to_string(), value);
            Ok(())
        }
        Value::Object(_) => Err(SettingsError::InvalidKey(format!("Key '{}' not found in settings", key))),
        _ => Err(SettingsError::InvalidKey(format!("Key '{}' does not name a section", key))),
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// A missing file yields defaults; a malformed one is an error.
    fn load(&mut self) -> Result<AppSettings, SettingsError> {
        if !self.config_path.exists() {
            debug!(path = %self.config_path.display(), "no settings file, using defaults");
            self.settings = AppSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(&self.config_path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;
        self.settings = serde_json::from_str(&content)
            .map_err(|e| SettingsError::SerializationError(format!("Failed to parse config file: {}", e)))?;
        Ok(self.settings.clone())
    }

    fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| SettingsError::IoError(format!("Failed to create config directory: {}", e)))?;
        }
        let json = serde_json::to_string_pretty(&self.settings)
            .map_err(|e| SettingsError::SerializationError(format!("Failed to serialize settings: {}", e)))?;
        fs::write(&self.config_path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))
    }

    fn get_settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Sets one value by dot key (`"view.page_size"`), validates the result and saves.
    fn set_value(&mut self, key: &str, value: Value) -> Result<(), SettingsError> {
        if key.trim().is_empty() {
            return Err(SettingsError::InvalidKey("Key cannot be empty".to_string()));
        }

        let mut json = serde_json::to_value(&self.settings)
            .map_err(|e| SettingsError::SerializationError(format!("Failed to serialize settings: {}", e)))?;
        set_path(&mut json, key, value)?;

        let updated: AppSettings = serde_json::from_value(json)
            .map_err(|e| SettingsError::InvalidValue(format!("Invalid value for key '{}': {}", key, e)))?;
        if updated.view.page_size == 0 {
            return Err(SettingsError::InvalidValue("view.page_size must be positive".to_string()));
        }

        self.settings = updated;
        info!(key, "setting changed");
        self.save()
    }

    fn reset(&mut self) -> Result<(), SettingsError> {
        self.settings = AppSettings::default();
        self.save()
    }

    fn get_config_path(&self) -> &Path {
        &self.config_path
    }
}
