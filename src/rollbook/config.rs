use crate::error::{RecordsError, Result};
use crate::notify::DEFAULT_TOAST_DURATION_MS;
use crate::store::DEFAULT_RECORDS_KEY;
use crate::theme::DEFAULT_THEME_KEY;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILENAME: &str = "config.json";

/// Largest file `import` accepts: 5 MiB.
pub const DEFAULT_MAX_IMPORT_BYTES: u64 = 5 * 1024 * 1024;

/// Configuration for rollbook, stored in `<data dir>/config.json`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RollbookConfig {
    /// Storage key holding the record collection
    #[serde(default = "default_records_key")]
    pub records_key: String,

    /// Storage key holding the light/dark preference
    #[serde(default = "default_theme_key")]
    pub theme_key: String,

    /// Size limit for imported files, in bytes
    #[serde(default = "default_max_import_bytes")]
    pub max_import_bytes: u64,

    /// Where exports are written; the working directory when unset
    #[serde(default)]
    pub export_dir: Option<PathBuf>,

    /// How long a notification stays visible
    #[serde(default = "default_toast_duration")]
    pub toast_duration_ms: u64,
}

fn default_records_key() -> String {
    DEFAULT_RECORDS_KEY.to_string()
}

fn default_theme_key() -> String {
    DEFAULT_THEME_KEY.to_string()
}

fn default_max_import_bytes() -> u64 {
    DEFAULT_MAX_IMPORT_BYTES
}

fn default_toast_duration() -> u64 {
    DEFAULT_TOAST_DURATION_MS
}

impl Default for RollbookConfig {
    fn default() -> Self {
        Self {
            records_key: default_records_key(),
            theme_key: default_theme_key(),
            max_import_bytes: default_max_import_bytes(),
            export_dir: None,
            toast_duration_ms: default_toast_duration(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    ShowAll,
    ShowKey(String),
    Set(String, String),
}

pub const CONFIG_KEYS: [&str; 5] = [
    "records-key",
    "theme-key",
    "max-import-bytes",
    "export-dir",
    "toast-duration-ms",
];

impl RollbookConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(RecordsError::Io)?;
        let config: RollbookConfig =
            serde_json::from_str(&content).map_err(RecordsError::Serialization)?;
        Ok(config)
    }

    /// Save config to the given directory
    pub fn save<P: AsRef<Path>>(&self, config_dir: P) -> Result<()> {
        let config_dir = config_dir.as_ref();

        if !config_dir.exists() {
            fs::create_dir_all(config_dir).map_err(RecordsError::Io)?;
        }

        let config_path = config_dir.join(CONFIG_FILENAME);
        let content = serde_json::to_string_pretty(self).map_err(RecordsError::Serialization)?;
        fs::write(config_path, content).map_err(RecordsError::Io)?;
        Ok(())
    }

    /// Current value of a dash-cased key, as shown by `rollbook config`.
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "records-key" => self.records_key.clone(),
            "theme-key" => self.theme_key.clone(),
            "max-import-bytes" => self.max_import_bytes.to_string(),
            "export-dir" => self
                .export_dir
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            "toast-duration-ms" => self.toast_duration_ms.to_string(),
            other => return Err(RecordsError::Config(format!("Unknown config key: {}", other))),
        };
        Ok(value)
    }

    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let number = |v: &str| {
            v.trim()
                .parse::<u64>()
                .map_err(|_| RecordsError::Config(format!("{} expects a number, got {:?}", key, v)))
        };
        match key {
            "records-key" => self.records_key = non_empty(key, value)?,
            "theme-key" => self.theme_key = non_empty(key, value)?,
            "max-import-bytes" => self.max_import_bytes = number(value)?,
            "export-dir" => {
                self.export_dir = if value.trim().is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                }
            }
            "toast-duration-ms" => self.toast_duration_ms = number(value)?,
            other => return Err(RecordsError::Config(format!("Unknown config key: {}", other))),
        }
        Ok(())
    }
}

fn non_empty(key: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(RecordsError::Config(format!("{} cannot be empty", key)));
    }
    Ok(trimmed.to_string())
}
