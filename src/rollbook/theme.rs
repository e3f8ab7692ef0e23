use crate::error::{RecordsError, Result};
use crate::store::StorageBackend;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_THEME_KEY: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Self {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => f.write_str("light"),
            Theme::Dark => f.write_str("dark"),
        }
    }
}

impl FromStr for Theme {
    type Err = RecordsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            other => Err(RecordsError::Validation(format!("Unknown theme: {}", other))),
        }
    }
}

/// The persisted light/dark preference, kept under its own storage key.
pub struct ThemeSetting<B: StorageBackend> {
    backend: B,
    key: String,
}

impl<B: StorageBackend> ThemeSetting<B> {
    pub fn new(backend: B) -> Self {
        Self::with_key(backend, DEFAULT_THEME_KEY)
    }

    pub fn with_key(backend: B, key: &str) -> Self {
        Self {
            backend,
            key: key.to_string(),
        }
    }

    /// The stored theme, or the default when nothing usable is stored.
    pub fn current(&self) -> Theme {
        let raw = match self.backend.get_item(&self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Theme::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read theme preference");
                return Theme::default();
            }
        };
        serde_json::from_str::<Theme>(&raw).unwrap_or_else(|_| {
            warn!(value = %raw, "Ignoring unknown theme preference");
            Theme::default()
        })
    }

    pub fn set(&self, theme: Theme) -> Result<()> {
        let value = serde_json::to_string(&theme).map_err(RecordsError::Serialization)?;
        self.backend.set_item(&self.key, &value)
    }

    pub fn toggle(&self) -> Result<Theme> {
        let next = self.current().toggled();
        self.set(next)?;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::mem_backend::MemBackend;
    use std::rc::Rc;

    #[test]
    fn defaults_to_light() {
        let setting = ThemeSetting::new(MemBackend::new());
        assert_eq!(setting.current(), Theme::Light);
    }

    #[test]
    fn set_and_toggle_persist() {
        let backend = Rc::new(MemBackend::new());
        let setting = ThemeSetting::new(Rc::clone(&backend));

        setting.set(Theme::Dark).unwrap();
        assert_eq!(backend.get_item("theme").unwrap().as_deref(), Some("\"dark\""));
        assert_eq!(setting.current(), Theme::Dark);

        assert_eq!(setting.toggle().unwrap(), Theme::Light);
        assert_eq!(ThemeSetting::new(backend).current(), Theme::Light);
    }

    #[test]
    fn garbage_falls_back_to_default() {
        let backend = MemBackend::new();
        backend.put_raw("theme", "\"sepia\"");
        assert_eq!(ThemeSetting::new(backend).current(), Theme::Light);
    }

    #[test]
    fn parses_user_input() {
        assert_eq!("DARK".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("blue".parse::<Theme>().is_err());
    }
}
