use crate::paths::resolve_config_path;
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Mutex;
use tauri::AppHandle;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct Settings {
    /// User-selected base storage directory; empty means platform default.
    pub(crate) storage_dir: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            storage_dir: String::new(),
        }
    }
}

pub(crate) struct AppState {
    pub(crate) settings: Mutex<Settings>,
}

pub(crate) fn load_settings(app: &AppHandle) -> Settings {
    let path = resolve_config_path(app, "settings.json");
    match fs::read_to_string(path) {
        Ok(raw) => serde_json::from_str(&raw).unwrap_or_default(),
        Err(_) => Settings::default(),
    }
}

pub(crate) fn save_settings_file(app: &AppHandle, settings: &Settings) -> Result<(), String> {
    let path = resolve_config_path(app, "settings.json");
    let raw = serde_json::to_string_pretty(settings).map_err(|e| e.to_string())?;
    fs::write(path, raw).map_err(|e| e.to_string())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_default_is_empty_storage_dir() {
        assert_eq!(Settings::default().storage_dir, "");
    }

    #[test]
    fn settings_tolerate_missing_and_unknown_fields() {
        let parsed: Settings = serde_json::from_str("{}").unwrap();
        assert_eq!(parsed.storage_dir, "");

        let parsed: Settings =
            serde_json::from_str(r#"{"storage_dir":"/tmp/media","legacy_theme":"dark"}"#).unwrap();
        assert_eq!(parsed.storage_dir, "/tmp/media");
    }
}
