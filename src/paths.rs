use crate::state::Settings;
use std::fs;
use std::path::PathBuf;
use tauri::{AppHandle, Manager};

pub(crate) fn resolve_config_path(app: &AppHandle, filename: &str) -> PathBuf {
    let base = app
        .path()
        .app_config_dir()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let _ = fs::create_dir_all(&base);
    base.join(filename)
}

/// Base directory the media collections live under.
/// Precedence: settings override, `MEMOCAP_STORAGE_DIR`, platform app data dir.
/// An override that cannot be created is ignored rather than failing the call.
pub(crate) fn resolve_storage_root(app: &AppHandle, settings: &Settings) -> PathBuf {
    let configured = settings.storage_dir.trim();
    if !configured.is_empty() {
        let path = PathBuf::from(configured);
        if fs::create_dir_all(&path).is_ok() {
            return path;
        }
    }

    if let Ok(dir) = std::env::var("MEMOCAP_STORAGE_DIR") {
        let trimmed = dir.trim();
        if !trimmed.is_empty() {
            let path = PathBuf::from(trimmed);
            if fs::create_dir_all(&path).is_ok() {
                return path;
            }
        }
    }

    let base = app
        .path()
        .app_data_dir()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));
    let _ = fs::create_dir_all(&base);
    base
}
