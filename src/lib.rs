// Memocap - privileged host process for the media-note UI
#![allow(clippy::needless_return)]

mod constants;
mod errors;
mod ids;
mod media;
mod paths;
mod state;

use errors::{AppError, ErrorEvent};
use ids::MediaId;
use media::{MediaKind, MediaStore, RecordingRecord, SnapshotRecord};
use serde::Serialize;
use state::{load_settings, save_settings_file, AppState, Settings};
use std::path::Path;
use std::sync::Mutex;
use tauri::{AppHandle, Emitter, Manager, State};
use tracing::{error, info};

// ─────────────────────────────────────────────────────────────────────────────
// Wire-level result shapes
//
// Untagged so the serialized JSON is exactly what the UI expects:
// `{ "success": true, "path": … }` / `{ "success": false, "error": … }`.
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum SaveSnapshotResult {
    Saved { success: bool, path: String },
    Failed { success: bool, error: String },
}

impl SaveSnapshotResult {
    fn saved(path: &Path) -> Self {
        SaveSnapshotResult::Saved {
            success: true,
            path: path.display().to_string(),
        }
    }

    fn failed(err: &AppError) -> Self {
        SaveSnapshotResult::Failed {
            success: false,
            error: err.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum SaveRecordingResult {
    Saved {
        success: bool,
        recording: RecordingRecord,
    },
    Failed {
        success: bool,
        error: String,
    },
}

impl SaveRecordingResult {
    fn saved(recording: RecordingRecord) -> Self {
        SaveRecordingResult::Saved {
            success: true,
            recording,
        }
    }

    fn failed(err: &AppError) -> Self {
        SaveRecordingResult::Failed {
            success: false,
            error: err.message().to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum DeleteResult {
    Deleted { success: bool },
    Failed { success: bool, error: String },
}

impl DeleteResult {
    fn deleted() -> Self {
        DeleteResult::Deleted { success: true }
    }

    fn failed(err: &AppError) -> Self {
        DeleteResult::Failed {
            success: false,
            error: err.message().to_string(),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Media façade commands
// ─────────────────────────────────────────────────────────────────────────────

/// Store handle for one request. The store itself is stateless; every call
/// re-resolves the root so a storage-dir change applies immediately.
fn store_for(app: &AppHandle) -> MediaStore {
    let settings = app.state::<AppState>().settings.lock().unwrap().clone();
    MediaStore::new(paths::resolve_storage_root(app, &settings))
}

#[tauri::command]
fn save_snapshot(app: AppHandle, data_url: String) -> SaveSnapshotResult {
    match store_for(&app).save_snapshot(&data_url) {
        Ok((id, path)) => {
            info!("Snapshot saved: {}", id);
            SaveSnapshotResult::saved(&path)
        }
        Err(err) => {
            emit_error(&app, err.clone(), Some("Save Snapshot"));
            SaveSnapshotResult::failed(&err)
        }
    }
}

#[tauri::command]
fn get_saved_snapshots(app: AppHandle) -> Result<Vec<SnapshotRecord>, String> {
    store_for(&app).list_snapshots().map_err(|err| {
        emit_error(&app, err.clone(), Some("Load Snapshots"));
        err.message().to_string()
    })
}

#[tauri::command]
fn delete_snapshot(app: AppHandle, id: String) -> DeleteResult {
    delete_media(&app, MediaKind::Snapshot, &id)
}

#[tauri::command]
fn save_recording(
    app: AppHandle,
    audio_data: String,
    name: Option<String>,
    duration: Option<f64>,
) -> SaveRecordingResult {
    match store_for(&app).save_recording(&audio_data, name.as_deref(), duration) {
        Ok(recording) => {
            info!("Recording saved: {}", recording.id);
            SaveRecordingResult::saved(recording)
        }
        Err(err) => {
            emit_error(&app, err.clone(), Some("Save Recording"));
            SaveRecordingResult::failed(&err)
        }
    }
}

#[tauri::command]
fn get_saved_recordings(app: AppHandle) -> Result<Vec<RecordingRecord>, String> {
    store_for(&app).list_recordings().map_err(|err| {
        emit_error(&app, err.clone(), Some("Load Recordings"));
        err.message().to_string()
    })
}

#[tauri::command]
fn delete_recording(app: AppHandle, id: String) -> DeleteResult {
    delete_media(&app, MediaKind::Recording, &id)
}

fn delete_media(app: &AppHandle, kind: MediaKind, raw_id: &str) -> DeleteResult {
    let store = store_for(app);
    match MediaId::parse(raw_id).and_then(|id| store.delete(kind, &id)) {
        Ok(()) => {
            info!("{} deleted: {}", kind.prefix(), raw_id);
            DeleteResult::deleted()
        }
        Err(err) => {
            // A stale id is routine UI staleness, not an error worth surfacing
            if !matches!(err, AppError::NotFound(_)) {
                emit_error(app, err.clone(), Some("Delete Media"));
            }
            DeleteResult::failed(&err)
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings commands
// ─────────────────────────────────────────────────────────────────────────────

#[tauri::command]
fn get_settings(state: State<'_, AppState>) -> Settings {
    state.settings.lock().unwrap().clone()
}

#[tauri::command]
fn save_settings(
    app: AppHandle,
    state: State<'_, AppState>,
    settings: Settings,
) -> Result<(), String> {
    {
        let mut current = state.settings.lock().unwrap();
        *current = settings.clone();
    }
    save_settings_file(&app, &settings)?;
    let _ = app.emit("settings-changed", settings);
    Ok(())
}

#[tauri::command]
fn pick_storage_dir() -> Option<String> {
    rfd::FileDialog::new()
        .pick_folder()
        .map(|path| path.to_string_lossy().to_string())
}

#[tauri::command]
fn get_storage_dir(app: AppHandle, state: State<'_, AppState>) -> Result<String, String> {
    let settings = state.settings.lock().unwrap().clone();
    let root = paths::resolve_storage_root(&app, &settings);
    std::fs::create_dir_all(&root).map_err(|e| format!("Failed to create storage dir: {}", e))?;
    Ok(root.to_string_lossy().to_string())
}

#[tauri::command]
fn open_storage_dir(app: AppHandle, state: State<'_, AppState>) -> Result<(), String> {
    let storage_dir = get_storage_dir(app, state)?;

    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(&storage_dir)
            .spawn()
            .map_err(|e| format!("Failed to open directory: {}", e))?;
    }

    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(&storage_dir)
            .spawn()
            .map_err(|e| format!("Failed to open directory: {}", e))?;
    }

    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(&storage_dir)
            .spawn()
            .map_err(|e| format!("Failed to open directory: {}", e))?;
    }

    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// App runtime
// ─────────────────────────────────────────────────────────────────────────────

fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Memocap starting up");
}

pub(crate) fn emit_error(app: &AppHandle, error: AppError, context: Option<&str>) {
    let event = if let Some(ctx) = context {
        ErrorEvent::new(error.clone()).with_context(ctx)
    } else {
        ErrorEvent::new(error.clone())
    };

    error!("{}: {}", error.title(), error.message());

    let _ = app.emit("app:error", event);
}

pub fn run() {
    init_logging();

    #[allow(unused_mut)]
    let mut builder = tauri::Builder::default();

    #[cfg(not(any(target_os = "android", target_os = "ios")))]
    {
        // Second launch focuses the existing main window instead of spawning
        builder = builder.plugin(tauri_plugin_single_instance::init(|app, _args, _cwd| {
            if let Some(window) = app.get_webview_window("main") {
                if window.is_minimized().unwrap_or(false) {
                    let _ = window.unminimize();
                }
                let _ = window.set_focus();
            }
        }));
    }

    builder
        .setup(|app| {
            let settings = load_settings(app.handle());
            app.manage(AppState {
                settings: Mutex::new(settings),
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            save_snapshot,
            get_saved_snapshots,
            delete_snapshot,
            save_recording,
            get_saved_recordings,
            delete_recording,
            get_settings,
            save_settings,
            pick_storage_dir,
            get_storage_dir,
            open_storage_dir,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
