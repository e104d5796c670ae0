// Media store — filesystem persistence for the two media collections.
//
// Layout:
//   <root>/snapshots/snapshot-2026-08-23T14-03-22-481Z.png
//   <root>/recordings/recording-2026-08-23T14-03-22-481Z.webm
//   <root>/recordings/recording-2026-08-23T14-03-22-481Z.json   ← sidecar
//
// Collection directories are created lazily on first write. Listing a
// collection whose directory was never created yields an empty vec; entries
// that cannot be hydrated are skipped with a warning instead of failing the
// whole listing. The recording sidecar holds the caller-supplied display name
// and duration so they survive restarts; when it is missing the duration
// falls back to a size-based estimate.

use crate::constants::{ID_ALLOC_RETRY_LIMIT, RECORDING_ESTIMATE_BYTES_PER_SECOND};
use crate::errors::AppError;
use crate::ids::MediaId;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::warn;

// ─────────────────────────────────────────────────────────────────────────────
// Media kinds and records
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Snapshot,
    Recording,
}

impl MediaKind {
    pub fn collection(self) -> &'static str {
        match self {
            MediaKind::Snapshot => "snapshots",
            MediaKind::Recording => "recordings",
        }
    }

    pub fn prefix(self) -> &'static str {
        match self {
            MediaKind::Snapshot => "snapshot",
            MediaKind::Recording => "recording",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Snapshot => "png",
            MediaKind::Recording => "webm",
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaKind::Snapshot => "image/png",
            MediaKind::Recording => "audio/webm",
        }
    }
}

/// Snapshot as handed to the UI. Field names are the IPC contract.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotRecord {
    pub id: MediaId,
    pub file_path: String,
    pub data_url: String,
    pub timestamp: String,
    pub name: String,
}

/// Recording as handed to the UI. `base64_audio` is only populated by List;
/// the save response omits it since the caller already holds the payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingRecord {
    pub id: MediaId,
    pub file_path: String,
    pub url: String,
    pub name: String,
    pub duration: f64,
    pub timestamp: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64_audio: Option<String>,
}

/// Sidecar written next to each recording so the caller-supplied display name
/// and duration survive restarts.
#[derive(Debug, Serialize, Deserialize)]
struct RecordingManifest {
    version: u8,
    id: String,
    name: Option<String>,
    duration: Option<f64>,
}

// ─────────────────────────────────────────────────────────────────────────────
// MediaStore
// ─────────────────────────────────────────────────────────────────────────────

/// Filesystem-backed store rooted at the resolved storage directory.
/// Constructed per request; holds no state beyond the root path.
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn collection_dir(&self, kind: MediaKind) -> PathBuf {
        self.root.join(kind.collection())
    }

    fn media_path(&self, kind: MediaKind, id: &MediaId) -> PathBuf {
        self.collection_dir(kind)
            .join(format!("{}-{}.{}", kind.prefix(), id, kind.extension()))
    }

    fn manifest_path(&self, id: &MediaId) -> PathBuf {
        self.collection_dir(MediaKind::Recording)
            .join(format!("{}-{}.json", MediaKind::Recording.prefix(), id))
    }

    /// Allocate a fresh id from the current time. Bumps the timestamp by 1 ms
    /// while the target filename is taken so back-to-back saves in the same
    /// millisecond still get distinct ids.
    fn allocate_id(&self, kind: MediaKind) -> Result<(MediaId, PathBuf), AppError> {
        let mut ts = Utc::now();
        for _ in 0..ID_ALLOC_RETRY_LIMIT {
            let id = MediaId::from_timestamp(ts);
            let path = self.media_path(kind, &id);
            if !path.exists() {
                return Ok((id, path));
            }
            ts = ts + Duration::milliseconds(1);
        }
        Err(AppError::Storage(format!(
            "could not allocate a free {} filename",
            kind.prefix()
        )))
    }

    /// Decode and persist a snapshot payload. Returns the new id and path.
    pub fn save_snapshot(&self, data_url: &str) -> Result<(MediaId, PathBuf), AppError> {
        let bytes = decode_base64_payload(data_url)?;
        let dir = self.collection_dir(MediaKind::Snapshot);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("cannot create {:?}: {}", dir, e)))?;

        let (id, path) = self.allocate_id(MediaKind::Snapshot)?;
        fs::write(&path, &bytes)
            .map_err(|e| AppError::Storage(format!("cannot write {:?}: {}", path, e)))?;
        Ok((id, path))
    }

    /// Decode and persist a recording payload plus its sidecar manifest.
    /// Returns the hydrated record (without the audio payload).
    pub fn save_recording(
        &self,
        data_url: &str,
        name: Option<&str>,
        duration: Option<f64>,
    ) -> Result<RecordingRecord, AppError> {
        let bytes = decode_base64_payload(data_url)?;
        let dir = self.collection_dir(MediaKind::Recording);
        fs::create_dir_all(&dir)
            .map_err(|e| AppError::Storage(format!("cannot create {:?}: {}", dir, e)))?;

        let (id, path) = self.allocate_id(MediaKind::Recording)?;
        fs::write(&path, &bytes)
            .map_err(|e| AppError::Storage(format!("cannot write {:?}: {}", path, e)))?;

        let manifest = RecordingManifest {
            version: 1,
            id: id.to_string(),
            name: name.map(String::from),
            duration,
        };
        // Losing the manifest only loses display metadata, not media.
        match serde_json::to_string_pretty(&manifest) {
            Ok(json) => {
                if let Err(e) = fs::write(self.manifest_path(&id), json) {
                    warn!("Failed to write recording manifest for {}: {}", id, e);
                }
            }
            Err(e) => warn!("Failed to serialize recording manifest for {}: {}", id, e),
        }

        let duration = duration.unwrap_or_else(|| estimate_duration_s(bytes.len() as u64));
        let name = name
            .map(String::from)
            .unwrap_or_else(|| format!("Recording {}", id));
        Ok(RecordingRecord {
            timestamp: file_timestamp(&path),
            url: format!("file://{}", path.display()),
            file_path: path.display().to_string(),
            id,
            name,
            duration,
            base64_audio: None,
        })
    }

    /// List all snapshots, each hydrated with a freshly encoded data URL.
    /// A missing collection directory yields an empty vec.
    pub fn list_snapshots(&self) -> Result<Vec<SnapshotRecord>, AppError> {
        let mut records = Vec::new();
        for (id, path) in self.collection_entries(MediaKind::Snapshot)? {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping unreadable snapshot {:?}: {}", path, e);
                    continue;
                }
            };
            records.push(SnapshotRecord {
                file_path: path.display().to_string(),
                data_url: to_data_url(MediaKind::Snapshot, &bytes),
                timestamp: file_timestamp(&path),
                name: format!("Snapshot {}", id),
                id,
            });
        }
        Ok(records)
    }

    /// List all recordings. Sidecar metadata takes precedence over the
    /// size-based duration estimate and the default display name.
    pub fn list_recordings(&self) -> Result<Vec<RecordingRecord>, AppError> {
        let mut records = Vec::new();
        for (id, path) in self.collection_entries(MediaKind::Recording)? {
            let bytes = match fs::read(&path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!("Skipping unreadable recording {:?}: {}", path, e);
                    continue;
                }
            };
            let manifest = self.read_manifest(&id);
            let duration = manifest
                .as_ref()
                .and_then(|m| m.duration)
                .unwrap_or_else(|| estimate_duration_s(bytes.len() as u64));
            let name = manifest
                .and_then(|m| m.name)
                .unwrap_or_else(|| format!("Recording {}", id));
            records.push(RecordingRecord {
                file_path: path.display().to_string(),
                url: format!("file://{}", path.display()),
                timestamp: file_timestamp(&path),
                base64_audio: Some(to_data_url(MediaKind::Recording, &bytes)),
                id,
                name,
                duration,
            });
        }
        Ok(records)
    }

    /// Remove one media file. Missing file reports `NotFound`, matching the
    /// caller-facing "File not found" contract; a repeated delete is therefore
    /// idempotent from the caller's perspective.
    pub fn delete(&self, kind: MediaKind, id: &MediaId) -> Result<(), AppError> {
        let path = self.media_path(kind, id);
        match fs::remove_file(&path) {
            Ok(()) => {
                if kind == MediaKind::Recording {
                    let _ = fs::remove_file(self.manifest_path(id));
                }
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(AppError::NotFound("File not found".to_string()))
            }
            Err(e) => Err(AppError::Storage(format!("cannot delete {:?}: {}", path, e))),
        }
    }

    /// Enumerate `<prefix>-<id>.<ext>` files in a collection directory.
    /// Directory-enumeration order; no ordering guarantee. Foreign files are
    /// ignored, files whose stem fails id validation are skipped with a
    /// warning (they are unreachable through the façade anyway).
    fn collection_entries(&self, kind: MediaKind) -> Result<Vec<(MediaId, PathBuf)>, AppError> {
        let dir = self.collection_dir(kind);
        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(AppError::Storage(format!("cannot read {:?}: {}", dir, e)));
            }
        };

        let wanted_prefix = format!("{}-", kind.prefix());
        let mut found = Vec::new();
        for entry in entries.filter_map(|e| e.ok()) {
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(kind.extension()) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let Some(raw_id) = stem.strip_prefix(&wanted_prefix) else {
                continue;
            };
            match MediaId::parse(raw_id) {
                Ok(id) => found.push((id, path)),
                Err(e) => warn!("Skipping {:?}: {}", path, e),
            }
        }
        Ok(found)
    }

    fn read_manifest(&self, id: &MediaId) -> Option<RecordingManifest> {
        let path = self.manifest_path(id);
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str::<RecordingManifest>(&raw) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                warn!("Ignoring corrupt recording manifest for {}: {}", id, e);
                None
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Strict base64 decode of a browser data URL. Accepts either the full
/// `data:<mime>;base64,<body>` form or a bare base64 body.
fn decode_base64_payload(input: &str) -> Result<Vec<u8>, AppError> {
    let body = match input.split_once(";base64,") {
        Some((_, body)) => body,
        None => input,
    };
    let body = body.trim();
    if body.is_empty() {
        return Err(AppError::Payload("empty base64 payload".to_string()));
    }
    BASE64
        .decode(body)
        .map_err(|e| AppError::Payload(format!("invalid base64 payload: {}", e)))
}

fn to_data_url(kind: MediaKind, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", kind.mime(), BASE64.encode(bytes))
}

/// Duration heuristic for recordings without stored metadata. Linear in file
/// size, documented as an approximation rather than a real decode.
fn estimate_duration_s(size_bytes: u64) -> f64 {
    (size_bytes as f64 / RECORDING_ESTIMATE_BYTES_PER_SECOND as f64).round()
}

/// Creation timestamp from file metadata (not the filename, so renamed files
/// still list sensibly). Falls back to mtime where birth time is unsupported.
fn file_timestamp(path: &Path) -> String {
    fs::metadata(path)
        .ok()
        .and_then(|m| m.created().or_else(|_| m.modified()).ok())
        .map(|t| DateTime::<Utc>::from(t).to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn png_data_url(bytes: &[u8]) -> String {
        format!("data:image/png;base64,{}", BASE64.encode(bytes))
    }

    fn webm_data_url(bytes: &[u8]) -> String {
        format!("data:audio/webm;base64,{}", BASE64.encode(bytes))
    }

    #[test]
    fn snapshot_round_trip() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let payload = b"not really a png".to_vec();

        let (id, path) = store.save_snapshot(&png_data_url(&payload)).unwrap();
        assert!(path.to_string_lossy().ends_with(".png"));
        assert_eq!(fs::read(&path).unwrap(), payload);

        let listed = store.list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, id);
        assert_eq!(listed[0].name, format!("Snapshot {}", id));
        assert!(listed[0].data_url.starts_with("data:image/png;base64,"));

        let body = listed[0].data_url.split_once(";base64,").unwrap().1;
        assert_eq!(BASE64.decode(body).unwrap(), payload);
    }

    #[test]
    fn save_accepts_bare_base64() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let (_, path) = store.save_snapshot(&BASE64.encode(b"raw")).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"raw");
    }

    #[test]
    fn malformed_payload_is_rejected_without_touching_disk() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let err = store.save_snapshot("data:image/png;base64,@@@").unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));
        assert!(!dir.path().join("snapshots").exists());

        let err = store.save_snapshot("data:image/png;base64,").unwrap_err();
        assert!(matches!(err, AppError::Payload(_)));
    }

    #[test]
    fn list_on_missing_directory_is_empty() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path().join("never-created"));
        assert!(store.list_snapshots().unwrap().is_empty());
        assert!(store.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn back_to_back_saves_get_distinct_ids() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let data = png_data_url(b"frame");
        let (first, _) = store.save_snapshot(&data).unwrap();
        let (second, _) = store.save_snapshot(&data).unwrap();
        assert_ne!(first, second);
        assert_eq!(store.list_snapshots().unwrap().len(), 2);
    }

    #[test]
    fn delete_missing_reports_not_found() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let id = MediaId::parse("2026-08-23T14-03-22-481Z").unwrap();
        let err = store.delete(MediaKind::Snapshot, &id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(err.message(), "File not found");
    }

    #[test]
    fn delete_is_idempotent_from_the_callers_view() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let (id, _) = store.save_snapshot(&png_data_url(b"x")).unwrap();

        store.delete(MediaKind::Snapshot, &id).unwrap();
        let err = store.delete(MediaKind::Snapshot, &id).unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
        assert!(store.list_snapshots().unwrap().is_empty());
    }

    #[test]
    fn snapshot_capture_view_delete_scenario() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let (id, path) = store.save_snapshot("data:image/png;base64,AAAA").unwrap();
        assert!(path.to_string_lossy().ends_with(".png"));

        let listed = store.list_snapshots().unwrap();
        assert_eq!(listed.len(), 1);
        assert!(listed[0].data_url.starts_with("data:image/png;base64,"));

        store.delete(MediaKind::Snapshot, &id).unwrap();
        assert!(store.list_snapshots().unwrap().is_empty());
    }

    #[test]
    fn explicit_duration_beats_the_estimate() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        // 50 kB would estimate to 5 s; pass 12 s explicitly
        let payload = vec![0u8; 50_000];
        let record = store
            .save_recording(&webm_data_url(&payload), Some("Standup"), Some(12.0))
            .unwrap();
        assert_eq!(record.duration, 12.0);
        assert_eq!(record.name, "Standup");

        let listed = store.list_recordings().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].duration, 12.0);
        assert_eq!(listed[0].name, "Standup");
    }

    #[test]
    fn missing_sidecar_falls_back_to_estimate_and_default_name() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let recordings = dir.path().join("recordings");
        fs::create_dir_all(&recordings).unwrap();
        fs::write(
            recordings.join("recording-2026-08-23T14-03-22-481Z.webm"),
            vec![0u8; 50_000],
        )
        .unwrap();

        let listed = store.list_recordings().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].duration, 5.0);
        assert_eq!(listed[0].name, "Recording 2026-08-23T14-03-22-481Z");
        assert!(listed[0]
            .base64_audio
            .as_deref()
            .unwrap()
            .starts_with("data:audio/webm;base64,"));
    }

    #[test]
    fn deleting_a_recording_removes_the_sidecar() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let record = store
            .save_recording(&webm_data_url(b"clip"), Some("Note"), Some(3.0))
            .unwrap();

        let manifest = store.manifest_path(&record.id);
        assert!(manifest.exists());

        store.delete(MediaKind::Recording, &record.id).unwrap();
        assert!(!manifest.exists());
        assert!(store.list_recordings().unwrap().is_empty());
    }

    #[test]
    fn list_ignores_foreign_files() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let snapshots = dir.path().join("snapshots");
        fs::create_dir_all(&snapshots).unwrap();
        fs::write(snapshots.join("notes.txt"), b"not media").unwrap();
        fs::write(snapshots.join("photo.png"), b"no prefix").unwrap();
        fs::write(snapshots.join("snapshot-bad..id.png"), b"bad id").unwrap();

        assert!(store.list_snapshots().unwrap().is_empty());
    }

    #[test]
    fn recording_url_points_at_the_file() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        let record = store
            .save_recording(&webm_data_url(b"clip"), None, None)
            .unwrap();
        assert!(record.url.starts_with("file://"));
        assert!(record.url.ends_with(".webm"));
        assert_eq!(record.base64_audio, None);
    }

    #[test]
    fn list_timestamp_comes_from_file_metadata() {
        let dir = tempdir().unwrap();
        let store = MediaStore::new(dir.path());
        store.save_snapshot(&png_data_url(b"frame")).unwrap();
        let listed = store.list_snapshots().unwrap();
        // RFC 3339 with separators intact, unlike the dashed filename form
        assert!(listed[0].timestamp.contains(':'));
        assert!(listed[0].timestamp.ends_with('Z'));
    }
}
