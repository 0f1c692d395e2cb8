//! User preset library
//!
//! Named subtree snapshots stored as JSON bundles in a user directory, with
//! a `library_index.json` listing them:
//!
//! ```json
//! { "details": [ { "name": "...", "filename": "...", ... } ] }
//! ```

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::scene::SceneSnapshot;

/// Name of the index file inside the library directory
pub const LIBRARY_INDEX_FILE: &str = "library_index.json";

/// Library errors
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LibraryError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("JSON error: {0}")]
    Json(String),
    #[error("Preset not found: {0}")]
    PresetNotFound(String),
}

/// Result type for library operations
pub type LibraryResult<T> = Result<T, LibraryError>;

/// Preset category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetKind {
    #[default]
    Detail,
    Crown,
}

/// Index entry describing one stored preset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PresetInfo {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub filename: String,
    /// Seconds since the Unix epoch
    pub date_created: u64,
    pub object_count: usize,
    #[serde(default, rename = "detail_type")]
    pub kind: PresetKind,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LibraryIndex {
    #[serde(default)]
    details: Vec<PresetInfo>,
}

/// Replace anything outside `[A-Za-z0-9_-]` and add a unique suffix
fn preset_filename(name: &str, timestamp: u64) -> String {
    let clean: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}_{}.json", clean, timestamp, &suffix[..8])
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Directory of saved presets
#[derive(Debug, Clone)]
pub struct PresetLibrary {
    root: PathBuf,
}

impl PresetLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn index_path(&self) -> PathBuf {
        self.root.join(LIBRARY_INDEX_FILE)
    }

    /// Read the index; a missing or unreadable index starts empty
    fn load_index(&self) -> LibraryIndex {
        let path = self.index_path();
        let Ok(content) = std::fs::read_to_string(&path) else {
            return LibraryIndex::default();
        };
        match serde_json::from_str(&content) {
            Ok(index) => index,
            Err(e) => {
                warn!("Ignoring corrupt library index {}: {}", path.display(), e);
                LibraryIndex::default()
            }
        }
    }

    fn save_index(&self, index: &LibraryIndex) -> LibraryResult<()> {
        let content =
            serde_json::to_string_pretty(index).map_err(|e| LibraryError::Json(e.to_string()))?;
        std::fs::write(self.index_path(), content).map_err(|e| LibraryError::Io(e.to_string()))
    }

    /// Store a snapshot under `name` and add it to the index
    pub fn save_preset(
        &self,
        name: &str,
        description: &str,
        kind: PresetKind,
        snapshot: &SceneSnapshot,
    ) -> LibraryResult<PresetInfo> {
        std::fs::create_dir_all(&self.root).map_err(|e| LibraryError::Io(e.to_string()))?;

        let date_created = now_secs();
        let filename = preset_filename(name, date_created);
        let content =
            serde_json::to_string(snapshot).map_err(|e| LibraryError::Json(e.to_string()))?;
        std::fs::write(self.root.join(&filename), content)
            .map_err(|e| LibraryError::Io(e.to_string()))?;

        let info = PresetInfo {
            name: name.to_string(),
            description: description.to_string(),
            filename,
            date_created,
            object_count: snapshot.object_count(),
            kind,
        };
        let mut index = self.load_index();
        index.details.push(info.clone());
        self.save_index(&index)?;

        info!("Saved preset '{}' to {}", name, info.filename);
        Ok(info)
    }

    /// Presets whose bundle file still exists, optionally of one kind
    pub fn list(&self, kind: Option<PresetKind>) -> Vec<PresetInfo> {
        self.load_index()
            .details
            .into_iter()
            .filter(|d| self.root.join(&d.filename).exists())
            .filter(|d| kind.is_none_or(|k| d.kind == k))
            .collect()
    }

    pub fn get_info(&self, filename: &str) -> Option<PresetInfo> {
        self.load_index()
            .details
            .into_iter()
            .find(|d| d.filename == filename)
    }

    pub fn load_preset(&self, filename: &str) -> LibraryResult<SceneSnapshot> {
        let path = self.root.join(filename);
        if !path.exists() {
            return Err(LibraryError::PresetNotFound(filename.to_string()));
        }
        let content = std::fs::read_to_string(&path).map_err(|e| LibraryError::Io(e.to_string()))?;
        serde_json::from_str(&content).map_err(|e| LibraryError::Json(e.to_string()))
    }

    /// Remove the bundle and its index entry
    pub fn delete_preset(&self, filename: &str) -> LibraryResult<()> {
        let path = self.root.join(filename);
        if !path.exists() {
            return Err(LibraryError::PresetNotFound(filename.to_string()));
        }
        std::fs::remove_file(&path).map_err(|e| LibraryError::Io(e.to_string()))?;

        let mut index = self.load_index();
        index.details.retain(|d| d.filename != filename);
        self.save_index(&index)?;
        info!("Deleted preset {}", filename);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{ObjectTag, Scene};

    fn sample_snapshot() -> (Scene, SceneSnapshot) {
        let mut scene = Scene::new();
        let root = scene.create("Crown Profile", ObjectTag::Annotation);
        let line = scene.create("Line", ObjectTag::Annotation);
        scene.set_parent(line, Some(root), false).unwrap();
        let snapshot = scene.snapshot(root).unwrap();
        (scene, snapshot)
    }

    #[test]
    fn test_filename_is_sanitized() {
        let name = preset_filename("Base / Crown #2", 1_700_000_000);
        assert!(name.starts_with("Base___Crown__2_1700000000_"));
        assert!(name.ends_with(".json"));
    }

    #[test]
    fn test_save_list_load_delete() {
        let dir = tempfile::tempdir().unwrap();
        let library = PresetLibrary::new(dir.path().join("details"));
        let (_, snapshot) = sample_snapshot();

        let detail = library
            .save_preset("Sill", "Window sill", PresetKind::Detail, &snapshot)
            .unwrap();
        let crown = library
            .save_preset("Crown", "", PresetKind::Crown, &snapshot)
            .unwrap();
        assert_eq!(detail.object_count, 2);

        assert_eq!(library.list(None).len(), 2);
        assert_eq!(library.list(Some(PresetKind::Crown)), vec![crown.clone()]);
        assert_eq!(library.get_info(&detail.filename), Some(detail.clone()));

        let loaded = library.load_preset(&detail.filename).unwrap();
        assert_eq!(loaded, snapshot);

        let mut target = Scene::new();
        let root = target.instantiate(&loaded, None).unwrap();
        assert_eq!(target.descendants(root).len(), 1);

        library.delete_preset(&detail.filename).unwrap();
        assert_eq!(library.list(None), vec![crown]);
        assert_eq!(
            library.load_preset(&detail.filename),
            Err(LibraryError::PresetNotFound(detail.filename.clone()))
        );
    }

    #[test]
    fn test_list_skips_missing_bundles() {
        let dir = tempfile::tempdir().unwrap();
        let library = PresetLibrary::new(dir.path());
        let (_, snapshot) = sample_snapshot();
        let info = library
            .save_preset("Gone", "", PresetKind::Detail, &snapshot)
            .unwrap();
        std::fs::remove_file(dir.path().join(&info.filename)).unwrap();

        assert!(library.list(None).is_empty());
        // Still indexed, just not listed
        assert!(library.get_info(&info.filename).is_some());
    }

    #[test]
    fn test_index_format() {
        let dir = tempfile::tempdir().unwrap();
        let library = PresetLibrary::new(dir.path());
        let (_, snapshot) = sample_snapshot();
        library
            .save_preset("Crown", "", PresetKind::Crown, &snapshot)
            .unwrap();

        let raw = std::fs::read_to_string(dir.path().join(LIBRARY_INDEX_FILE)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["details"][0]["detail_type"], "crown");
        assert_eq!(value["details"][0]["name"], "Crown");
    }
}
