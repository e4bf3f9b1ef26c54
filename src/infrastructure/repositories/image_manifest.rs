//! TOML Image Manifest Repository
//!
//! Persists the ready marker at `<image>/.stagehand/image.toml`. Its presence
//! means both assembly operations completed; paths inside are image-relative so
//! the image directory can be moved.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ImageManifest, InstalledSet};
use crate::domain::value_objects::{ContentHash, LayoutConvention, Port};
use crate::error::{StagehandError, StagehandResult};
use crate::infrastructure::fs::atomic_write;

/// Marker location relative to the image root
pub const MARKER_PATH: &str = ".stagehand/image.toml";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TomlImageManifest {
    version: u32,
    convention: LayoutConvention,
    entry_point: String,
    static_root: PathBuf,
    #[serde(default)]
    data_dirs: Vec<PathBuf>,
    frontend_digest: ContentHash,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    lock_digest: Option<ContentHash>,
    default_port: Port,
    assembled_at: DateTime<Utc>,
    #[serde(default)]
    installed: BTreeMap<String, String>,
}

pub fn marker_path(image: &Path) -> PathBuf {
    image.join(MARKER_PATH)
}

/// Read the marker; `None` when the image was never completed
pub fn load(image: &Path) -> StagehandResult<Option<ImageManifest>> {
    let path = marker_path(image);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let toml_manifest: TomlImageManifest =
        toml::from_str(&content).map_err(|e| StagehandError::ImageNotReady {
            image: image.to_path_buf(),
            reason: format!("unreadable {}: {}", MARKER_PATH, e),
        })?;
    if toml_manifest.version != FORMAT_VERSION {
        return Err(StagehandError::ImageNotReady {
            image: image.to_path_buf(),
            reason: format!(
                "marker format version {} is not supported (expected {})",
                toml_manifest.version, FORMAT_VERSION
            ),
        });
    }
    Ok(Some(from_toml(toml_manifest)))
}

/// Write the marker atomically
pub fn save(image: &Path, manifest: &ImageManifest) -> StagehandResult<()> {
    let content = toml::to_string_pretty(&to_toml(manifest)).map_err(|e| {
        StagehandError::Io(std::io::Error::other(format!(
            "failed to serialize image manifest: {}",
            e
        )))
    })?;
    atomic_write(&marker_path(image), content.as_bytes())
}

/// Delete the marker so a partially re-assembled image is never launchable
pub fn invalidate(image: &Path) -> StagehandResult<()> {
    match fs::remove_file(marker_path(image)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn to_toml(manifest: &ImageManifest) -> TomlImageManifest {
    TomlImageManifest {
        version: FORMAT_VERSION,
        convention: manifest.convention,
        entry_point: manifest.entry_point.clone(),
        static_root: manifest.static_root.clone(),
        data_dirs: manifest.data_dirs.clone(),
        frontend_digest: manifest.frontend_digest.clone(),
        lock_digest: manifest.lock_digest.clone(),
        default_port: manifest.default_port,
        assembled_at: manifest.assembled_at,
        installed: manifest.installed.as_map().clone(),
    }
}

fn from_toml(toml_manifest: TomlImageManifest) -> ImageManifest {
    ImageManifest {
        convention: toml_manifest.convention,
        entry_point: toml_manifest.entry_point,
        static_root: toml_manifest.static_root,
        data_dirs: toml_manifest.data_dirs,
        frontend_digest: toml_manifest.frontend_digest,
        installed: InstalledSet::new(toml_manifest.installed),
        lock_digest: toml_manifest.lock_digest,
        default_port: toml_manifest.default_port,
        assembled_at: toml_manifest.assembled_at,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample() -> ImageManifest {
        ImageManifest {
            convention: LayoutConvention::RootManifest,
            entry_point: "backend.main:app".to_string(),
            static_root: PathBuf::from("frontend/dist"),
            data_dirs: vec![PathBuf::from("data/conversations")],
            frontend_digest: ContentHash::from_bytes(b"index"),
            installed: InstalledSet::new(
                [("fastapi".to_string(), "0.115.6".to_string())].into(),
            ),
            lock_digest: None,
            default_port: Port::DEFAULT,
            assembled_at: Utc::now(),
        }
    }

    #[test]
    fn save_then_load_preserves_fields() {
        let dir = tempdir().unwrap();
        let manifest = sample();

        save(dir.path(), &manifest).unwrap();
        let loaded = load(dir.path()).unwrap().unwrap();

        assert_eq!(loaded.convention, manifest.convention);
        assert_eq!(loaded.entry_point, "backend.main:app");
        assert_eq!(loaded.installed.get("fastapi"), Some("0.115.6"));
        assert!(loaded.lock_digest.is_none());
    }

    #[test]
    fn load_without_marker_is_none() {
        let dir = tempdir().unwrap();
        assert!(load(dir.path()).unwrap().is_none());
    }

    #[test]
    fn invalidate_removes_marker() {
        let dir = tempdir().unwrap();
        save(dir.path(), &sample()).unwrap();
        invalidate(dir.path()).unwrap();
        assert!(!marker_path(dir.path()).exists());
        invalidate(dir.path()).unwrap();
    }

    #[test]
    fn unsupported_version_is_not_ready() {
        let dir = tempdir().unwrap();
        save(dir.path(), &sample()).unwrap();
        let path = marker_path(dir.path());
        let content = fs::read_to_string(&path)
            .unwrap()
            .replace("version = 1", "version = 99");
        fs::write(&path, content).unwrap();

        let err = load(dir.path()).unwrap_err();
        assert!(matches!(err, StagehandError::ImageNotReady { .. }));
    }
}
