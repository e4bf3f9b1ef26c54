//! Manifest and lock snapshot loading
//!
//! Reads `package.json`/`package-lock.json` and `pyproject.toml`/`uv.lock`
//! from a directory. A missing lock snapshot is normal; a missing manifest is
//! reported as `None` so callers can decide whether that is a layout error.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::entities::{DependencyManifest, Ecosystem, LockSnapshot};
use crate::error::StagehandResult;

pub fn manifest_path(dir: &Path, ecosystem: Ecosystem) -> PathBuf {
    dir.join(ecosystem.manifest_file())
}

pub fn lock_path(dir: &Path, ecosystem: Ecosystem) -> PathBuf {
    dir.join(ecosystem.lock_file())
}

/// Load the manifest in `dir`, `None` if the file does not exist
pub fn load_manifest(dir: &Path, ecosystem: Ecosystem) -> StagehandResult<Option<DependencyManifest>> {
    let path = manifest_path(dir, ecosystem);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let manifest = match ecosystem {
        Ecosystem::Npm => DependencyManifest::from_package_json(&path, &content)?,
        Ecosystem::Python => DependencyManifest::from_pyproject(&path, &content)?,
    };
    Ok(Some(manifest))
}

/// Load the lock snapshot in `dir`, `None` if the file does not exist
pub fn load_lock(dir: &Path, ecosystem: Ecosystem) -> StagehandResult<Option<LockSnapshot>> {
    let path = lock_path(dir, ecosystem);
    if !path.is_file() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let lock = match ecosystem {
        Ecosystem::Npm => LockSnapshot::from_package_lock(&path, &content)?,
        Ecosystem::Python => LockSnapshot::from_uv_lock(&path, &content)?,
    };
    Ok(Some(lock))
}

/// Manifest plus lock, with the lock already verified against the manifest
#[derive(Debug, Clone)]
pub struct VerifiedDependencies {
    pub manifest: DependencyManifest,
    pub lock: Option<LockSnapshot>,
}

/// Load both files and fail if the lock is stale. Returns `None` without a manifest.
pub fn load_verified(dir: &Path, ecosystem: Ecosystem) -> StagehandResult<Option<VerifiedDependencies>> {
    let Some(manifest) = load_manifest(dir, ecosystem)? else {
        return Ok(None);
    };
    let lock = load_lock(dir, ecosystem)?;
    if let Some(lock) = &lock {
        lock.verify_against(&manifest)?;
    }
    Ok(Some(VerifiedDependencies { manifest, lock }))
}
