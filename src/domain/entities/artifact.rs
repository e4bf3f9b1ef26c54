//! Typed stage artifacts
//!
//! These are the edges of the stage graph. Their constructors are crate-private
//! so the only way to obtain a `BuildArtifact` or `RuntimeEnvironment` is to run
//! the stage that produces it, and the assembler cannot be called without both.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::domain::value_objects::{ContentHash, LayoutConvention, Port};

/// Static assets produced by the frontend builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    dir: PathBuf,
    files: Vec<PathBuf>,
    digest: ContentHash,
}

impl BuildArtifact {
    pub(crate) fn new(dir: PathBuf, files: Vec<PathBuf>, digest: ContentHash) -> Self {
        Self { dir, files, digest }
    }

    /// Output directory inside the builder's workspace
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Files relative to `dir`, sorted
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    pub fn digest(&self) -> &ContentHash {
        &self.digest
    }
}

/// Installed package versions, keyed by normalized name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstalledSet(BTreeMap<String, String>);

impl InstalledSet {
    pub fn new(entries: BTreeMap<String, String>) -> Self {
        Self(entries)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn as_map(&self) -> &BTreeMap<String, String> {
        &self.0
    }

    pub fn digest(&self) -> ContentHash {
        ContentHash::from_entries(self.entries().map(|(k, v)| (k, v.as_bytes())))
    }
}

/// Backend source plus materialized dependencies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeEnvironment {
    root: PathBuf,
    installed: InstalledSet,
    lock_digest: Option<ContentHash>,
}

impl RuntimeEnvironment {
    pub(crate) fn new(root: PathBuf, installed: InstalledSet, lock_digest: Option<ContentHash>) -> Self {
        Self {
            root,
            installed,
            lock_digest,
        }
    }

    /// Workspace laid out exactly as the image expects (backend dir, packages, manifests)
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn installed(&self) -> &InstalledSet {
        &self.installed
    }

    /// Digest of the lock snapshot the environment was installed from
    pub fn lock_digest(&self) -> Option<&ContentHash> {
        self.lock_digest.as_ref()
    }

    pub fn is_locked(&self) -> bool {
        self.lock_digest.is_some()
    }
}

/// Ready marker written after a complete assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageManifest {
    pub convention: LayoutConvention,
    pub entry_point: String,
    pub static_root: PathBuf,
    pub data_dirs: Vec<PathBuf>,
    pub frontend_digest: ContentHash,
    pub installed: InstalledSet,
    pub lock_digest: Option<ContentHash>,
    pub default_port: Port,
    pub assembled_at: DateTime<Utc>,
}

/// An assembled, launchable image directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeImage {
    root: PathBuf,
    manifest: ImageManifest,
}

impl RuntimeImage {
    pub(crate) fn new(root: PathBuf, manifest: ImageManifest) -> Self {
        Self { root, manifest }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &ImageManifest {
        &self.manifest
    }
}
