//! Source bundles
//!
//! A read-only input tree handed to one of the leaf stages. Stages copy out
//! of it and never write into it.

use std::path::{Path, PathBuf};

use crate::error::{StagehandError, StagehandResult};

use super::manifest::Ecosystem;

/// Which leaf stage consumes the bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Frontend,
    Backend,
}

impl SourceKind {
    pub fn ecosystem(&self) -> Ecosystem {
        match self {
            SourceKind::Frontend => Ecosystem::Npm,
            SourceKind::Backend => Ecosystem::Python,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBundle {
    root: PathBuf,
    kind: SourceKind,
}

impl SourceBundle {
    /// Open an existing source directory
    pub fn open(root: impl Into<PathBuf>, kind: SourceKind) -> StagehandResult<Self> {
        let root = root.into();
        if !root.is_dir() {
            return Err(StagehandError::DirectoryNotFound { path: root });
        }
        Ok(Self { root, kind })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn kind(&self) -> SourceKind {
        self.kind
    }
}
