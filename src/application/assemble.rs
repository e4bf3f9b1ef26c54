//! Runtime Image Assembler
//!
//! Combines a `BuildArtifact` and a `RuntimeEnvironment` into an image
//! directory. The ready marker is removed first and written last, so an
//! interrupted assembly never looks launchable.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

use crate::domain::entities::{
    BuildArtifact, Ecosystem, ImageManifest, RuntimeEnvironment, RuntimeImage,
};
use crate::domain::services::StageId;
use crate::domain::value_objects::{normalize, LayoutConvention, Port, ProjectLayout, PACKAGES_DIR};
use crate::error::{StagehandError, StagehandResult};
use crate::infrastructure::fs::{has_files, mirror_tree, replace_tree};
use crate::infrastructure::repositories::image_manifest;

pub struct ImageAssembler<'a> {
    layout: &'a ProjectLayout,
    default_port: Port,
}

impl<'a> ImageAssembler<'a> {
    pub fn new(layout: &'a ProjectLayout, default_port: Port) -> Self {
        Self {
            layout,
            default_port,
        }
    }

    /// Assemble (or re-assemble in place) the image at `image`
    pub fn assemble(
        &self,
        frontend: &BuildArtifact,
        backend: &RuntimeEnvironment,
        image: &Path,
    ) -> StagehandResult<RuntimeImage> {
        let _span = tracing::info_span!("stage", stage = StageId::Assemble.as_str()).entered();

        fs::create_dir_all(image)?;
        image_manifest::invalidate(image)?;

        let static_root = self.layout.static_root(image)?;
        let data_dirs = self.layout.data_dir_paths(image)?;
        if let Some(clash) = data_dirs.iter().find(|d| d.starts_with(&static_root)) {
            return Err(StagehandError::InvalidConfig {
                file: PathBuf::from(crate::config::CONFIG_FILE),
                message: format!(
                    "data directory {} lies inside the static root {} and would be replaced on every build",
                    clash.display(),
                    static_root.display()
                ),
            });
        }

        self.place_environment(backend, image)?;
        self.place_artifact(frontend, &static_root)?;
        provision_data_dirs(&data_dirs)?;

        let manifest = ImageManifest {
            convention: self.layout.convention(),
            entry_point: self.layout.entry_point(),
            static_root: image_relative(image, &static_root),
            data_dirs: data_dirs.iter().map(|d| image_relative(image, d)).collect(),
            frontend_digest: frontend.digest().clone(),
            installed: backend.installed().clone(),
            lock_digest: backend.lock_digest().cloned(),
            default_port: self.default_port,
            assembled_at: Utc::now(),
        };
        image_manifest::save(image, &manifest)?;
        tracing::info!(image = %image.display(), "image ready");

        Ok(RuntimeImage::new(image.to_path_buf(), manifest))
    }

    /// Backend source, installed packages and (root-manifest layout) the root manifest files
    fn place_environment(
        &self,
        backend: &RuntimeEnvironment,
        image: &Path,
    ) -> StagehandResult<()> {
        replace_tree(&backend.root().join(PACKAGES_DIR), &image.join(PACKAGES_DIR))?;

        let keep = self.layout.backend_data_dirs(image)?;
        mirror_tree(
            &backend.root().join(self.layout.backend_dir()),
            &image.join(self.layout.backend_dir()),
            &keep,
        )?;

        if self.layout.convention() == LayoutConvention::RootManifest {
            for name in [Ecosystem::Python.manifest_file(), Ecosystem::Python.lock_file()] {
                let src = backend.root().join(name);
                let dst = image.join(name);
                if src.is_file() {
                    fs::copy(&src, &dst)?;
                } else if dst.is_file() {
                    fs::remove_file(&dst)?;
                }
            }
        }
        Ok(())
    }

    /// Replace the static root with the build output
    fn place_artifact(&self, frontend: &BuildArtifact, static_root: &Path) -> StagehandResult<()> {
        let copied = replace_tree(frontend.dir(), static_root)?;
        if copied.is_empty() || !has_files(static_root) {
            return Err(StagehandError::EmptyArtifact {
                path: static_root.to_path_buf(),
            });
        }
        tracing::debug!(files = copied.len(), root = %static_root.display(), "static assets placed");
        Ok(())
    }
}

/// Create each data directory if absent; existing contents are left alone
pub fn provision_data_dirs(data_dirs: &[PathBuf]) -> StagehandResult<()> {
    for dir in data_dirs {
        fs::create_dir_all(dir)?;
        tracing::debug!(dir = %dir.display(), "data directory present");
    }
    Ok(())
}

fn image_relative(image: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(normalize(image))
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}
