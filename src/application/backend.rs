//! Backend Dependency Resolver
//!
//! Locates the authoritative backend manifest for the configured layout,
//! verifies its lock snapshot, and installs dependencies into a relocatable
//! `packages/` directory next to a copy of the backend source.
//!
//! The workspace is laid out exactly as the image will be:
//!
//! ```text
//! <workspace>/
//!   packages/            installed distributions
//!   backend/             backend source
//!   pyproject.toml       root-manifest layout only
//!   uv.lock              root-manifest layout only, when present
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::BackendConfig;
use crate::domain::entities::{
    Ecosystem, InstalledSet, LockSnapshot, RuntimeEnvironment, SourceBundle, SourceKind,
};
use crate::domain::ports::{CommandRunner, PipelineEventSink};
use crate::domain::services::StageId;
use crate::domain::value_objects::{LayoutConvention, ProjectLayout, PACKAGES_DIR};
use crate::error::{StagehandError, StagehandResult};
use crate::infrastructure::fs::{atomic_write, copy_tree, remove_dir_if_exists};
use crate::infrastructure::repositories::manifest::{lock_path, manifest_path};
use crate::infrastructure::repositories::{
    load_lock, load_manifest, scan_installed, VerifiedDependencies,
};

use super::command::{run_checked, spec_for};

/// Caches skipped wherever they appear in the backend source
const SKIPPED_CACHE_DIRS: &[&str] = &["__pycache__", ".pytest_cache"];

/// Local virtualenvs, skipped only at the top of the backend source
const SKIPPED_ENV_DIRS: &[&str] = &[".venv", "venv"];

/// Requirements handed to the installer; kept out of the image by the copy filter
const REQUIREMENTS_FILE: &str = ".stagehand/requirements.txt";

/// Find the manifest the configured layout names and check it against the
/// other placement and its lock snapshot. Nothing is installed here.
pub fn locate_manifest(
    project_root: &Path,
    layout: &ProjectLayout,
) -> StagehandResult<VerifiedDependencies> {
    let authoritative_dir = layout.backend_manifest_dir(project_root);
    let other_dir = layout.other_manifest_dir(project_root);

    let authoritative = load_manifest(&authoritative_dir, Ecosystem::Python)?;
    let other = if other_dir == authoritative_dir {
        None
    } else {
        load_manifest(&other_dir, Ecosystem::Python)?
    };

    let Some(manifest) = authoritative else {
        let hint = match &other {
            Some(found) => format!(
                " (found {}; set layout.convention = \"{}\")",
                found.path().display(),
                layout.convention().other()
            ),
            None => String::new(),
        };
        return Err(StagehandError::LayoutMismatch {
            convention: layout.convention(),
            expected: manifest_path(&authoritative_dir, Ecosystem::Python),
            hint,
        });
    };

    if let Some(stale) = &other {
        if !manifest.same_dependencies(stale) {
            return Err(StagehandError::AmbiguousManifest {
                authoritative: manifest.path().to_path_buf(),
                stale: stale.path().to_path_buf(),
            });
        }
        tracing::warn!(
            authoritative = %manifest.path().display(),
            ignored = %stale.path().display(),
            "second backend manifest declares the same dependencies; ignoring it"
        );
    }

    let lock = load_lock(&authoritative_dir, Ecosystem::Python)?;
    if let Some(lock) = &lock {
        lock.verify_against(&manifest)?;
    }
    Ok(VerifiedDependencies { manifest, lock })
}

pub struct BackendResolver<'a> {
    runner: &'a dyn CommandRunner,
    config: &'a BackendConfig,
    layout: &'a ProjectLayout,
}

impl<'a> BackendResolver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        config: &'a BackendConfig,
        layout: &'a ProjectLayout,
    ) -> Self {
        Self {
            runner,
            config,
            layout,
        }
    }

    /// Open the backend source bundle under `project_root`
    pub fn source(&self, project_root: &Path) -> StagehandResult<SourceBundle> {
        SourceBundle::open(project_root.join(self.layout.backend_dir()), SourceKind::Backend)
    }

    /// Resolve into `workspace`. On failure the workspace is removed.
    pub fn resolve(
        &self,
        project_root: &Path,
        workspace: &Path,
        events: &dyn PipelineEventSink,
    ) -> StagehandResult<RuntimeEnvironment> {
        let _span = tracing::info_span!("stage", stage = StageId::Backend.as_str()).entered();

        let deps = locate_manifest(project_root, self.layout)?;
        let source = self.source(project_root)?;

        remove_dir_if_exists(workspace)?;
        let result = self.resolve_in(project_root, &source, workspace, &deps, events);
        if result.is_err() {
            if let Err(e) = remove_dir_if_exists(workspace) {
                tracing::warn!(workspace = %workspace.display(), error = %e, "failed to remove workspace");
            }
        }
        result
    }

    fn resolve_in(
        &self,
        project_root: &Path,
        source: &SourceBundle,
        workspace: &Path,
        deps: &VerifiedDependencies,
        events: &dyn PipelineEventSink,
    ) -> StagehandResult<RuntimeEnvironment> {
        let packages = workspace.join(PACKAGES_DIR);
        fs::create_dir_all(&packages)?;

        let requirements: Vec<String> = match &deps.lock {
            Some(lock) => lock.pinned_requirements(),
            None => deps
                .manifest
                .requirements()
                .iter()
                .map(|r| r.raw().to_string())
                .collect(),
        };

        if requirements.is_empty() {
            tracing::info!("no backend dependencies declared");
        } else {
            let requirements_path = workspace.join(REQUIREMENTS_FILE);
            atomic_write(&requirements_path, (requirements.join("\n") + "\n").as_bytes())?;

            let mut spec = spec_for(StageId::Backend, &self.config.installer, workspace)?
                .arg("--target")
                .arg(packages.to_string_lossy());
            if deps.lock.is_some() {
                spec = spec.arg("--no-deps");
            }
            let spec = spec.arg("-r").arg(requirements_path.to_string_lossy());
            run_checked(self.runner, StageId::Backend, &spec, events)?;
        }

        let installed = scan_installed(&packages)?;
        if let Some(lock) = &deps.lock {
            check_drift(lock, &installed)?;
        }

        let mut skip_paths: Vec<PathBuf> = SKIPPED_ENV_DIRS.iter().map(PathBuf::from).collect();
        skip_paths.extend(self.layout.backend_data_dirs(project_root)?);
        copy_tree(
            source.root(),
            &workspace.join(self.layout.backend_dir()),
            SKIPPED_CACHE_DIRS,
            &skip_paths,
        )?;
        if self.layout.convention() == LayoutConvention::RootManifest {
            copy_root_manifest(project_root, workspace)?;
        }

        tracing::info!(
            packages = installed.len(),
            locked = deps.lock.is_some(),
            "backend resolved"
        );
        Ok(RuntimeEnvironment::new(
            workspace.to_path_buf(),
            installed,
            deps.lock.as_ref().map(LockSnapshot::digest),
        ))
    }
}

fn copy_root_manifest(project_root: &Path, workspace: &Path) -> StagehandResult<()> {
    for path in [
        manifest_path(project_root, Ecosystem::Python),
        lock_path(project_root, Ecosystem::Python),
    ] {
        if let Some(name) = path.file_name().filter(|_| path.is_file()) {
            fs::copy(&path, workspace.join(name))?;
        }
    }
    Ok(())
}

/// The installed set must be the pinned set. Pins guarded by an environment
/// marker may be absent, since the installer skips them on other platforms.
fn check_drift(lock: &LockSnapshot, installed: &InstalledSet) -> StagehandResult<()> {
    let pins: &BTreeMap<String, String> = lock.pins();
    let mut problems = Vec::new();

    let missing: Vec<&str> = pins
        .keys()
        .filter(|name| installed.get(name).is_none() && lock.marker(name).is_none())
        .map(String::as_str)
        .collect();
    if !missing.is_empty() {
        problems.push(format!("missing: {}", missing.join(", ")));
    }

    let unexpected: Vec<&str> = installed
        .entries()
        .filter(|(name, _)| !pins.contains_key(*name))
        .map(|(name, _)| name)
        .collect();
    if !unexpected.is_empty() {
        problems.push(format!("unexpected: {}", unexpected.join(", ")));
    }

    let changed: Vec<String> = pins
        .iter()
        .filter_map(|(name, pinned)| {
            installed
                .get(name)
                .filter(|actual| actual != pinned)
                .map(|actual| format!("{} {} != {}", name, actual, pinned))
        })
        .collect();
    if !changed.is_empty() {
        problems.push(format!("changed: {}", changed.join(", ")));
    }

    if problems.is_empty() {
        Ok(())
    } else {
        Err(StagehandError::LockDrift {
            lock: lock.path().to_path_buf(),
            details: problems.join("; "),
        })
    }
}
