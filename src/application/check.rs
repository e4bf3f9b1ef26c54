//! Check Use Case
//!
//! Validates a project without building it: layout convention, manifests,
//! lock snapshots, entry point and image paths. Every problem the build would
//! hit before running an external command is reported here.

use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::domain::entities::Ecosystem;
use crate::domain::value_objects::ProjectLayout;
use crate::infrastructure::repositories::{image_manifest, load_verified};

use super::backend::locate_manifest;

/// Status of a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Pass,
    Warning,
    Error,
}

/// Result of a single check
#[derive(Debug, Clone, Serialize)]
pub struct CheckItem {
    /// Area being checked (e.g., "backend", "frontend")
    pub area: &'static str,
    pub name: &'static str,
    pub status: CheckStatus,
    pub message: String,
    /// How to fix the problem
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recommendation: Option<String>,
}

/// Result of the check operation
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckResult {
    pub items: Vec<CheckItem>,
    pub passed: usize,
    pub warnings: usize,
    pub errors: usize,
}

impl CheckResult {
    /// No errors
    pub fn is_success(&self) -> bool {
        self.errors == 0
    }

    fn push(
        &mut self,
        area: &'static str,
        name: &'static str,
        status: CheckStatus,
        message: impl Into<String>,
        recommendation: Option<String>,
    ) {
        match status {
            CheckStatus::Pass => self.passed += 1,
            CheckStatus::Warning => self.warnings += 1,
            CheckStatus::Error => self.errors += 1,
        }
        self.items.push(CheckItem {
            area,
            name,
            status,
            message: message.into(),
            recommendation,
        });
    }
}

pub struct CheckUseCase<'a> {
    config: &'a Config,
    layout: ProjectLayout,
}

impl<'a> CheckUseCase<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            layout: config.project_layout(),
        }
    }

    pub fn execute(&self, project_root: &Path) -> CheckResult {
        let mut result = CheckResult::default();
        self.check_layout(project_root, &mut result);
        self.check_backend(project_root, &mut result);
        self.check_frontend(project_root, &mut result);
        self.check_image_paths(project_root, &mut result);
        result
    }

    fn check_layout(&self, project_root: &Path, result: &mut CheckResult) {
        let configured = self.layout.convention();
        match ProjectLayout::detect(project_root, self.layout.backend_dir()) {
            Some(found) if found == configured => result.push(
                "layout",
                "convention",
                CheckStatus::Pass,
                format!("'{}' matches the files on disk", configured),
                None,
            ),
            Some(found) => result.push(
                "layout",
                "convention",
                CheckStatus::Error,
                format!("configured '{}' but the files on disk use '{}'", configured, found),
                Some(format!("set layout.convention = \"{}\" in stagehand.toml", found)),
            ),
            None => result.push(
                "layout",
                "convention",
                CheckStatus::Warning,
                format!("could not infer a convention; using '{}'", configured),
                None,
            ),
        }
    }

    fn check_backend(&self, project_root: &Path, result: &mut CheckResult) {
        match locate_manifest(project_root, &self.layout) {
            Ok(deps) => {
                result.push(
                    "backend",
                    "manifest",
                    CheckStatus::Pass,
                    format!(
                        "{} declares {} dependencies",
                        deps.manifest.path().display(),
                        deps.manifest.requirements().len()
                    ),
                    None,
                );
                match &deps.lock {
                    Some(lock) => result.push(
                        "backend",
                        "lock",
                        CheckStatus::Pass,
                        format!("{} pins {} packages", lock.path().display(), lock.pins().len()),
                        None,
                    ),
                    None => result.push(
                        "backend",
                        "lock",
                        CheckStatus::Warning,
                        "no uv.lock; dependencies will be resolved fresh",
                        Some("run `uv lock` for reproducible builds".to_string()),
                    ),
                }
            }
            Err(err) => result.push(
                "backend",
                "manifest",
                CheckStatus::Error,
                err.to_string(),
                None,
            ),
        }

        let entry_file = self.layout.entry_file(project_root);
        if entry_file.is_file() {
            result.push(
                "backend",
                "entry point",
                CheckStatus::Pass,
                format!("{} -> {}", self.layout.entry_point(), entry_file.display()),
                None,
            );
        } else {
            result.push(
                "backend",
                "entry point",
                CheckStatus::Error,
                format!("{} not found", entry_file.display()),
                Some("set backend.entry_module in stagehand.toml".to_string()),
            );
        }
    }

    fn check_frontend(&self, project_root: &Path, result: &mut CheckResult) {
        let dir = project_root.join(self.layout.frontend_dir());
        match load_verified(&dir, Ecosystem::Npm) {
            Ok(Some(deps)) => {
                result.push(
                    "frontend",
                    "manifest",
                    CheckStatus::Pass,
                    format!(
                        "{} declares {} dependencies",
                        deps.manifest.path().display(),
                        deps.manifest.requirements().len()
                    ),
                    None,
                );
                if deps.lock.is_none() {
                    result.push(
                        "frontend",
                        "lock",
                        CheckStatus::Warning,
                        "no package-lock.json; `npm install` will resolve fresh",
                        Some("commit package-lock.json for reproducible builds".to_string()),
                    );
                } else {
                    result.push(
                        "frontend",
                        "lock",
                        CheckStatus::Pass,
                        "package-lock.json matches package.json",
                        None,
                    );
                }
            }
            Ok(None) => result.push(
                "frontend",
                "manifest",
                CheckStatus::Error,
                format!("no package.json in {}", dir.display()),
                None,
            ),
            Err(err) => result.push(
                "frontend",
                "manifest",
                CheckStatus::Error,
                err.to_string(),
                None,
            ),
        }
    }

    fn check_image_paths(&self, project_root: &Path, result: &mut CheckResult) {
        let image = self.config.image_dir(project_root);
        match self.layout.static_root(&image) {
            Ok(static_root) => result.push(
                "image",
                "static root",
                CheckStatus::Pass,
                static_root.display().to_string(),
                None,
            ),
            Err(err) => result.push(
                "image",
                "static root",
                CheckStatus::Error,
                err.to_string(),
                Some("backend.static_root must stay inside the image".to_string()),
            ),
        }
        if let Err(err) = self.layout.data_dir_paths(&image) {
            result.push("image", "data dirs", CheckStatus::Error, err.to_string(), None);
        }

        match image_manifest::load(&image) {
            Ok(Some(manifest)) => result.push(
                "image",
                "ready",
                CheckStatus::Pass,
                format!("assembled {}", manifest.assembled_at.to_rfc3339()),
                None,
            ),
            Ok(None) => result.push(
                "image",
                "ready",
                CheckStatus::Warning,
                "image not built yet",
                Some("run `stagehand build`".to_string()),
            ),
            Err(err) => result.push("image", "ready", CheckStatus::Warning, err.to_string(), None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{
        assemble_fixture, ProjectFixture, PACKAGE_LOCK, STALE_UV_LOCK, UV_LOCK,
    };
    use crate::domain::value_objects::LayoutConvention;

    fn status(result: &CheckResult, area: &str, name: &str) -> Option<CheckStatus> {
        result
            .items
            .iter()
            .find(|i| i.area == area && i.name == name)
            .map(|i| i.status)
    }

    #[test]
    fn locked_project_passes() {
        let fixture = ProjectFixture::flat();
        fixture.write("backend/uv.lock", UV_LOCK);
        fixture.write("frontend/package-lock.json", PACKAGE_LOCK);
        let config = Config::default();

        let result = CheckUseCase::new(&config).execute(fixture.root());

        assert!(result.is_success(), "{:?}", result.items);
        assert_eq!(status(&result, "backend", "lock"), Some(CheckStatus::Pass));
        assert_eq!(status(&result, "frontend", "lock"), Some(CheckStatus::Pass));
        assert_eq!(status(&result, "image", "ready"), Some(CheckStatus::Warning));
    }

    #[test]
    fn stale_lock_is_an_error() {
        let fixture = ProjectFixture::flat();
        fixture.write("backend/uv.lock", STALE_UV_LOCK);
        let config = Config::default();

        let result = CheckUseCase::new(&config).execute(fixture.root());

        assert!(!result.is_success());
        assert_eq!(
            status(&result, "backend", "manifest"),
            Some(CheckStatus::Error)
        );
    }

    #[test]
    fn wrong_convention_recommends_the_right_one() {
        let fixture = ProjectFixture::root_manifest();
        let config = Config::default();

        let result = CheckUseCase::new(&config).execute(fixture.root());

        let item = result
            .items
            .iter()
            .find(|i| i.name == "convention")
            .unwrap();
        assert_eq!(item.status, CheckStatus::Error);
        assert!(item
            .recommendation
            .as_deref()
            .unwrap()
            .contains("root-manifest"));
    }

    #[test]
    fn root_manifest_entry_resolves_inside_backend_package() {
        let fixture = ProjectFixture::root_manifest();
        let mut config = Config::default();
        config.layout.convention = LayoutConvention::RootManifest;

        let result = CheckUseCase::new(&config).execute(fixture.root());

        assert!(result.is_success(), "{:?}", result.items);
        let entry = result.items.iter().find(|i| i.name == "entry point").unwrap();
        assert!(entry.message.starts_with("backend.main:app"));
    }

    #[test]
    fn built_image_is_reported_ready() {
        let fixture = ProjectFixture::flat();
        let mut config = Config::default();
        config.pipeline.image_dir = "image".into();
        assemble_fixture(&fixture, &config).unwrap();

        let result = CheckUseCase::new(&config).execute(fixture.root());
        assert_eq!(status(&result, "image", "ready"), Some(CheckStatus::Pass));
    }
}
